use super::{ClusterData, ClusterSettings};
use crate::space::{DistanceSpace, NearestSearchResult};
use crate::Result;
use std::collections::{HashMap, HashSet};
use vekt_vector::SparseVector;

/// Leaf node: a distance space over raw records.
///
/// Membership changes always rebuild the space from scratch; its size is
/// bounded by the overflow limit, so the rebuild cost is too.
pub(crate) struct TerminalNode {
    space: DistanceSpace<u64>,
    /// element -> row in `space`
    positions: HashMap<u64, usize>,
}

impl TerminalNode {
    pub(crate) fn build(settings: &ClusterSettings, data: ClusterData) -> Result<Self> {
        let positions = data
            .elements
            .iter()
            .enumerate()
            .map(|(row, &element)| (element, row))
            .collect();

        let space = DistanceSpace::build(
            settings.algorithm,
            data.vectors,
            data.elements,
            settings.search_batch_size(),
        )?;

        Ok(Self { space, positions })
    }

    pub(crate) fn insert(&mut self, settings: &ClusterSettings, data: ClusterData) -> Result<()> {
        let mut all = self.child_data();
        all.extend(data);
        *self = Self::build(settings, all)?;
        Ok(())
    }

    pub(crate) fn delete(
        &mut self,
        settings: &ClusterSettings,
        elements: &HashSet<u64>,
    ) -> Result<usize> {
        let doomed: HashSet<usize> = elements
            .iter()
            .filter_map(|element| self.positions.get(element).copied())
            .collect();

        if doomed.is_empty() {
            return Ok(0);
        }

        let kept: ClusterData = self
            .space
            .vectors()
            .iter()
            .zip(self.space.elements())
            .enumerate()
            .filter(|(row, _)| !doomed.contains(row))
            .map(|(_, (vector, &element))| (vector.clone(), element))
            .collect();

        *self = Self::build(settings, kept)?;
        Ok(doomed.len())
    }

    pub(crate) fn search(
        &self,
        queries: &[&SparseVector],
        k: usize,
    ) -> Result<Vec<Vec<NearestSearchResult<u64>>>> {
        self.space.search_nearest(queries, k)
    }

    pub(crate) fn child_data(&self) -> ClusterData {
        ClusterData {
            vectors: self.space.vectors().to_vec(),
            elements: self.space.elements().to_vec(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.space.len()
    }
}
