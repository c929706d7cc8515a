use super::{ClusterData, ClusterNode, ClusterSettings};
use crate::space::NearestSearchResult;
use crate::Result;
use rand::rngs::StdRng;
use std::collections::HashSet;
use vekt_vector::SparseVector;

/// Root of one cluster tree.
///
/// The root itself never overflows. When its top node does, the next insert
/// rebuilds the whole tree from every stored record plus the new ones, which
/// is how trees grow deeper.
pub(crate) struct ClusterTree {
    settings: ClusterSettings,
    root: ClusterNode,
    rng: StdRng,
}

impl ClusterTree {
    pub(crate) fn build(
        settings: ClusterSettings,
        data: ClusterData,
        mut rng: StdRng,
    ) -> Result<Self> {
        let root = ClusterNode::build(&settings, data, &mut rng)?;
        Ok(Self {
            settings,
            root,
            rng,
        })
    }

    pub(crate) fn insert(&mut self, data: ClusterData) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if !self.root.is_overflowed(&self.settings) {
            return self.root.insert(&self.settings, data);
        }

        let mut all = self.root.child_data();
        tracing::info!(
            records = all.len(),
            inserted = data.len(),
            depth = self.root.depth(),
            "Reindexing cluster tree"
        );
        all.extend(data);

        self.root = ClusterNode::build(&self.settings, all, &mut self.rng)?;
        Ok(())
    }

    pub(crate) fn delete(&mut self, elements: &HashSet<u64>) -> Result<usize> {
        self.root.delete(&self.settings, elements)
    }

    pub(crate) fn search(
        &self,
        queries: &[&SparseVector],
        k: usize,
        clusters_to_search: usize,
    ) -> Result<Vec<Vec<NearestSearchResult<u64>>>> {
        self.root.search(&self.settings, queries, k, clusters_to_search)
    }

    pub(crate) fn len(&self) -> usize {
        self.root.len()
    }

    pub(crate) fn depth(&self) -> usize {
        self.root.depth()
    }
}
