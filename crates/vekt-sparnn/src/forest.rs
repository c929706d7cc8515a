//! Forest of independently randomized cluster trees.

use crate::cluster::{ClusterData, ClusterSettings, ClusterTree};
use crate::config::RngFactory;
use crate::space::NearestSearchResult;
use crate::top_k::take_k_best_by;
use crate::Result;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::collections::HashSet;
use vekt_vector::SparseVector;

/// Several cluster trees over the same records.
///
/// Every write goes to every tree and returns only once all of them are
/// done. A search asks a prefix of the trees and merges their answers.
pub(crate) struct MultiClusterIndex {
    trees: Vec<ClusterTree>,
}

impl MultiClusterIndex {
    pub(crate) fn build(
        settings: ClusterSettings,
        data: ClusterData,
        indices_number: usize,
        rng_factory: &RngFactory,
    ) -> Result<Self> {
        // Generators are drawn in tree order; only the builds run in parallel.
        let rngs: Vec<StdRng> = (0..indices_number).map(|_| rng_factory.make()).collect();

        let trees = rngs
            .into_par_iter()
            .map(|rng| ClusterTree::build(settings, data.clone(), rng))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            trees = trees.len(),
            records = data.len(),
            depths = ?trees.iter().map(ClusterTree::depth).collect::<Vec<_>>(),
            "Built cluster forest"
        );

        Ok(Self { trees })
    }

    pub(crate) fn insert(&mut self, data: ClusterData) -> Result<()> {
        self.trees
            .par_iter_mut()
            .try_for_each(|tree| tree.insert(data.clone()))
    }

    /// Delete from every tree. Trees hold the same records, so they must
    /// agree on the count.
    pub(crate) fn delete(&mut self, elements: &HashSet<u64>) -> Result<usize> {
        let counts = self
            .trees
            .par_iter_mut()
            .map(|tree| tree.delete(elements))
            .collect::<Result<Vec<_>>>()?;

        assert!(
            counts.windows(2).all(|w| w[0] == w[1]),
            "cluster trees removed different record counts: {:?}",
            counts
        );
        Ok(counts.first().copied().unwrap_or(0))
    }

    /// Search the first `trees_to_search` trees, merge per query, drop
    /// repeated elements, keep the best `k`.
    ///
    /// Equal distances rank by tree order, then by the order each tree
    /// returned them.
    pub(crate) fn search(
        &self,
        queries: &[&SparseVector],
        k: usize,
        clusters_to_search: usize,
        trees_to_search: usize,
    ) -> Result<Vec<Vec<NearestSearchResult<u64>>>> {
        let count = trees_to_search.max(1).min(self.trees.len());
        let per_tree = self.trees[..count]
            .par_iter()
            .map(|tree| tree.search(queries, k, clusters_to_search))
            .collect::<Result<Vec<_>>>()?;

        if per_tree.is_empty() {
            return Ok(queries.iter().map(|_| Vec::new()).collect());
        }

        hstack(per_tree)
            .into_iter()
            .map(|hits| {
                let mut seen = HashSet::new();
                let unique = hits.into_iter().filter(|hit| seen.insert(hit.element));
                take_k_best_by(unique, k, |hit| hit.distance)
            })
            .collect()
    }

    /// Record count (identical in every tree).
    pub(crate) fn len(&self) -> usize {
        self.trees.first().map_or(0, ClusterTree::len)
    }

    pub(crate) fn tree_count(&self) -> usize {
        self.trees.len()
    }

    #[cfg(test)]
    pub(crate) fn depths(&self) -> Vec<usize> {
        self.trees.iter().map(ClusterTree::depth).collect()
    }
}

/// Concatenate row `i` of every block into row `i` of the result.
///
/// # Panics
///
/// Panics if the blocks do not all have the same number of rows.
///
/// # Example
///
/// ```
/// use vekt_sparnn::hstack;
///
/// let stacked = hstack(vec![vec![vec![1], vec![2]], vec![vec![3], vec![4, 5]]]);
/// assert_eq!(stacked, vec![vec![1, 3], vec![2, 4, 5]]);
/// ```
pub fn hstack<T>(blocks: Vec<Vec<Vec<T>>>) -> Vec<Vec<T>> {
    let rows = blocks.first().map_or(0, Vec::len);
    assert!(
        blocks.iter().all(|block| block.len() == rows),
        "blocks have different rows count!"
    );

    let mut stacked: Vec<Vec<T>> = (0..rows).map(|_| Vec::new()).collect();
    for block in blocks {
        for (row, items) in stacked.iter_mut().zip(block) {
            row.extend(items);
        }
    }
    stacked
}
