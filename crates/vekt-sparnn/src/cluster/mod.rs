//! Recursive cluster trees.
//!
//! A tree is made of [`ClusterNode`]s. Leaves ([`TerminalNode`]) own a
//! distance space over raw records. Inner nodes ([`NonTerminalNode`]) own a
//! distance space over one representative vector per child and route inserts
//! and queries through it.
//!
//! Nodes own their children directly. Overflow is only ever inspected by the
//! immediate parent, so no node needs a reference back up the tree.

mod non_terminal;
mod terminal;
mod tree;

pub(crate) use non_terminal::NonTerminalNode;
pub(crate) use terminal::TerminalNode;
pub(crate) use tree::ClusterTree;

use crate::space::{NearestSearchResult, SpaceAlgorithm};
use crate::Result;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::Arc;
use vekt_vector::SparseVector;

/// A node partitions when `log(records, desired_cluster_size)` exceeds this.
const PARTITION_LEVELS_THRESHOLD: f64 = 1.4;

/// A node holding more than `desired_cluster_size * OVERFLOW_FACTOR`
/// members is rebuilt by its parent on the next insert.
const OVERFLOW_FACTOR: usize = 5;

/// Parameters shared by every node of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClusterSettings {
    pub desired_cluster_size: usize,
    pub algorithm: SpaceAlgorithm,
}

impl ClusterSettings {
    pub(crate) fn search_batch_size(&self) -> usize {
        self.desired_cluster_size
    }

    pub(crate) fn overflow_limit(&self) -> usize {
        self.desired_cluster_size * OVERFLOW_FACTOR
    }

    /// Whether `record_count` records warrant an inner node.
    pub(crate) fn should_partition(&self, record_count: usize) -> bool {
        if record_count < 2 {
            return false;
        }
        let levels = (record_count as f64).ln() / (self.desired_cluster_size as f64).ln();
        levels > PARTITION_LEVELS_THRESHOLD
    }
}

/// Raw records of a subtree: vectors with their parallel elements.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClusterData {
    pub vectors: Vec<Arc<SparseVector>>,
    pub elements: Vec<u64>,
}

impl ClusterData {
    pub(crate) fn push(&mut self, vector: Arc<SparseVector>, element: u64) {
        self.vectors.push(vector);
        self.elements.push(element);
    }

    pub(crate) fn extend(&mut self, other: ClusterData) {
        self.vectors.extend(other.vectors);
        self.elements.extend(other.elements);
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<(Arc<SparseVector>, u64)> for ClusterData {
    fn from_iter<T: IntoIterator<Item = (Arc<SparseVector>, u64)>>(iter: T) -> Self {
        let (vectors, elements) = iter.into_iter().unzip();
        Self { vectors, elements }
    }
}

/// A node of a cluster tree.
pub(crate) enum ClusterNode {
    Terminal(TerminalNode),
    NonTerminal(NonTerminalNode),
}

impl ClusterNode {
    /// Build the subtree for `data`, choosing the node kind from its size.
    pub(crate) fn build(
        settings: &ClusterSettings,
        data: ClusterData,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if settings.should_partition(data.len()) {
            NonTerminalNode::build(settings, data, rng)
        } else {
            Ok(ClusterNode::Terminal(TerminalNode::build(settings, data)?))
        }
    }

    pub(crate) fn is_overflowed(&self, settings: &ClusterSettings) -> bool {
        match self {
            ClusterNode::Terminal(node) => node.len() > settings.overflow_limit(),
            ClusterNode::NonTerminal(node) => node.child_count() > settings.overflow_limit(),
        }
    }

    pub(crate) fn insert(&mut self, settings: &ClusterSettings, data: ClusterData) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        match self {
            ClusterNode::Terminal(node) => node.insert(settings, data),
            ClusterNode::NonTerminal(node) => {
                if !node.has_overflowed_child(settings) {
                    return node.insert(settings, data);
                }

                let mut all = node.child_data();
                tracing::debug!(
                    records = all.len(),
                    inserted = data.len(),
                    "Reindexing cluster subtree with overflowed child"
                );
                all.extend(data);

                let mut rng = node.rng().clone();
                *self = ClusterNode::build(settings, all, &mut rng)?;
                Ok(())
            }
        }
    }

    /// Remove every record whose element is in `elements`, returning how many
    /// were removed.
    pub(crate) fn delete(
        &mut self,
        settings: &ClusterSettings,
        elements: &HashSet<u64>,
    ) -> Result<usize> {
        match self {
            ClusterNode::Terminal(node) => node.delete(settings, elements),
            ClusterNode::NonTerminal(node) => node.delete(settings, elements),
        }
    }

    /// Up to `k` nearest records per query, ascending by distance.
    pub(crate) fn search(
        &self,
        settings: &ClusterSettings,
        queries: &[&SparseVector],
        k: usize,
        clusters_to_search: usize,
    ) -> Result<Vec<Vec<NearestSearchResult<u64>>>> {
        match self {
            ClusterNode::Terminal(node) => node.search(queries, k),
            ClusterNode::NonTerminal(node) => node.search(settings, queries, k, clusters_to_search),
        }
    }

    /// Every record stored below this node.
    pub(crate) fn child_data(&self) -> ClusterData {
        match self {
            ClusterNode::Terminal(node) => node.child_data(),
            ClusterNode::NonTerminal(node) => node.child_data(),
        }
    }

    /// Number of records stored below this node.
    pub(crate) fn len(&self) -> usize {
        match self {
            ClusterNode::Terminal(node) => node.len(),
            ClusterNode::NonTerminal(node) => node.len(),
        }
    }

    /// Levels from this node down to its deepest leaf, inclusive.
    pub(crate) fn depth(&self) -> usize {
        match self {
            ClusterNode::Terminal(_) => 1,
            ClusterNode::NonTerminal(node) => 1 + node.max_child_depth(),
        }
    }
}
