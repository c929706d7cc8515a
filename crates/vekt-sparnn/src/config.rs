//! Index configuration and the per-tree random source.

use crate::space::SpaceAlgorithm;
use crate::{Result, SparnnError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cluster size used when none is configured and the data set is small.
pub(crate) const MIN_AUTO_CLUSTER_SIZE: usize = 1000;

/// Sparse index configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparnnConfig {
    /// Distance space used at every tree level.
    /// Default: Cosine
    pub algorithm: SpaceAlgorithm,

    /// Target number of members per cluster.
    /// `None` resolves to `max(sqrt(n), 1000)` for the first batch of `n`
    /// vectors. Must be at least 2 when set.
    pub desired_cluster_size: Option<usize>,

    /// Number of independently randomized trees (forest width).
    /// Default: 2
    pub indices_number: usize,

    /// Child clusters explored per tree level before widening.
    /// Higher = better recall, slower search.
    /// Default: 2
    pub clusters_to_search: usize,

    /// Trees consulted per search. `None` = all of them.
    pub indices_to_search: Option<usize>,
}

impl Default for SparnnConfig {
    fn default() -> Self {
        Self {
            algorithm: SpaceAlgorithm::Cosine,
            desired_cluster_size: None,
            indices_number: 2,
            clusters_to_search: 2,
            indices_to_search: None,
        }
    }
}

impl SparnnConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if matches!(self.desired_cluster_size, Some(size) if size < 2) {
            return Err(SparnnError::InvalidConfig(
                "desired_cluster_size must be at least 2".to_string(),
            ));
        }
        if self.indices_number == 0 {
            return Err(SparnnError::InvalidConfig(
                "indices_number must be positive".to_string(),
            ));
        }
        if self.clusters_to_search == 0 {
            return Err(SparnnError::InvalidConfig(
                "clusters_to_search must be positive".to_string(),
            ));
        }
        if self.indices_to_search == Some(0) {
            return Err(SparnnError::InvalidConfig(
                "indices_to_search must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Cluster size for a forest bootstrapped from `record_count` vectors.
    pub fn resolve_cluster_size(&self, record_count: usize) -> usize {
        self.desired_cluster_size.unwrap_or_else(|| {
            ((record_count as f64).sqrt() as usize).max(MIN_AUTO_CLUSTER_SIZE)
        })
    }

    /// Number of trees a search consults.
    pub fn trees_to_search(&self) -> usize {
        self.indices_to_search
            .unwrap_or(self.indices_number)
            .min(self.indices_number)
    }
}

/// Produces one random generator per tree.
///
/// Production code uses [`RngFactory::from_entropy`]. Tests use
/// [`RngFactory::seeded`] so tree shapes are reproducible.
#[derive(Clone)]
pub struct RngFactory(Arc<dyn Fn() -> StdRng + Send + Sync>);

impl RngFactory {
    /// Wrap an arbitrary generator constructor.
    pub fn new(make: impl Fn() -> StdRng + Send + Sync + 'static) -> Self {
        Self(Arc::new(make))
    }

    /// Fresh OS-seeded generator per tree.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy)
    }

    /// Deterministic generators: the n-th call is seeded with `seed + n`.
    pub fn seeded(seed: u64) -> Self {
        let calls = AtomicU64::new(0);
        Self::new(move || {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            StdRng::seed_from_u64(seed.wrapping_add(n))
        })
    }

    /// Create the next generator.
    pub fn make(&self) -> StdRng {
        (self.0)()
    }
}

impl Default for RngFactory {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for RngFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RngFactory")
    }
}
