//! Approximate nearest neighbor search over sparse vectors.
//!
//! The index is a forest of randomized cluster trees:
//!
//! - Every tree recursively partitions the data around randomly sampled
//!   pivot vectors. Inner nodes keep one representative vector per child,
//!   leaves keep the raw vectors.
//! - A search descends each tree through the `clusters_to_search` best
//!   matching children per level, computes exact distances in the leaves and
//!   widens into further children only when too few results were found.
//! - Trees are seeded independently, so they make different partitioning
//!   mistakes. Searching several of them and merging the results raises recall.
//!
//! # Architecture
//!
//! ```text
//! SparnnIndex (facade, dimension checks, id <-> vector contract)
//!      │
//! MultiClusterIndex (forest: fan-out, hstack, dedupe, top-k merge)
//!      │
//! ClusterTree (root: grows the tree by reindexing an overflowed child)
//!      │
//! ClusterNode::NonTerminal ── DistanceSpace over child representatives
//! ClusterNode::Terminal    ── DistanceSpace over raw vectors
//! ```
//!
//! # Distance spaces
//!
//! - `Cosine`: `1 - cos(a, b)`, batched as a sparse product against the
//!   transposed base matrix. Zero vectors are at distance 1 from everything.
//! - `JaccardBinary`: `1 - |A ∩ B| / |A ∪ B|` over non-zero positions, batched
//!   the same way.
//! - `JaccardBinarySingleFeatureOriented`: the same distance computed one
//!   query at a time by merging sorted postings lists.
//!
//! # Example
//!
//! ```
//! use vekt_sparnn::{SparnnConfig, SparnnIndex, SpaceAlgorithm};
//! use vekt_vector::{SparseVector, VectorIndex};
//!
//! let config = SparnnConfig {
//!     algorithm: SpaceAlgorithm::JaccardBinary,
//!     ..SparnnConfig::default()
//! };
//! let index = SparnnIndex::new(5, config).unwrap();
//!
//! let a = SparseVector::from_dense(&[1.0, 0.0, 0.0, 1.0, 1.0]).unwrap();
//! let b = SparseVector::from_dense(&[0.0, 1.0, 1.0, 0.0, 0.0]).unwrap();
//! index.add_batch(vec![(1, a.clone()), (2, b)]).unwrap();
//!
//! let results = index.find_nearest(&[a], 2, false).unwrap();
//! assert_eq!(results[0][0].id, 1);
//! assert!(results[0][0].distance.abs() < 1e-9);
//! ```

mod cluster;
mod config;
mod forest;
mod index;
mod space;
mod top_k;

pub use config::{RngFactory, SparnnConfig};
pub use forest::hstack;
pub use index::SparnnIndex;
pub use space::{DistanceSpace, NearestSearchResult, SpaceAlgorithm};
pub use top_k::{take_k_best, take_k_best_by};

use vekt_vector::VectorError;

/// Error type for sparse index operations.
#[derive(Debug, thiserror::Error)]
pub enum SparnnError {
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("k must be positive")]
    InvalidK,

    #[error("The number of vectors ({vectors}) does not match the number of elements ({elements})")]
    SpaceSizeMismatch { vectors: usize, elements: usize },
}

impl From<SparnnError> for VectorError {
    fn from(e: SparnnError) -> Self {
        match e {
            SparnnError::Vector(inner) => inner,
            SparnnError::InvalidK => VectorError::InvalidArgument("k must be positive".to_string()),
            other => VectorError::IndexError(other.to_string()),
        }
    }
}

/// Result type for sparse index operations.
pub type Result<T> = std::result::Result<T, SparnnError>;
