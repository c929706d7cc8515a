//! Vector model and index contract shared by the Vekt indices.
//!
//! This crate provides the pieces every index implementation builds on:
//!
//! - **Vectors**: [`SparseVector`] (validated `(index, value)` pairs) and
//!   [`DenseVector`] (finite `f32` coordinates)
//! - **Distance functions**: Euclidean (L2), Cosine, Inner Product for dense data
//! - **VectorIndex trait**: batched add / delete / nearest-neighbor search
//! - **FlatIndex**: exact linear scan over dense vectors
//!
//! # Architecture
//!
//! ```text
//! vekt-index:   Algorithm registry, AnyIndex { Dense, Sparse }
//!      │
//!      ├── vekt-vector::FlatIndex        (dense, exact)
//!      └── vekt-sparnn::SparnnIndex      (sparse, approximate)
//! ```
//!
//! # Example
//!
//! ```
//! use vekt_vector::{DenseVector, DistanceFunction, FlatIndex, VectorIndex};
//!
//! let index = FlatIndex::new(3, DistanceFunction::Euclidean);
//!
//! index
//!     .add_batch(vec![
//!         (1, DenseVector::new(vec![0.0, 0.0, 0.0]).unwrap()),
//!         (2, DenseVector::new(vec![1.0, 1.0, 1.0]).unwrap()),
//!     ])
//!     .unwrap();
//!
//! let query = DenseVector::new(vec![0.1, 0.0, 0.0]).unwrap();
//! let results = index.find_nearest(&[query], 2, false).unwrap();
//! assert_eq!(results[0][0].id, 1);
//! ```

mod distance;
mod flat;
mod traits;
mod vector;

pub use distance::{
    cosine_distance, euclidean_distance, euclidean_distance_squared, inner_product,
    DistanceFunction,
};
pub use flat::FlatIndex;
pub use traits::{FoundVector, VectorIndex};
pub use vector::{DenseVector, SparseVector};

/// Error type for vector operations.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index error: {0}")]
    IndexError(String),
}

/// Result type for vector operations.
pub type Result<T> = std::result::Result<T, VectorError>;
