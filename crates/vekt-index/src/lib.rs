//! Algorithm registry for vector indices.
//!
//! An index is created from an algorithm name such as
//! `SparnnIndex.JaccardBinary` or `FlatIndex.L2`. The name fixes the vector
//! kind the index accepts for its whole lifetime: SPARNN algorithms take
//! sparse vectors, flat algorithms take dense ones.
//!
//! ```
//! use vekt_index::{AnyIndex, AnyVector, IndexOptions, VectorKind};
//! use vekt_vector::DenseVector;
//!
//! let index = AnyIndex::create("FlatIndex.L2".parse().unwrap(), 2, &IndexOptions::default())
//!     .unwrap();
//! assert_eq!(index.vector_kind(), VectorKind::Dense);
//!
//! let v = DenseVector::new(vec![1.0, 2.0]).unwrap();
//! index.add_batch(vec![(9, AnyVector::from(v))]).unwrap();
//! assert_eq!(index.vector_count(), 1);
//! ```

mod algorithm;
mod any;

pub use algorithm::{Algorithm, IndexOptions};
pub use any::{AnyIndex, AnyVector, VectorKind};

use vekt_sparnn::SparnnError;
use vekt_vector::VectorError;

/// Errors from index creation and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Sparnn(#[from] SparnnError),

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Vector kind mismatch: index takes {expected} vectors, got {actual}")]
    VectorKindMismatch {
        expected: VectorKind,
        actual: VectorKind,
    },
}

pub type Result<T> = std::result::Result<T, IndexError>;
