//! The batched index contract.
//!
//! `VectorIndex` is implemented by every index kind (exact dense scan, sparse
//! cluster forest). The identifier-mapping layer above an index only ever
//! talks to this trait.

use crate::Result;
use std::cmp::Ordering;

/// A match returned from nearest-neighbor search.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundVector<V> {
    /// Internal vector identifier.
    pub id: u64,
    /// Distance to the query (lower = more similar).
    pub distance: f64,
    /// The stored vector, when requested.
    pub vector: Option<V>,
}

impl<V> FoundVector<V> {
    /// Create a match without vector data.
    pub fn new(id: u64, distance: f64) -> Self {
        Self {
            id,
            distance,
            vector: None,
        }
    }

    /// Create a match carrying the stored vector.
    pub fn with_vector(id: u64, distance: f64, vector: V) -> Self {
        Self {
            id,
            distance,
            vector: Some(vector),
        }
    }
}

impl<V: PartialEq> Eq for FoundVector<V> {}

impl<V: PartialEq> PartialOrd for FoundVector<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: PartialEq> Ord for FoundVector<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

/// Common interface for vector indices.
///
/// Identifiers are opaque `u64` values assigned by the caller. Writes are
/// batched; searches take a batch of queries and return one ranked list per
/// query, in query order.
///
/// # Thread Safety
///
/// Implementations are `Send + Sync`. Each implementation serializes its own
/// writers against readers, so a search never observes a half-applied batch.
pub trait VectorIndex: Send + Sync {
    /// Vector representation accepted by this index.
    type Vector: Clone + Send + Sync;

    /// Human readable description of the index and its parameters.
    fn description(&self) -> String;

    /// Number of vectors currently indexed.
    fn vector_count(&self) -> usize;

    /// Dimension every vector must have.
    fn dimensions(&self) -> usize;

    /// Add a batch of `(id, vector)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if any vector's dimension differs from
    /// [`dimensions`](Self::dimensions). Nothing is inserted in that case.
    fn add_batch(&self, data: Vec<(u64, Self::Vector)>) -> Result<()>;

    /// Delete vectors by id, returning how many were removed.
    fn delete_batch(&self, ids: &[u64]) -> Result<usize>;

    /// Find up to `limit_per_query` nearest vectors for every query.
    ///
    /// Results per query are sorted by distance ascending. An empty index
    /// yields an empty list per query.
    fn find_nearest(
        &self,
        queries: &[Self::Vector],
        limit_per_query: usize,
        retrieve_vectors: bool,
    ) -> Result<Vec<Vec<FoundVector<Self::Vector>>>>;

    /// Check if the index is empty.
    fn is_empty(&self) -> bool {
        self.vector_count() == 0
    }
}
