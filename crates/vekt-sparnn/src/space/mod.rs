//! Distance spaces: immutable base sets answering batched k-NN queries.
//!
//! A [`DistanceSpace`] is built once over a list of vectors and a parallel
//! list of elements (whatever the caller wants back for a hit: a record id in
//! a leaf, a child position in an inner node). Changing membership means
//! building a new space.

mod cosine;
mod jaccard;
mod matrix;

use crate::top_k::take_k_best;
use crate::{Result, SparnnError};
use cosine::CosineSpace;
use jaccard::{JaccardMatrixSpace, JaccardPostingsSpace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use vekt_vector::{SparseVector, VectorError};

/// Distance computed by a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpaceAlgorithm {
    /// `1 - cos(a, b)`, batched sparse product.
    Cosine,
    /// Binary Jaccard, batched sparse product over non-zero positions.
    JaccardBinary,
    /// Binary Jaccard, per-query merge of sorted postings lists.
    JaccardBinarySingleFeatureOriented,
}

impl SpaceAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SpaceAlgorithm::Cosine => "Cosine",
            SpaceAlgorithm::JaccardBinary => "JaccardBinary",
            SpaceAlgorithm::JaccardBinarySingleFeatureOriented => {
                "JaccardBinarySingleFeatureOriented"
            }
        }
    }
}

impl fmt::Display for SpaceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpaceAlgorithm {
    type Err = VectorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Cosine" => Ok(SpaceAlgorithm::Cosine),
            "JaccardBinary" => Ok(SpaceAlgorithm::JaccardBinary),
            "JaccardBinarySingleFeatureOriented" => {
                Ok(SpaceAlgorithm::JaccardBinarySingleFeatureOriented)
            }
            other => Err(VectorError::InvalidArgument(format!(
                "unknown space algorithm: {}",
                other
            ))),
        }
    }
}

/// One hit from [`DistanceSpace::search_nearest`].
#[derive(Debug, Clone, PartialEq)]
pub struct NearestSearchResult<E> {
    /// Distance to the query (lower = more similar).
    pub distance: f64,
    pub element: E,
    pub vector: Arc<SparseVector>,
}

enum Metric {
    Cosine(CosineSpace),
    JaccardMatrix(JaccardMatrixSpace),
    JaccardPostings(JaccardPostingsSpace),
}

impl Metric {
    fn batch_distances(&self, batch: &[&SparseVector]) -> Vec<Vec<f64>> {
        match self {
            Metric::Cosine(space) => space.batch_distances(batch),
            Metric::JaccardMatrix(space) => space.batch_distances(batch),
            Metric::JaccardPostings(space) => batch.iter().map(|q| space.distances(q)).collect(),
        }
    }
}

/// Immutable base set of vectors with one element per vector.
pub struct DistanceSpace<E> {
    vectors: Vec<Arc<SparseVector>>,
    elements: Vec<E>,
    search_batch_size: usize,
    metric: Metric,
}

impl<E: Clone + Send + Sync> DistanceSpace<E> {
    /// Build a space over `vectors`, where `elements[i]` belongs to `vectors[i]`.
    ///
    /// Matrix forms process queries in chunks of `search_batch_size`.
    ///
    /// # Errors
    ///
    /// [`SparnnError::SpaceSizeMismatch`] when the two lists differ in length.
    pub fn build(
        algorithm: SpaceAlgorithm,
        vectors: Vec<Arc<SparseVector>>,
        elements: Vec<E>,
        search_batch_size: usize,
    ) -> Result<Self> {
        if vectors.len() != elements.len() {
            return Err(SparnnError::SpaceSizeMismatch {
                vectors: vectors.len(),
                elements: elements.len(),
            });
        }

        let metric = match algorithm {
            SpaceAlgorithm::Cosine => Metric::Cosine(CosineSpace::new(&vectors)),
            SpaceAlgorithm::JaccardBinary => {
                Metric::JaccardMatrix(JaccardMatrixSpace::new(&vectors))
            }
            SpaceAlgorithm::JaccardBinarySingleFeatureOriented => {
                Metric::JaccardPostings(JaccardPostingsSpace::new(&vectors))
            }
        };

        Ok(Self {
            vectors,
            elements,
            search_batch_size: search_batch_size.max(1),
            metric,
        })
    }

    /// The `k` nearest base vectors for every query, in query order.
    ///
    /// An empty space yields an empty list per query.
    pub fn search_nearest(
        &self,
        queries: &[&SparseVector],
        k: usize,
    ) -> Result<Vec<Vec<NearestSearchResult<E>>>> {
        if k == 0 {
            return Err(SparnnError::InvalidK);
        }
        if self.vectors.is_empty() {
            return Ok(queries.iter().map(|_| Vec::new()).collect());
        }

        // The postings form has no cross-query batching.
        let chunk_size = match self.metric {
            Metric::JaccardPostings(_) => 1,
            _ => self.search_batch_size,
        };

        tracing::trace!(
            queries = queries.len(),
            base = self.vectors.len(),
            chunk_size,
            k,
            "Searching distance space"
        );

        let batches: Vec<Vec<Vec<NearestSearchResult<E>>>> = queries
            .par_chunks(chunk_size)
            .map(|batch| {
                self.metric
                    .batch_distances(batch)
                    .iter()
                    .map(|row| self.rank(row, k))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;

        Ok(batches.into_iter().flatten().collect())
    }

    fn rank(&self, distances: &[f64], k: usize) -> Result<Vec<NearestSearchResult<E>>> {
        Ok(take_k_best(distances, k)?
            .into_iter()
            .map(|(position, distance)| NearestSearchResult {
                distance,
                element: self.elements[position].clone(),
                vector: Arc::clone(&self.vectors[position]),
            })
            .collect())
    }

    pub fn vectors(&self) -> &[Arc<SparseVector>] {
        &self.vectors
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl<E> fmt::Debug for DistanceSpace<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistanceSpace")
            .field("len", &self.vectors.len())
            .field("search_batch_size", &self.search_batch_size)
            .finish()
    }
}
