//! Index selection by vector kind.

use crate::algorithm::{Algorithm, IndexOptions};
use crate::{IndexError, Result};
use std::fmt;
use vekt_sparnn::SparnnIndex;
use vekt_vector::{DenseVector, FlatIndex, FoundVector, SparseVector, VectorError, VectorIndex};

/// Vector representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Dense,
    Sparse,
}

impl fmt::Display for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorKind::Dense => f.write_str("dense"),
            VectorKind::Sparse => f.write_str("sparse"),
        }
    }
}

/// A vector of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyVector {
    Dense(DenseVector),
    Sparse(SparseVector),
}

impl AnyVector {
    pub fn kind(&self) -> VectorKind {
        match self {
            AnyVector::Dense(_) => VectorKind::Dense,
            AnyVector::Sparse(_) => VectorKind::Sparse,
        }
    }
}

impl From<DenseVector> for AnyVector {
    fn from(vector: DenseVector) -> Self {
        AnyVector::Dense(vector)
    }
}

impl From<SparseVector> for AnyVector {
    fn from(vector: SparseVector) -> Self {
        AnyVector::Sparse(vector)
    }
}

impl TryFrom<AnyVector> for DenseVector {
    type Error = IndexError;

    fn try_from(vector: AnyVector) -> Result<Self> {
        match vector {
            AnyVector::Dense(v) => Ok(v),
            other => Err(IndexError::VectorKindMismatch {
                expected: VectorKind::Dense,
                actual: other.kind(),
            }),
        }
    }
}

impl TryFrom<AnyVector> for SparseVector {
    type Error = IndexError;

    fn try_from(vector: AnyVector) -> Result<Self> {
        match vector {
            AnyVector::Sparse(v) => Ok(v),
            other => Err(IndexError::VectorKindMismatch {
                expected: VectorKind::Sparse,
                actual: other.kind(),
            }),
        }
    }
}

/// An index whose kind was fixed at creation.
///
/// Every call converts [`AnyVector`]s into the concrete vector type of the
/// underlying index. A vector of the other kind fails the whole call before
/// anything reaches the index.
pub enum AnyIndex {
    Dense(FlatIndex),
    Sparse(SparnnIndex),
}

impl AnyIndex {
    /// Create an empty index running `algorithm` over `dimension`-sized
    /// vectors.
    ///
    /// ```
    /// use vekt_index::{AnyIndex, AnyVector, IndexOptions};
    /// use vekt_vector::SparseVector;
    ///
    /// let algorithm = "SparnnIndex.JaccardBinary".parse().unwrap();
    /// let index = AnyIndex::create(algorithm, 4, &IndexOptions::default()).unwrap();
    ///
    /// let v = SparseVector::from_dense(&[1.0, 0.0, 1.0, 0.0]).unwrap();
    /// index.add_batch(vec![(1, AnyVector::from(v.clone()))]).unwrap();
    ///
    /// let found = index.find_nearest(&[v.into()], 1, false).unwrap();
    /// assert_eq!(found[0][0].id, 1);
    /// ```
    pub fn create(algorithm: Algorithm, dimension: usize, options: &IndexOptions) -> Result<Self> {
        if dimension == 0 {
            return Err(VectorError::InvalidArgument(
                "vector dimension must be positive".to_string(),
            )
            .into());
        }

        let index = match algorithm {
            Algorithm::Flat(distance) => AnyIndex::Dense(FlatIndex::new(dimension, distance)),
            Algorithm::Sparnn(space) => {
                AnyIndex::Sparse(SparnnIndex::new(dimension, options.sparnn_config(space))?)
            }
        };

        tracing::info!(%algorithm, description = %index.description(), "Created index");
        Ok(index)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            AnyIndex::Dense(index) => Algorithm::Flat(index.distance_function()),
            AnyIndex::Sparse(index) => Algorithm::Sparnn(index.config().algorithm),
        }
    }

    pub fn vector_kind(&self) -> VectorKind {
        match self {
            AnyIndex::Dense(_) => VectorKind::Dense,
            AnyIndex::Sparse(_) => VectorKind::Sparse,
        }
    }

    pub fn description(&self) -> String {
        match self {
            AnyIndex::Dense(index) => index.description(),
            AnyIndex::Sparse(index) => index.description(),
        }
    }

    pub fn vector_count(&self) -> usize {
        match self {
            AnyIndex::Dense(index) => index.vector_count(),
            AnyIndex::Sparse(index) => index.vector_count(),
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            AnyIndex::Dense(index) => index.dimensions(),
            AnyIndex::Sparse(index) => index.dimensions(),
        }
    }

    pub fn add_batch(&self, data: Vec<(u64, AnyVector)>) -> Result<()> {
        match self {
            AnyIndex::Dense(index) => add_to(index, data),
            AnyIndex::Sparse(index) => add_to(index, data),
        }
    }

    pub fn delete_batch(&self, ids: &[u64]) -> Result<usize> {
        let removed = match self {
            AnyIndex::Dense(index) => index.delete_batch(ids)?,
            AnyIndex::Sparse(index) => index.delete_batch(ids)?,
        };
        Ok(removed)
    }

    pub fn find_nearest(
        &self,
        queries: &[AnyVector],
        limit_per_query: usize,
        retrieve_vectors: bool,
    ) -> Result<Vec<Vec<FoundVector<AnyVector>>>> {
        match self {
            AnyIndex::Dense(index) => search(index, queries, limit_per_query, retrieve_vectors),
            AnyIndex::Sparse(index) => search(index, queries, limit_per_query, retrieve_vectors),
        }
    }
}

fn add_to<I>(index: &I, data: Vec<(u64, AnyVector)>) -> Result<()>
where
    I: VectorIndex,
    I::Vector: TryFrom<AnyVector, Error = IndexError>,
{
    let data = data
        .into_iter()
        .map(|(id, vector)| Ok((id, I::Vector::try_from(vector)?)))
        .collect::<Result<Vec<_>>>()?;
    index.add_batch(data)?;
    Ok(())
}

fn search<I>(
    index: &I,
    queries: &[AnyVector],
    limit_per_query: usize,
    retrieve_vectors: bool,
) -> Result<Vec<Vec<FoundVector<AnyVector>>>>
where
    I: VectorIndex,
    I::Vector: TryFrom<AnyVector, Error = IndexError> + Into<AnyVector>,
{
    let queries = queries
        .iter()
        .cloned()
        .map(I::Vector::try_from)
        .collect::<Result<Vec<_>>>()?;

    let found = index.find_nearest(&queries, limit_per_query, retrieve_vectors)?;

    Ok(found
        .into_iter()
        .map(|matches| {
            matches
                .into_iter()
                .map(|m| FoundVector {
                    id: m.id,
                    distance: m.distance,
                    vector: m.vector.map(Into::into),
                })
                .collect()
        })
        .collect())
}
