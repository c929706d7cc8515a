//! Vector representations accepted by the indices.
//!
//! Both types validate their contents on construction, so an index never has
//! to deal with out-of-range coordinates or NaN values later on.

use crate::{Result, VectorError};

/// A sparse feature vector: a dimension plus `(index, value)` pairs.
///
/// Pairs are kept sorted by index. Two vectors built from the same pairs in a
/// different order are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dimension: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Create a sparse vector from parallel index/value arrays.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidVector`] if:
    /// - `dimension` is zero
    /// - `indices` and `values` have different lengths
    /// - an index is `>= dimension`
    /// - an index appears more than once
    /// - a value is NaN or infinite
    ///
    /// # Example
    ///
    /// ```
    /// use vekt_vector::SparseVector;
    ///
    /// let v = SparseVector::new(8, vec![5, 1], vec![0.5, 2.0]).unwrap();
    /// assert_eq!(v.indices(), &[1, 5]);
    /// assert_eq!(v.values(), &[2.0, 0.5]);
    ///
    /// assert!(SparseVector::new(8, vec![1, 1], vec![1.0, 1.0]).is_err());
    /// assert!(SparseVector::new(8, vec![8], vec![1.0]).is_err());
    /// ```
    pub fn new(dimension: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if dimension == 0 {
            return Err(VectorError::InvalidVector(
                "dimension must be positive".to_string(),
            ));
        }

        if indices.len() != values.len() {
            return Err(VectorError::InvalidVector(format!(
                "{} coordinate indices but {} coordinates",
                indices.len(),
                values.len()
            )));
        }

        if let Some(&index) = indices.iter().find(|&&i| i >= dimension) {
            return Err(VectorError::InvalidVector(format!(
                "coordinate index {} is out of range for dimension {}",
                index, dimension
            )));
        }

        if let Some(&value) = values.iter().find(|v| !v.is_finite()) {
            return Err(VectorError::InvalidVector(format!(
                "non-finite coordinate {}",
                value
            )));
        }

        let mut pairs: Vec<(usize, f64)> = indices.into_iter().zip(values).collect();
        pairs.sort_unstable_by_key(|&(i, _)| i);

        if let Some(w) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(VectorError::InvalidVector(format!(
                "duplicate coordinate index {}",
                w[0].0
            )));
        }

        let (indices, values) = pairs.into_iter().unzip();
        Ok(Self {
            dimension,
            indices,
            values,
        })
    }

    /// Build the sparse form of a dense row, keeping non-zero entries only.
    pub fn from_dense(row: &[f64]) -> Result<Self> {
        let (indices, values) = row
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self::new(row.len(), indices, values)
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored coordinate indices, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Stored coordinate values, parallel to [`indices`](Self::indices).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored pairs (explicit zeros included).
    pub fn stored_len(&self) -> usize {
        self.indices.len()
    }

    /// Iterate `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Sorted indices of the non-zero coordinates.
    pub fn support(&self) -> Vec<usize> {
        self.iter()
            .filter(|&(_, v)| v != 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Euclidean norm.
    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Dense rendering of this vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut row = vec![0.0; self.dimension];
        for (i, v) in self.iter() {
            row[i] = v;
        }
        row
    }
}

/// A dense feature vector of finite `f32` coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseVector {
    coordinates: Vec<f32>,
}

impl DenseVector {
    /// Create a dense vector; its dimension is the number of coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`VectorError::InvalidVector`] for an empty vector or for NaN /
    /// infinite coordinates.
    pub fn new(coordinates: Vec<f32>) -> Result<Self> {
        if coordinates.is_empty() {
            return Err(VectorError::InvalidVector(
                "dimension must be positive".to_string(),
            ));
        }

        for (i, &v) in coordinates.iter().enumerate() {
            if v.is_nan() {
                return Err(VectorError::InvalidVector(format!(
                    "NaN value at index {}",
                    i
                )));
            }
            if v.is_infinite() {
                return Err(VectorError::InvalidVector(format!(
                    "Infinite value at index {}",
                    i
                )));
            }
        }

        Ok(Self { coordinates })
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }

    /// Coordinates as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.coordinates
    }
}
