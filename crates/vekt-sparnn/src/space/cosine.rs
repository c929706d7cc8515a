//! Cosine distance space.

use super::matrix::ColumnMatrix;
use std::borrow::Borrow;
use vekt_vector::SparseVector;

pub(crate) struct CosineSpace {
    matrix: ColumnMatrix<f64>,
    norms: Vec<f64>,
}

impl CosineSpace {
    pub(crate) fn new<V: Borrow<SparseVector>>(vectors: &[V]) -> Self {
        let matrix = ColumnMatrix::from_rows(vectors.iter().map(|v| v.borrow().iter()));
        let norms = vectors.iter().map(|v| v.borrow().l2_norm()).collect();
        Self { matrix, norms }
    }

    /// Distance rows for a batch of queries: one dot-product row per query
    /// against the transposed base, scaled by the outer product of norms.
    pub(crate) fn batch_distances(&self, queries: &[&SparseVector]) -> Vec<Vec<f64>> {
        queries
            .iter()
            .map(|query| {
                let mut dots = vec![0.0; self.matrix.rows()];
                for (column, q) in query.iter() {
                    for &(row, b) in self.matrix.column(column) {
                        dots[row] += q * b;
                    }
                }

                let query_norm = query.l2_norm();
                dots.into_iter()
                    .zip(&self.norms)
                    .map(|(dot, &norm)| cosine_from_dot(dot, query_norm, norm))
                    .collect()
            })
            .collect()
    }
}

/// `1 - cos`, with a zero vector at distance 1 from everything.
pub(crate) fn cosine_from_dot(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    let denominator = norm_a * norm_b;
    if denominator == 0.0 {
        return 1.0;
    }
    1.0 - (dot / denominator).clamp(-1.0, 1.0)
}
