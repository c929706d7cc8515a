//! Binary Jaccard distance spaces.
//!
//! Only the positions of non-zero coordinates matter. Both forms reduce a pair
//! of vectors to `(matches, union)` counts and share [`jaccard_from_counts`],
//! so for the same inputs they return bit-identical distances.

use super::matrix::ColumnMatrix;
use std::borrow::Borrow;
use vekt_vector::SparseVector;

/// `1 - matches / union`. Two empty supports are identical (distance 0).
pub(crate) fn jaccard_from_counts(matches: u32, union: u32) -> f64 {
    if union == 0 {
        return 0.0;
    }
    1.0 - f64::from(matches) / f64::from(union)
}

/// Batched form: intersection counts for a whole query batch come from one
/// pass over the transposed base.
pub(crate) struct JaccardMatrixSpace {
    matrix: ColumnMatrix<()>,
    cardinalities: Vec<u32>,
}

impl JaccardMatrixSpace {
    pub(crate) fn new<V: Borrow<SparseVector>>(vectors: &[V]) -> Self {
        let supports: Vec<Vec<usize>> = vectors.iter().map(|v| v.borrow().support()).collect();
        let cardinalities = supports.iter().map(|s| s.len() as u32).collect();
        let matrix = ColumnMatrix::from_rows(
            supports
                .into_iter()
                .map(|s| s.into_iter().map(|column| (column, ()))),
        );

        Self {
            matrix,
            cardinalities,
        }
    }

    pub(crate) fn batch_distances(&self, queries: &[&SparseVector]) -> Vec<Vec<f64>> {
        queries
            .iter()
            .map(|query| {
                let support = query.support();
                let mut matches = vec![0u32; self.matrix.rows()];
                for &column in &support {
                    for &(row, ()) in self.matrix.column(column) {
                        matches[row] += 1;
                    }
                }

                let query_cardinality = support.len() as u32;
                matches
                    .into_iter()
                    .zip(&self.cardinalities)
                    .map(|(m, &c)| jaccard_from_counts(m, query_cardinality + c - m))
                    .collect()
            })
            .collect()
    }
}

/// Postings form: one query at a time, merging sorted non-zero index lists.
pub(crate) struct JaccardPostingsSpace {
    postings: Vec<Vec<usize>>,
}

impl JaccardPostingsSpace {
    pub(crate) fn new<V: Borrow<SparseVector>>(vectors: &[V]) -> Self {
        Self {
            postings: vectors.iter().map(|v| v.borrow().support()).collect(),
        }
    }

    pub(crate) fn distances(&self, query: &SparseVector) -> Vec<f64> {
        let support = query.support();
        self.postings
            .iter()
            .map(|base| {
                let (matches, union) = merge_counts(&support, base);
                jaccard_from_counts(matches, union)
            })
            .collect()
    }
}

/// Two-pointer merge of sorted lists: `(matches, union)`.
fn merge_counts(a: &[usize], b: &[usize]) -> (u32, u32) {
    let (mut i, mut j) = (0, 0);
    let (mut matches, mut union) = (0u32, 0u32);

    while i < a.len() && j < b.len() {
        union += 1;
        if a[i] == b[j] {
            matches += 1;
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }

    union += (a.len() - i + b.len() - j) as u32;
    (matches, union)
}
