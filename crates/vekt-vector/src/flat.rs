//! Flat (exact) dense vector index.
//!
//! Linear scan search - O(n) per query but exact. Serves dense vectors when no
//! approximate structure is wanted, and acts as a recall baseline.

use crate::distance::DistanceFunction;
use crate::traits::{FoundVector, VectorIndex};
use crate::vector::DenseVector;
use crate::{Result, VectorError};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Exact dense vector index.
///
/// Stores vectors in a HashMap keyed by id and scans all of them per query.
/// Thread-safe via RwLock.
///
/// # Performance
///
/// - Add: O(1) per vector
/// - Delete: O(1) per id
/// - Search: O(n * d) per query where n = vectors, d = dimensions
pub struct FlatIndex {
    /// Vector storage: id -> vector
    vectors: RwLock<HashMap<u64, DenseVector>>,
    /// Vector dimensions (all vectors must have this dimension)
    dimensions: usize,
    /// Distance function to use
    distance: DistanceFunction,
}

impl FlatIndex {
    /// Create a new flat index.
    ///
    /// ```
    /// use vekt_vector::{DistanceFunction, FlatIndex, VectorIndex};
    ///
    /// let index = FlatIndex::new(128, DistanceFunction::Euclidean);
    /// assert!(index.is_empty());
    /// ```
    pub fn new(dimensions: usize, distance: DistanceFunction) -> Self {
        Self {
            vectors: RwLock::new(HashMap::new()),
            dimensions,
            distance,
        }
    }

    /// Get the distance function used by this index.
    pub fn distance_function(&self) -> DistanceFunction {
        self.distance
    }

    fn validate_dimension(&self, vector: &DenseVector) -> Result<()> {
        if vector.dimension() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.dimension(),
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    type Vector = DenseVector;

    fn description(&self) -> String {
        format!(
            "Flat index with VectorDimension: {}, Metric: {}",
            self.dimensions, self.distance
        )
    }

    fn vector_count(&self) -> usize {
        self.vectors.read().len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn add_batch(&self, data: Vec<(u64, DenseVector)>) -> Result<()> {
        for (_, vector) in &data {
            self.validate_dimension(vector)?;
        }

        let mut vectors = self.vectors.write();
        vectors.extend(data);
        Ok(())
    }

    fn delete_batch(&self, ids: &[u64]) -> Result<usize> {
        let mut vectors = self.vectors.write();
        Ok(ids.iter().filter(|id| vectors.remove(*id).is_some()).count())
    }

    fn find_nearest(
        &self,
        queries: &[DenseVector],
        limit_per_query: usize,
        retrieve_vectors: bool,
    ) -> Result<Vec<Vec<FoundVector<DenseVector>>>> {
        if limit_per_query == 0 {
            return Err(VectorError::InvalidArgument(
                "limit_per_query must be positive".to_string(),
            ));
        }
        for query in queries {
            self.validate_dimension(query)?;
        }

        let vectors = self.vectors.read();

        let results = queries
            .iter()
            .map(|query| {
                let mut scored: Vec<(u64, f32, &DenseVector)> = vectors
                    .iter()
                    .map(|(&id, v)| {
                        (id, self.distance.distance(query.as_slice(), v.as_slice()), v)
                    })
                    .collect();

                // Ties broken by id so results do not depend on map order
                scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
                scored.truncate(limit_per_query);

                scored
                    .into_iter()
                    .map(|(id, distance, v)| {
                        if retrieve_vectors {
                            FoundVector::with_vector(id, distance as f64, v.clone())
                        } else {
                            FoundVector::new(id, distance as f64)
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(coords: &[f32]) -> DenseVector {
        DenseVector::new(coords.to_vec()).unwrap()
    }

    fn create_test_index() -> FlatIndex {
        FlatIndex::new(3, DistanceFunction::Euclidean)
    }

    #[test]
    fn test_add_and_count() {
        let index = create_test_index();

        index
            .add_batch(vec![(1, dense(&[1.0, 2.0, 3.0])), (2, dense(&[4.0, 5.0, 6.0]))])
            .unwrap();

        assert_eq!(index.vector_count(), 2);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_add_replaces_existing() {
        let index = create_test_index();

        index.add_batch(vec![(1, dense(&[1.0, 2.0, 3.0]))]).unwrap();
        index.add_batch(vec![(1, dense(&[7.0, 8.0, 9.0]))]).unwrap();

        assert_eq!(index.vector_count(), 1);
        let found = index.find_nearest(&[dense(&[7.0, 8.0, 9.0])], 1, true).unwrap();
        assert_eq!(found[0][0].vector.as_ref().unwrap().as_slice(), &[7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_delete_batch_counts_removed() {
        let index = create_test_index();

        index
            .add_batch(vec![(1, dense(&[1.0, 2.0, 3.0])), (2, dense(&[4.0, 5.0, 6.0]))])
            .unwrap();

        assert_eq!(index.delete_batch(&[1, 42]).unwrap(), 1);
        assert_eq!(index.vector_count(), 1);
        assert_eq!(index.delete_batch(&[1]).unwrap(), 0);
    }

    #[test]
    fn test_search_euclidean() {
        let index = create_test_index();

        index
            .add_batch(vec![
                (10, dense(&[0.0, 0.0, 0.0])),
                (11, dense(&[1.0, 1.0, 1.0])),
                (12, dense(&[10.0, 10.0, 10.0])),
            ])
            .unwrap();

        let results = index.find_nearest(&[dense(&[0.0, 0.0, 0.0])], 3, false).unwrap();

        assert_eq!(results.len(), 1);
        let ids: Vec<u64> = results[0].iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert!(results[0][0].distance < 0.001);
        assert!(results[0][0].vector.is_none());
    }

    #[test]
    fn test_search_batch_keeps_query_order() {
        let index = create_test_index();

        for i in 0..10u64 {
            index.add_batch(vec![(i, dense(&[i as f32, 0.0, 0.0]))]).unwrap();
        }

        let queries = [dense(&[9.0, 0.0, 0.0]), dense(&[0.0, 0.0, 0.0])];
        let results = index.find_nearest(&queries, 2, false).unwrap();

        assert_eq!(results[0].iter().map(|m| m.id).collect::<Vec<_>>(), vec![9, 8]);
        assert_eq!(results[1].iter().map(|m| m.id).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_search_empty_index() {
        let index = create_test_index();
        let results = index.find_nearest(&[dense(&[1.0, 2.0, 3.0])], 5, false).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_empty());
    }

    #[test]
    fn test_search_limit_zero_is_error() {
        let index = create_test_index();
        let result = index.find_nearest(&[dense(&[1.0, 2.0, 3.0])], 0, false);
        assert!(matches!(result, Err(VectorError::InvalidArgument(_))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = create_test_index();

        let result = index.add_batch(vec![(1, dense(&[1.0, 2.0]))]);
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
        assert!(index.is_empty());

        let result = index.find_nearest(&[dense(&[1.0, 2.0])], 1, false);
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_inner_product_ranking() {
        let index = FlatIndex::new(3, DistanceFunction::InnerProduct);

        index
            .add_batch(vec![
                (1, dense(&[1.0, 1.0, 1.0])),
                (2, dense(&[0.1, 0.1, 0.1])),
                (3, dense(&[-1.0, -1.0, -1.0])),
            ])
            .unwrap();

        let results = index.find_nearest(&[dense(&[1.0, 1.0, 1.0])], 3, false).unwrap();
        let ids: Vec<u64> = results[0].iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let index = Arc::new(create_test_index());
        let mut handles = vec![];

        for i in 0..10u64 {
            let index = Arc::clone(&index);
            handles.push(thread::spawn(move || {
                index.add_batch(vec![(i, dense(&[i as f32, 0.0, 0.0]))]).unwrap();
            }));
        }

        for _ in 0..10 {
            let index = Arc::clone(&index);
            handles.push(thread::spawn(move || {
                let _ = index.find_nearest(&[dense(&[0.0, 0.0, 0.0])], 5, false);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.vector_count(), 10);
    }
}
