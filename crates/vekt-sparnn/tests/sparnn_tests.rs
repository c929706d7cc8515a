//! Integration tests for vekt-sparnn.
//!
//! Exercises the public index contract end to end:
//! - Jaccard matrix and postings spaces agree exactly
//! - Every stored vector finds itself, for shallow and deep trees
//! - Deleted ids never come back
//! - Empty, all-zero and mismatched inputs are handled without panics

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use vekt_sparnn::{DistanceSpace, RngFactory, SpaceAlgorithm, SparnnConfig, SparnnIndex};
use vekt_vector::{FoundVector, SparseVector, VectorError, VectorIndex};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

fn row(values: &[f64]) -> SparseVector {
    SparseVector::from_dense(values).unwrap()
}

/// `count` vectors with `nnz` random positive coordinates each.
fn random_vectors(count: usize, dimension: usize, nnz: usize, seed: u64) -> Vec<SparseVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let indices = rand::seq::index::sample(&mut rng, dimension, nnz).into_vec();
            let values = (0..nnz).map(|_| rng.gen_range(0.1..1.0)).collect();
            SparseVector::new(dimension, indices, values).unwrap()
        })
        .collect()
}

fn index_with(algorithm: SpaceAlgorithm, cluster_size: Option<usize>, seed: u64) -> SparnnIndex {
    let config = SparnnConfig {
        algorithm,
        desired_cluster_size: cluster_size,
        ..Default::default()
    };
    SparnnIndex::with_rng_factory(512, config, RngFactory::seeded(seed)).unwrap()
}

/// `1 - cos(a, b)` computed from the dense renderings.
fn cosine_distance(a: &SparseVector, b: &SparseVector) -> f64 {
    let (x, y) = (a.to_dense(), b.to_dense());
    let dot: f64 = x.iter().zip(&y).map(|(p, q)| p * q).sum();
    1.0 - dot / (a.l2_norm() * b.l2_norm())
}

fn ids(matches: &[FoundVector<SparseVector>]) -> Vec<u64> {
    matches.iter().map(|m| m.id).collect()
}

// ============================================================================
// Distance spaces
// ============================================================================

proptest! {
    #[test]
    fn prop_jaccard_forms_have_equal_distance_sums(
        rows in prop::collection::vec(prop::collection::vec(any::<bool>(), 12), 1..40),
        queries in prop::collection::vec(prop::collection::vec(any::<bool>(), 12), 1..8),
        k in 1usize..50,
    ) {
        let to_vector = |bits: &Vec<bool>| {
            row(&bits.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect::<Vec<_>>())
        };
        let base: Vec<Arc<SparseVector>> = rows.iter().map(|r| Arc::new(to_vector(r))).collect();
        let queries: Vec<SparseVector> = queries.iter().map(to_vector).collect();
        let refs: Vec<&SparseVector> = queries.iter().collect();
        let elements: Vec<usize> = (0..base.len()).collect();

        let matrix = DistanceSpace::build(
            SpaceAlgorithm::JaccardBinary, base.clone(), elements.clone(), 3,
        ).unwrap();
        let postings = DistanceSpace::build(
            SpaceAlgorithm::JaccardBinarySingleFeatureOriented, base, elements, 3,
        ).unwrap();

        let left = matrix.search_nearest(&refs, k).unwrap();
        let right = postings.search_nearest(&refs, k).unwrap();

        for (l, r) in left.iter().zip(&right) {
            let l_sum: f64 = l.iter().map(|hit| hit.distance).sum();
            let r_sum: f64 = r.iter().map(|hit| hit.distance).sum();
            prop_assert_eq!(l_sum, r_sum);
            prop_assert_eq!(l.len(), k.min(rows.len()));
        }
    }
}

#[test]
fn test_all_zero_vectors_have_zero_jaccard_distance() {
    let zero = Arc::new(row(&[0.0, 0.0, 0.0, 0.0]));
    let base = vec![zero.clone(), zero.clone(), zero.clone()];

    for algorithm in [
        SpaceAlgorithm::JaccardBinary,
        SpaceAlgorithm::JaccardBinarySingleFeatureOriented,
    ] {
        let space = DistanceSpace::build(algorithm, base.clone(), vec![1u64, 2, 3], 8).unwrap();
        let results = space.search_nearest(&[zero.as_ref()], 3).unwrap();

        let distances: Vec<f64> = results[0].iter().map(|hit| hit.distance).collect();
        assert_eq!(distances, vec![0.0, 0.0, 0.0]);
    }
}

#[test]
fn test_cosine_zero_vector_is_maximally_distant() {
    let index = index_with(SpaceAlgorithm::Cosine, None, 1);
    let zero = vec![0.0; 512];
    let mut one = vec![0.0; 512];
    one[3] = 1.0;
    index.add(vec![(1, row(&zero)), (2, row(&one))]).unwrap();

    let results = index.search(&[row(&zero)], 2, false).unwrap();
    assert!(results[0].iter().all(|m| m.distance == 1.0));
}

// ============================================================================
// Facade
// ============================================================================

#[test]
fn test_jaccard_end_to_end_distances() {
    init_tracing();

    for algorithm in [
        SpaceAlgorithm::JaccardBinary,
        SpaceAlgorithm::JaccardBinarySingleFeatureOriented,
    ] {
        let config = SparnnConfig {
            algorithm,
            ..Default::default()
        };
        let index = SparnnIndex::with_rng_factory(5, config, RngFactory::seeded(0)).unwrap();
        index
            .add_batch(vec![
                (1, row(&[1.0, 0.0, 0.0, 1.0, 1.0])),
                (2, row(&[1.0, 1.0, 0.0, 0.0, 0.0])),
                (3, row(&[0.0, 0.0, 1.0, 0.0, 0.0])),
                (4, row(&[0.0, 1.0, 1.0, 0.0, 0.0])),
            ])
            .unwrap();

        let results = index
            .find_nearest(&[row(&[0.0, 1.0, 1.0, 0.0, 0.0])], 4, false)
            .unwrap();

        assert_eq!(ids(&results[0]), vec![4, 3, 2, 1]);
        let distances: Vec<f64> = results[0].iter().map(|m| m.distance).collect();
        assert_eq!(distances, vec![0.0, 0.5, 1.0 - 1.0 / 3.0, 1.0]);
    }
}

#[test]
fn test_never_populated_index_returns_empty_lists() {
    let index = index_with(SpaceAlgorithm::JaccardBinary, None, 1);
    let queries = random_vectors(3, 512, 4, 1);

    let results = index.find_nearest(&queries, 10, true).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(Vec::is_empty));
    assert_eq!(index.vector_count(), 0);
}

#[test]
fn test_dimension_mismatch_is_reported() {
    let index = index_with(SpaceAlgorithm::Cosine, None, 1);

    let err = index.add_batch(vec![(1, row(&[1.0, 2.0]))]).unwrap_err();
    assert!(matches!(
        err,
        VectorError::DimensionMismatch {
            expected: 512,
            actual: 2
        }
    ));

    let err = index.find_nearest(&[row(&[1.0])], 1, false).unwrap_err();
    assert!(matches!(err, VectorError::DimensionMismatch { .. }));
}

#[test]
fn test_self_retrieval_in_deep_trees() {
    init_tracing();

    for algorithm in [
        SpaceAlgorithm::Cosine,
        SpaceAlgorithm::JaccardBinary,
        SpaceAlgorithm::JaccardBinarySingleFeatureOriented,
    ] {
        let index = index_with(algorithm, Some(6), 17);
        let vectors = random_vectors(300, 512, 6, 3);
        let data: Vec<(u64, SparseVector)> = (0u64..).zip(vectors.iter().cloned()).collect();
        index.add_batch(data).unwrap();

        let results = index.find_nearest(&vectors, 1, false).unwrap();
        for (id, result) in results.iter().enumerate() {
            assert_eq!(result[0].id, id as u64, "{} lost vector {}", algorithm, id);
            assert!(result[0].distance.abs() < 1e-9);
        }
    }
}

#[test]
fn test_incremental_growth_keeps_every_vector_reachable() {
    init_tracing();

    let index = index_with(SpaceAlgorithm::JaccardBinary, Some(4), 5);
    let vectors = random_vectors(200, 512, 5, 9);

    for (batch, chunk) in vectors.chunks(10).enumerate() {
        let data = chunk
            .iter()
            .enumerate()
            .map(|(i, v)| ((batch * 10 + i) as u64, v.clone()))
            .collect();
        index.add_batch(data).unwrap();
    }
    assert_eq!(index.vector_count(), 200);
    assert_eq!(index.cluster_size(), Some(4));

    let results = index.find_nearest(&vectors, 3, false).unwrap();
    for (id, result) in results.iter().enumerate() {
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].id, id as u64);
    }

    let doomed: Vec<u64> = (0..200).step_by(2).collect();
    assert_eq!(index.delete_batch(&doomed).unwrap(), 100);
    assert_eq!(index.vector_count(), 100);

    let results = index.find_nearest(&vectors, 5, false).unwrap();
    for result in &results {
        assert_eq!(result.len(), 5);
        assert!(result.iter().all(|m| m.id % 2 == 1));
    }
}

#[test]
fn test_deleted_vector_is_never_returned() {
    let index = index_with(SpaceAlgorithm::Cosine, None, 3);
    let a = random_vectors(1, 512, 8, 100).remove(0);
    let mut others = random_vectors(2, 512, 8, 200);
    let c = others.pop().unwrap();
    let b = others.pop().unwrap();

    index
        .add_batch(vec![(1, a.clone()), (2, b.clone()), (3, c.clone())])
        .unwrap();

    assert_eq!(index.delete_batch(&[1]).unwrap(), 1);
    assert_eq!(index.delete_batch(&[1]).unwrap(), 0);

    let results = index.find_nearest(&[a.clone()], 3, false).unwrap();
    assert_eq!(results[0].len(), 2);
    assert!(!ids(&results[0]).contains(&1));
    assert!(results[0][0].distance <= results[0][1].distance);

    for m in &results[0] {
        let expected = match m.id {
            2 => cosine_distance(&a, &b),
            3 => cosine_distance(&a, &c),
            other => panic!("unexpected id {}", other),
        };
        assert!(
            (m.distance - expected).abs() < 1e-9,
            "id {}: {} != {}",
            m.id,
            m.distance,
            expected
        );
    }
}

#[test]
fn test_reused_id_is_rejected_and_delete_stays_consistent() {
    init_tracing();

    for seed in 0..20 {
        let index = index_with(SpaceAlgorithm::JaccardBinary, Some(4), seed);
        let vectors: Vec<SparseVector> = random_vectors(200, 512, 5, seed)
            .into_iter()
            .map(|v| SparseVector::new(512, v.indices().to_vec(), vec![1.0; 5]).unwrap())
            .collect();
        index
            .add_batch((0u64..).zip(vectors.iter().cloned()).collect())
            .unwrap();

        // Shares four of five positions with the vector already stored as 7.
        let mut indices = vectors[7].indices().to_vec();
        indices[0] = (0..512).find(|i| !indices.contains(i)).unwrap();
        let near_copy = SparseVector::new(512, indices, vec![1.0; 5]).unwrap();

        let err = index.add_batch(vec![(7, near_copy.clone())]).unwrap_err();
        assert!(matches!(err, VectorError::InvalidArgument(_)));
        let err = index
            .add_batch(vec![(500, near_copy.clone()), (500, near_copy.clone())])
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidArgument(_)));
        assert_eq!(index.vector_count(), 200);

        assert_eq!(index.delete_batch(&[7]).unwrap(), 1, "seed {}", seed);
        assert_eq!(index.vector_count(), 199);

        let results = index.find_nearest(&[vectors[7].clone(), near_copy], 10, false).unwrap();
        for result in &results {
            assert!(!ids(result).contains(&7), "seed {}", seed);
        }
    }
}

#[test]
fn test_matrix_and_postings_indexes_agree() {
    let vectors: Vec<SparseVector> = random_vectors(150, 512, 4, 21)
        .into_iter()
        .map(|v| {
            let indices = v.indices().to_vec();
            let ones = vec![1.0; indices.len()];
            SparseVector::new(512, indices, ones).unwrap()
        })
        .collect();
    let data: Vec<(u64, SparseVector)> = (0u64..).zip(vectors.iter().cloned()).collect();

    let matrix = index_with(SpaceAlgorithm::JaccardBinary, Some(8), 42);
    let postings = index_with(SpaceAlgorithm::JaccardBinarySingleFeatureOriented, Some(8), 42);
    matrix.add_batch(data.clone()).unwrap();
    postings.add_batch(data).unwrap();

    let queries = &vectors[..20];
    let left = matrix.find_nearest(queries, 10, false).unwrap();
    let right = postings.find_nearest(queries, 10, false).unwrap();

    assert_eq!(left, right);
}

#[test]
fn test_retrieved_vectors_match_stored() {
    let index = index_with(SpaceAlgorithm::Cosine, Some(4), 8);
    let vectors = random_vectors(40, 512, 6, 8);
    let data: Vec<(u64, SparseVector)> = (0u64..).zip(vectors.iter().cloned()).collect();
    index.add_batch(data).unwrap();

    let results = index.find_nearest(&vectors[..5], 2, true).unwrap();
    for result in &results {
        for m in result {
            assert_eq!(m.vector.as_ref(), Some(&vectors[m.id as usize]));
        }
    }
}

#[test]
fn test_searching_fewer_trees() {
    let config = SparnnConfig {
        algorithm: SpaceAlgorithm::Cosine,
        desired_cluster_size: Some(4),
        indices_number: 3,
        indices_to_search: Some(1),
        ..Default::default()
    };
    let index = SparnnIndex::with_rng_factory(512, config, RngFactory::seeded(4)).unwrap();
    let vectors = random_vectors(60, 512, 6, 4);
    index
        .add_batch((0u64..).zip(vectors.iter().cloned()).collect())
        .unwrap();

    let results = index.find_nearest(&vectors, 4, false).unwrap();
    for (id, result) in results.iter().enumerate() {
        assert_eq!(result.len(), 4);
        assert_eq!(result[0].id, id as u64);
    }
    assert_eq!(
        index.description(),
        "SPARNN index with VectorDimension: 512, ClusterSize: 4, IndicesNumber: 3"
    );
}

#[test]
fn test_concurrent_readers_and_writer() {
    use std::thread;

    let index = Arc::new(index_with(SpaceAlgorithm::JaccardBinary, Some(8), 6));
    let vectors = Arc::new(random_vectors(100, 512, 5, 6));

    index
        .add_batch((0u64..50).zip(vectors[..50].iter().cloned()).collect())
        .unwrap();

    let mut handles = vec![];

    {
        let index = Arc::clone(&index);
        let vectors = Arc::clone(&vectors);
        handles.push(thread::spawn(move || {
            for (i, v) in vectors[50..].iter().enumerate() {
                index.add_batch(vec![(50 + i as u64, v.clone())]).unwrap();
            }
        }));
    }

    for _ in 0..4 {
        let index = Arc::clone(&index);
        let vectors = Arc::clone(&vectors);
        handles.push(thread::spawn(move || {
            let results = index.find_nearest(&vectors[..10], 1, false).unwrap();
            for (id, result) in results.iter().enumerate() {
                assert_eq!(result[0].id, id as u64);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(index.vector_count(), 100);
}
