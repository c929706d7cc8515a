//! Sparse index facade.

use crate::cluster::{ClusterData, ClusterSettings};
use crate::config::{RngFactory, SparnnConfig};
use crate::forest::MultiClusterIndex;
use crate::{Result, SparnnError};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use vekt_vector::{FoundVector, SparseVector, VectorError, VectorIndex};

/// Approximate nearest neighbor index over sparse vectors.
///
/// The forest is created by the first non-empty [`add`](Self::add) call, which
/// also fixes the cluster size when none is configured. Until then the index
/// is empty and every search returns empty lists.
///
/// Writers take an exclusive lock for the whole batch, so searches only ever
/// see fully applied batches.
pub struct SparnnIndex {
    dimensions: usize,
    config: SparnnConfig,
    rng_factory: RngFactory,
    state: RwLock<IndexState>,
}

#[derive(Default)]
struct IndexState {
    forest: Option<MultiClusterIndex>,
    cluster_size: Option<usize>,
    /// Ids currently stored in every tree.
    ids: HashSet<u64>,
}

impl SparnnIndex {
    /// Create an empty index for vectors of `dimensions` coordinates.
    ///
    /// # Errors
    ///
    /// [`SparnnError::InvalidConfig`] for a zero dimension or an invalid
    /// configuration.
    pub fn new(dimensions: usize, config: SparnnConfig) -> Result<Self> {
        Self::with_rng_factory(dimensions, config, RngFactory::from_entropy())
    }

    /// Create an empty index whose trees draw randomness from `rng_factory`.
    pub fn with_rng_factory(
        dimensions: usize,
        config: SparnnConfig,
        rng_factory: RngFactory,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(SparnnError::InvalidConfig(
                "vector dimension must be positive".to_string(),
            ));
        }
        config.validate()?;

        tracing::info!(
            dimensions,
            algorithm = %config.algorithm,
            indices_number = config.indices_number,
            "Created sparse index"
        );

        Ok(Self {
            dimensions,
            config,
            rng_factory,
            state: RwLock::new(IndexState::default()),
        })
    }

    pub fn config(&self) -> &SparnnConfig {
        &self.config
    }

    /// Cluster size in use, once the forest exists.
    pub fn cluster_size(&self) -> Option<usize> {
        self.state.read().cluster_size
    }

    fn validate_dimension(&self, vector: &SparseVector) -> Result<()> {
        if vector.dimension() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.dimension(),
            }
            .into());
        }
        Ok(())
    }

    /// Index a batch of `(id, vector)` pairs.
    ///
    /// # Errors
    ///
    /// An id repeated within the batch or already indexed is rejected with
    /// `VectorError::InvalidArgument`, and nothing from the batch is stored.
    pub fn add(&self, data: Vec<(u64, SparseVector)>) -> Result<()> {
        for (_, vector) in &data {
            self.validate_dimension(vector)?;
        }
        if data.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();
        let state = &mut *state;

        let mut batch_ids = HashSet::with_capacity(data.len());
        for (id, _) in &data {
            if state.ids.contains(id) || !batch_ids.insert(*id) {
                return Err(VectorError::InvalidArgument(format!(
                    "duplicate vector id {}",
                    id
                ))
                .into());
            }
        }

        let records: ClusterData = data
            .into_iter()
            .map(|(id, vector)| (Arc::new(vector), id))
            .collect();

        if let Some(forest) = state.forest.as_mut() {
            let inserted = records.len();
            forest.insert(records)?;
            tracing::debug!(
                inserted,
                records = forest.len(),
                trees = forest.tree_count(),
                "Inserted batch into sparse index forest"
            );
            state.ids.extend(batch_ids);
            return Ok(());
        }

        let cluster_size = self.config.resolve_cluster_size(records.len());
        let settings = ClusterSettings {
            desired_cluster_size: cluster_size,
            algorithm: self.config.algorithm,
        };

        tracing::info!(
            records = records.len(),
            cluster_size,
            "Bootstrapping sparse index forest"
        );

        state.forest = Some(MultiClusterIndex::build(
            settings,
            records,
            self.config.indices_number,
            &self.rng_factory,
        )?);
        state.cluster_size = Some(cluster_size);
        state.ids = batch_ids;
        Ok(())
    }

    /// Delete vectors by id, returning how many were removed.
    pub fn delete(&self, ids: &[u64]) -> Result<usize> {
        let mut state = self.state.write();
        let state = &mut *state;
        let forest = match state.forest.as_mut() {
            Some(forest) => forest,
            None => return Ok(0),
        };

        let elements: HashSet<u64> = ids.iter().copied().collect();
        let removed = forest.delete(&elements)?;
        state.ids.retain(|id| !elements.contains(id));

        if removed < elements.len() {
            tracing::warn!(
                requested = elements.len(),
                removed,
                "Not every id scheduled for deletion was indexed"
            );
        }
        Ok(removed)
    }

    /// Up to `k` nearest vectors per query, ascending by distance.
    pub fn search(
        &self,
        queries: &[SparseVector],
        k: usize,
        retrieve_vectors: bool,
    ) -> Result<Vec<Vec<FoundVector<SparseVector>>>> {
        if k == 0 {
            return Err(SparnnError::InvalidK);
        }
        for query in queries {
            self.validate_dimension(query)?;
        }

        let state = self.state.read();
        let forest = match state.forest.as_ref() {
            Some(forest) => forest,
            None => return Ok(queries.iter().map(|_| Vec::new()).collect()),
        };

        let refs: Vec<&SparseVector> = queries.iter().collect();
        let hits = forest.search(
            &refs,
            k,
            self.config.clusters_to_search,
            self.config.trees_to_search(),
        )?;

        Ok(hits
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|hit| FoundVector {
                        id: hit.element,
                        distance: hit.distance,
                        vector: retrieve_vectors.then(|| (*hit.vector).clone()),
                    })
                    .collect()
            })
            .collect())
    }
}

impl VectorIndex for SparnnIndex {
    type Vector = SparseVector;

    fn description(&self) -> String {
        let cluster_size = self
            .cluster_size()
            .or(self.config.desired_cluster_size)
            .map_or_else(|| "auto".to_string(), |size| size.to_string());

        format!(
            "SPARNN index with VectorDimension: {}, ClusterSize: {}, IndicesNumber: {}",
            self.dimensions, cluster_size, self.config.indices_number
        )
    }

    fn vector_count(&self) -> usize {
        self.state.read().ids.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn add_batch(&self, data: Vec<(u64, SparseVector)>) -> vekt_vector::Result<()> {
        self.add(data).map_err(Into::into)
    }

    fn delete_batch(&self, ids: &[u64]) -> vekt_vector::Result<usize> {
        self.delete(ids).map_err(Into::into)
    }

    fn find_nearest(
        &self,
        queries: &[SparseVector],
        limit_per_query: usize,
        retrieve_vectors: bool,
    ) -> vekt_vector::Result<Vec<Vec<FoundVector<SparseVector>>>> {
        self.search(queries, limit_per_query, retrieve_vectors)
            .map_err(Into::into)
    }
}
