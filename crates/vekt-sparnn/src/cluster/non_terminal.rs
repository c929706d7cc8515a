use super::{ClusterData, ClusterNode, ClusterSettings, TerminalNode};
use crate::space::{DistanceSpace, NearestSearchResult};
use crate::top_k::take_k_best_by;
use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use vekt_vector::SparseVector;

/// Inner node: one representative vector per child.
///
/// `representatives` maps each representative to the position of its child
/// in `children`. Inserts go to the single nearest child; searches explore
/// the best `clusters_to_search` children and widen when that is not enough.
pub(crate) struct NonTerminalNode {
    representatives: DistanceSpace<usize>,
    children: Vec<ClusterNode>,
    /// Reused when this subtree is reindexed.
    rng: StdRng,
}

impl NonTerminalNode {
    /// Partition `data` around randomly sampled pivots and build one child per
    /// non-empty group.
    ///
    /// Falls back to a leaf when every record lands in the same group (for
    /// example when all vectors are identical), since splitting again would
    /// never make progress.
    pub(crate) fn build(
        settings: &ClusterSettings,
        data: ClusterData,
        rng: &mut StdRng,
    ) -> Result<ClusterNode> {
        let mut rng = StdRng::seed_from_u64(rng.gen());
        let mut groups = partition(settings, data, &mut rng)?;

        if groups.len() < 2 {
            let data = groups.pop().map(|(_, group)| group).unwrap_or_default();
            return Ok(ClusterNode::Terminal(TerminalNode::build(settings, data)?));
        }

        // Seeds are drawn before the parallel build so tree shapes do not
        // depend on scheduling.
        let seeds: Vec<u64> = groups.iter().map(|_| rng.gen()).collect();
        let (pivots, groups): (Vec<_>, Vec<_>) = groups.into_iter().unzip();

        let children = groups
            .into_par_iter()
            .zip(seeds)
            .map(|(group, seed)| {
                let mut child_rng = StdRng::seed_from_u64(seed);
                ClusterNode::build(settings, group, &mut child_rng)
            })
            .collect::<Result<Vec<_>>>()?;

        let representatives = DistanceSpace::build(
            settings.algorithm,
            pivots,
            (0..children.len()).collect(),
            settings.search_batch_size(),
        )?;

        Ok(ClusterNode::NonTerminal(Self {
            representatives,
            children,
            rng,
        }))
    }

    pub(crate) fn rng(&self) -> &StdRng {
        &self.rng
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn has_overflowed_child(&self, settings: &ClusterSettings) -> bool {
        self.children.iter().any(|child| child.is_overflowed(settings))
    }

    /// Route every record to its nearest child and insert there.
    pub(crate) fn insert(&mut self, settings: &ClusterSettings, data: ClusterData) -> Result<()> {
        let queries: Vec<&SparseVector> = data.vectors.iter().map(AsRef::as_ref).collect();
        let nearest = self.representatives.search_nearest(&queries, 1)?;

        let mut routed: Vec<ClusterData> =
            self.children.iter().map(|_| ClusterData::default()).collect();
        let records = data.vectors.into_iter().zip(data.elements);
        for ((vector, element), hits) in records.zip(nearest) {
            let child = hits.first().map_or(0, |hit| hit.element);
            routed[child].push(vector, element);
        }

        self.children
            .par_iter_mut()
            .zip(routed)
            .filter(|(_, batch)| !batch.is_empty())
            .try_for_each(|(child, batch)| child.insert(settings, batch))
    }

    pub(crate) fn delete(
        &mut self,
        settings: &ClusterSettings,
        elements: &HashSet<u64>,
    ) -> Result<usize> {
        self.children
            .par_iter_mut()
            .map(|child| child.delete(settings, elements))
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }

    pub(crate) fn search(
        &self,
        settings: &ClusterSettings,
        queries: &[&SparseVector],
        k: usize,
        clusters_to_search: usize,
    ) -> Result<Vec<Vec<NearestSearchResult<u64>>>> {
        // Every child, ranked per query.
        let rankings = self.representatives.search_nearest(queries, self.children.len())?;
        let beam = clusters_to_search.min(self.children.len());

        let mut assignments: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (query, ranking) in rankings.iter().enumerate() {
            for hit in ranking.iter().take(beam) {
                assignments.entry(hit.element).or_default().push(query);
            }
        }

        let partials = assignments
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(child, members)| -> Result<_> {
                let batch: Vec<&SparseVector> = members.iter().map(|&q| queries[q]).collect();
                let results =
                    self.children[child].search(settings, &batch, k, clusters_to_search)?;
                Ok((members, results))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut found: Vec<Vec<NearestSearchResult<u64>>> =
            queries.iter().map(|_| Vec::new()).collect();
        for (members, results) in partials {
            for (query, hits) in members.into_iter().zip(results) {
                found[query].extend(hits);
            }
        }

        // Widen into the remaining children, best first, for queries that
        // are still short of k.
        found
            .par_iter_mut()
            .zip(rankings.par_iter())
            .enumerate()
            .try_for_each(|(query, (hits, ranking))| -> Result<()> {
                for next in ranking.iter().skip(beam) {
                    if hits.len() >= k {
                        break;
                    }
                    let more = self.children[next.element].search(
                        settings,
                        &[queries[query]],
                        k - hits.len(),
                        clusters_to_search,
                    )?;
                    hits.extend(more.into_iter().flatten());
                }
                Ok(())
            })?;

        found
            .into_iter()
            .map(|hits| take_k_best_by(hits, k, |hit| hit.distance))
            .collect()
    }

    pub(crate) fn child_data(&self) -> ClusterData {
        let mut data = ClusterData::default();
        for child in &self.children {
            data.extend(child.child_data());
        }
        data
    }

    pub(crate) fn len(&self) -> usize {
        self.children.iter().map(ClusterNode::len).sum()
    }

    pub(crate) fn max_child_depth(&self) -> usize {
        self.children.iter().map(ClusterNode::depth).max().unwrap_or(0)
    }
}

/// Group records by their nearest of `min(desired_cluster_size, n)` randomly
/// sampled pivots. Returns `(pivot, members)` for every non-empty group, in
/// pivot order.
fn partition(
    settings: &ClusterSettings,
    data: ClusterData,
    rng: &mut StdRng,
) -> Result<Vec<(Arc<SparseVector>, ClusterData)>> {
    let pivot_count = settings.desired_cluster_size.min(data.len());
    let pivots: Vec<Arc<SparseVector>> = rand::seq::index::sample(rng, data.len(), pivot_count)
        .into_iter()
        .map(|i| Arc::clone(&data.vectors[i]))
        .collect();

    let pivot_space = DistanceSpace::build(
        settings.algorithm,
        pivots.clone(),
        (0..pivot_count).collect(),
        settings.search_batch_size(),
    )?;

    let queries: Vec<&SparseVector> = data.vectors.iter().map(AsRef::as_ref).collect();
    let nearest = pivot_space.search_nearest(&queries, 1)?;

    let mut groups: Vec<ClusterData> = pivots.iter().map(|_| ClusterData::default()).collect();
    for ((vector, element), hits) in data.vectors.into_iter().zip(data.elements).zip(nearest) {
        let group = hits.first().map_or(0, |hit| hit.element);
        groups[group].push(vector, element);
    }

    Ok(pivots
        .into_iter()
        .zip(groups)
        .filter(|(_, group)| !group.is_empty())
        .collect())
}
