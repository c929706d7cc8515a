//! Algorithm names and index options.

use crate::IndexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vekt_sparnn::{SpaceAlgorithm, SparnnConfig};
use vekt_vector::DistanceFunction;

const SPARNN_PREFIX: &str = "SparnnIndex";
const FLAT_PREFIX: &str = "FlatIndex";

/// Index algorithm, written `<Index>.<Metric>`.
///
/// ```
/// use vekt_index::Algorithm;
///
/// let algorithm: Algorithm = "SparnnIndex.JaccardBinary".parse().unwrap();
/// assert!(algorithm.vectors_are_sparse());
/// assert_eq!(algorithm.to_string(), "SparnnIndex.JaccardBinary");
///
/// let flat: Algorithm = "FlatIndex.L2".parse().unwrap();
/// assert!(!flat.vectors_are_sparse());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    /// Sparse cluster forest.
    Sparnn(SpaceAlgorithm),
    /// Exact dense scan.
    Flat(DistanceFunction),
}

impl Algorithm {
    pub fn vectors_are_sparse(&self) -> bool {
        matches!(self, Algorithm::Sparnn(_))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Sparnn(space) => write!(f, "{}.{}", SPARNN_PREFIX, space),
            Algorithm::Flat(distance) => write!(f, "{}.{}", FLAT_PREFIX, distance),
        }
    }
}

impl FromStr for Algorithm {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || IndexError::UnknownAlgorithm(s.to_string());
        let (index, metric) = s.split_once('.').ok_or_else(unknown)?;

        match index {
            SPARNN_PREFIX => metric.parse().map(Algorithm::Sparnn).map_err(|_| unknown()),
            FLAT_PREFIX => metric.parse().map(Algorithm::Flat).map_err(|_| unknown()),
            _ => Err(unknown()),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = IndexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.to_string()
    }
}

/// Construction options for sparse indices. Dense indices take none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// `None` picks `max(sqrt(n), 1000)` from the first batch.
    pub desired_cluster_size: Option<usize>,
    /// Default: 2
    pub indices_number: usize,
    /// Default: 2
    pub clusters_to_search: usize,
    pub indices_to_search: Option<usize>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        let defaults = SparnnConfig::default();
        Self {
            desired_cluster_size: defaults.desired_cluster_size,
            indices_number: defaults.indices_number,
            clusters_to_search: defaults.clusters_to_search,
            indices_to_search: defaults.indices_to_search,
        }
    }
}

impl IndexOptions {
    pub(crate) fn sparnn_config(&self, algorithm: SpaceAlgorithm) -> SparnnConfig {
        SparnnConfig {
            algorithm,
            desired_cluster_size: self.desired_cluster_size,
            indices_number: self.indices_number,
            clusters_to_search: self.clusters_to_search,
            indices_to_search: self.indices_to_search,
        }
    }
}
