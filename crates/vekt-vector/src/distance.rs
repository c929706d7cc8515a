//! Distance functions for dense vectors.
//!
//! All metrics are expressed as distances: lower means more similar. Inner
//! product is negated so that a single ascending merge order works for every
//! metric.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dense distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceFunction {
    /// Euclidean (L2) distance: sqrt(sum((a[i] - b[i])^2))
    Euclidean,
    /// Cosine distance: 1 - (a · b) / (||a|| * ||b||)
    Cosine,
    /// Negated inner product: -(a · b)
    InnerProduct,
}

impl DistanceFunction {
    /// Compute the distance between two vectors of equal length.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => euclidean_distance(a, b),
            Self::Cosine => cosine_distance(a, b),
            Self::InnerProduct => -inner_product(a, b),
        }
    }

    /// Short metric name used in algorithm identifiers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "L2",
            Self::Cosine => "Cosine",
            Self::InnerProduct => "IP",
        }
    }
}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceFunction {
    type Err = crate::VectorError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "L2" => Ok(Self::Euclidean),
            "Cosine" => Ok(Self::Cosine),
            "IP" => Ok(Self::InnerProduct),
            other => Err(crate::VectorError::InvalidArgument(format!(
                "unknown distance function: {}",
                other
            ))),
        }
    }
}

/// Euclidean (L2) distance.
///
/// # Example
///
/// ```
/// use vekt_vector::euclidean_distance;
///
/// let dist = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]);
/// assert!((dist - 5.0).abs() < 1e-6);
/// ```
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Squared Euclidean distance, enough for ranking.
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Cosine distance in `[0, 2]`.
///
/// A zero vector has no direction; its distance to anything is defined as 1.
///
/// ```
/// use vekt_vector::cosine_distance;
///
/// assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
/// assert!((cosine_distance(&[1.0, 0.0], &[0.0, 3.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 1.0]), 1.0);
/// ```
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f32, 0.0f32, 0.0f32), |acc, (x, y)| {
        (acc.0 + x * y, acc.1 + x * x, acc.2 + y * y)
    });

    let denom = (norm_a * norm_b).sqrt();
    if denom < f32::EPSILON {
        return 1.0;
    }

    1.0 - (dot / denom).clamp(-1.0, 1.0)
}

/// Inner (dot) product. Higher means more similar.
#[inline]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
