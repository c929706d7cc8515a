//! Bounded top-k selection.
//!
//! Both selectors keep a sorted buffer of at most `k` entries and place each
//! candidate with a binary search, giving O(n log k) comparisons. A candidate
//! is inserted after every buffered entry with an equal key, so among equal
//! keys the one seen first ranks first.

use crate::{Result, SparnnError};
use std::cmp::Ordering;

/// The `k` smallest values of `distances` as `(position, distance)` pairs,
/// ascending.
///
/// # Example
///
/// ```
/// use vekt_sparnn::take_k_best;
///
/// let best = take_k_best(&[0.9, 0.1, 0.5, 0.1], 3).unwrap();
/// assert_eq!(best, vec![(1, 0.1), (3, 0.1), (2, 0.5)]);
/// ```
pub fn take_k_best(distances: &[f64], k: usize) -> Result<Vec<(usize, f64)>> {
    take_k_best_by(distances.iter().copied().enumerate(), k, |&(_, d)| d)
}

/// The `k` items with the smallest key, ascending by key.
///
/// Returns every item, sorted, when there are fewer than `k`.
pub fn take_k_best_by<T, I, F>(items: I, k: usize, key: F) -> Result<Vec<T>>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> f64,
{
    if k == 0 {
        return Err(SparnnError::InvalidK);
    }

    let mut best: Vec<(f64, T)> = Vec::with_capacity(k.min(64));

    for item in items {
        let value = key(&item);

        if best.len() == k {
            match best.last() {
                Some((worst, _)) if value.total_cmp(worst) != Ordering::Less => continue,
                _ => {}
            }
            best.pop();
        }

        let pos = best.partition_point(|(v, _)| v.total_cmp(&value) != Ordering::Greater);
        best.insert(pos, (value, item));
    }

    Ok(best.into_iter().map(|(_, item)| item).collect())
}
