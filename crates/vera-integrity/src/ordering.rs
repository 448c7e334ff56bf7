//! Stable ordering helpers.
//!
//! Everything that feeds a hash or a report goes through one of these so the
//! output order never depends on insertion order or hash-map iteration.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Collect and stable-sort by a derived key.
pub fn sorted_by_key<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut out: Vec<T> = items.into_iter().collect();
    out.sort_by(|a, b| key(a).cmp(&key(b)));
    out
}

/// Collect and stable-sort with a comparator; equal elements keep input order.
pub fn stable_sort_by<T, F>(items: impl IntoIterator<Item = T>, compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut out: Vec<T> = items.into_iter().collect();
    out.sort_by(compare);
    out
}

/// Group items by key. Keys iterate in sorted order; each group keeps input order.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

/// Drop later items whose key was already seen. First occurrence wins.
pub fn unique_by<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut seen = BTreeSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

/// Sorted, deduplicated copy.
pub fn sorted_unique<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = items.into_iter().collect();
    out.sort();
    out.dedup();
    out
}
