//! Exact distinct-value counting.

use super::CombineFn;
use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;

/// Count of **distinct** values.
///
/// - Accumulator: `HashSet<T>`
/// - Output: `u64`
///
/// Requires `T: Eq + Hash`. `None` is a value like any other, so two missing
/// entries count once.
#[derive(Clone, Copy, Debug)]
pub struct DistinctCount<T>(PhantomData<fn() -> T>);

impl<T> DistinctCount<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for DistinctCount<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CombineFn<T, HashSet<T>, u64> for DistinctCount<T>
where
    T: Eq + Hash + Send,
{
    fn create(&self) -> HashSet<T> {
        HashSet::new()
    }

    fn add_input(&self, acc: &mut HashSet<T>, v: T) {
        acc.insert(v);
    }

    fn merge(&self, acc: &mut HashSet<T>, other: HashSet<T>) {
        if acc.len() < other.len() {
            let smaller = std::mem::replace(acc, other);
            acc.extend(smaller);
        } else {
            acc.extend(other);
        }
    }

    fn finish(&self, acc: HashSet<T>) -> u64 {
        acc.len() as u64
    }
}
