//! Top-N combiner for selecting the largest values

use super::CombineFn;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

/// The largest **N** values (requires `Ord`).
///
/// The accumulator is a **min-heap** (`BinaryHeap<Reverse<T>>`) of size ≤ `n`,
/// so memory per worker is bounded by `n`. Ties are resolved entirely by
/// `T`'s ordering; give `T` a total order if the selection must be deterministic.
///
/// - Accumulator: `BinaryHeap<Reverse<T>>`
/// - Output: `Vec<T>` sorted descending.
///
/// `n == 0` always produces an empty vector.
#[derive(Clone, Debug)]
pub struct TopN<T> {
    /// Number of largest elements to keep.
    pub n: usize,
    _m: PhantomData<fn() -> T>,
}

impl<T> TopN<T> {
    #[must_use]
    pub const fn new(n: usize) -> Self {
        Self { n, _m: PhantomData }
    }
}

impl<T> CombineFn<T, BinaryHeap<Reverse<T>>, Vec<T>> for TopN<T>
where
    T: Ord + Send,
{
    fn create(&self) -> BinaryHeap<Reverse<T>> {
        BinaryHeap::with_capacity(self.n.saturating_add(1).min(1024))
    }

    fn add_input(&self, acc: &mut BinaryHeap<Reverse<T>>, v: T) {
        acc.push(Reverse(v));
        if acc.len() > self.n {
            acc.pop(); // drop smallest
        }
    }

    fn merge(&self, acc: &mut BinaryHeap<Reverse<T>>, other: BinaryHeap<Reverse<T>>) {
        if acc.len() + other.len() <= self.n {
            acc.extend(other);
            return;
        }
        for v in other {
            acc.push(v);
            if acc.len() > self.n {
                acc.pop();
            }
        }
    }

    fn finish(&self, acc: BinaryHeap<Reverse<T>>) -> Vec<T> {
        // into_sorted_vec on Reverse<T> is ascending in Reverse, i.e. descending in T.
        acc.into_sorted_vec().into_iter().map(|Reverse(v)| v).collect()
    }
}
