//! Accumulator-style aggregations driven by [`Engine::combine`](crate::engine::Engine::combine).
//!
//! A combiner describes how to fold a stream of values into an accumulator
//! (`create` / `add_input`), how to merge two partial accumulators built on
//! different workers (`merge`), and how to turn the final accumulator into an
//! output (`finish`). The sequential engine only ever uses one accumulator;
//! the parallel engine builds one per chunk and merges them.
//!
//! - [`TopN<T>`] -- the N largest values, descending.
//! - [`DistinctCount<T>`] -- number of distinct values.

mod distinct;
mod topk;

pub use distinct::DistinctCount;
pub use topk::TopN;

/// Associative aggregation over values of type `V` with accumulator `A` and output `O`.
pub trait CombineFn<V, A, O>: Send + Sync {
    fn create(&self) -> A;
    fn add_input(&self, acc: &mut A, v: V);
    fn merge(&self, acc: &mut A, other: A);
    fn finish(&self, acc: A) -> O;
}
