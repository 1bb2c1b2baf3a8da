use super::Engine;
use crate::combiners::CombineFn;
use crate::error::{Error, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::BTreeMap;
use tracing::debug;

/// Multi-threaded engine backed by a private Rayon pool.
///
/// Input is split into at most `partitions` contiguous chunks. Stateless
/// steps run per chunk and are reassembled in chunk order; `group_by` and
/// `combine` build one partial result per chunk and merge them left to right.
pub struct ParallelEngine {
    pool: ThreadPool,
    partitions: usize,
}

impl ParallelEngine {
    /// Create the engine with an explicit thread count and partition count.
    ///
    /// * `threads`: defaults to `num_cpus::get()`.
    /// * `partitions`: defaults to `2 * num_cpus::get()` (at least 4).
    ///
    /// # Errors
    /// Returns [`Error::Config`] if either count is zero or the pool cannot be built.
    pub fn new(threads: Option<usize>, partitions: Option<usize>) -> Result<Self> {
        if threads == Some(0) || partitions == Some(0) {
            return Err(Error::config(
                "parallel engine needs at least one thread and one partition",
            ));
        }
        let threads = threads.unwrap_or_else(num_cpus::get).max(1);
        let partitions = partitions.unwrap_or_else(|| 2 * num_cpus::get().max(2));
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("reelbeam-worker-{i}"))
            .build()
            .map_err(|e| Error::config(format!("build thread pool: {e}")))?;
        debug!(threads, partitions, "parallel engine ready");
        Ok(Self { pool, partitions })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    #[must_use]
    pub const fn partitions(&self) -> usize {
        self.partitions
    }

    /// Minimum items per chunk so that `len` items form at most `partitions` chunks.
    fn chunk_len(&self, len: usize) -> usize {
        len.div_ceil(self.partitions).max(1)
    }
}

impl Engine for ParallelEngine {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn filter<T, P>(&self, items: Vec<T>, pred: P) -> Vec<T>
    where
        T: Send,
        P: Fn(&T) -> bool + Send + Sync,
    {
        let min = self.chunk_len(items.len());
        self.pool.install(|| {
            items
                .into_par_iter()
                .with_min_len(min)
                .filter(|t| pred(t))
                .collect()
        })
    }

    fn map<T, O, F>(&self, items: Vec<T>, f: F) -> Vec<O>
    where
        T: Send,
        O: Send,
        F: Fn(T) -> O + Send + Sync,
    {
        let min = self.chunk_len(items.len());
        self.pool
            .install(|| items.into_par_iter().with_min_len(min).map(&f).collect())
    }

    fn try_map<T, O, E, F>(&self, items: Vec<T>, f: F) -> Result<Vec<O>, E>
    where
        T: Send,
        O: Send,
        E: Send,
        F: Fn(T) -> Result<O, E> + Send + Sync,
    {
        let min = self.chunk_len(items.len());
        self.pool
            .install(|| items.into_par_iter().with_min_len(min).map(&f).collect())
    }

    fn count<T, P>(&self, items: &[T], pred: P) -> usize
    where
        T: Sync,
        P: Fn(&T) -> bool + Send + Sync,
    {
        let min = self.chunk_len(items.len());
        self.pool.install(|| {
            items
                .par_iter()
                .with_min_len(min)
                .filter(|t| pred(t))
                .count()
        })
    }

    fn group_by<T, K, F>(&self, items: Vec<T>, key: F) -> BTreeMap<K, Vec<T>>
    where
        T: Send,
        K: Ord + Send,
        F: Fn(&T) -> K + Send + Sync,
    {
        let min = self.chunk_len(items.len());
        self.pool.install(|| {
            items
                .into_par_iter()
                .with_min_len(min)
                .fold(BTreeMap::new, |mut local: BTreeMap<K, Vec<T>>, item| {
                    local.entry(key(&item)).or_default().push(item);
                    local
                })
                .reduce(BTreeMap::new, |mut left, right| {
                    for (k, mut vs) in right {
                        left.entry(k).or_default().append(&mut vs);
                    }
                    left
                })
        })
    }

    fn combine<T, A, O, C>(&self, items: &[T], comb: &C) -> O
    where
        T: Clone + Sync,
        A: Send,
        C: CombineFn<T, A, O>,
    {
        let chunk = self.chunk_len(items.len());
        let acc = self.pool.install(|| {
            items
                .par_chunks(chunk)
                .map(|part| {
                    let mut local = comb.create();
                    for v in part {
                        comb.add_input(&mut local, v.clone());
                    }
                    local
                })
                .reduce(
                    || comb.create(),
                    |mut left, right| {
                        comb.merge(&mut left, right);
                        left
                    },
                )
        });
        comb.finish(acc)
    }
}
