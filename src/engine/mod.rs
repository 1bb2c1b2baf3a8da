//! Execution engines.
//!
//! Every stage is written once against the [`Engine`] trait, which exposes the
//! small capability set the pipeline needs: filter, derive (map / try_map),
//! aggregate-count, group, and accumulator-style combine. Two implementations
//! are interchangeable behind it:
//!
//! - [`SequentialEngine`] -- plain iterators on the calling thread.
//! - [`ParallelEngine`] -- a private Rayon pool; work is split into chunks and
//!   partial results are merged in order.
//!
//! [`AnyEngine`] selects one of them from an [`ExecMode`] at configuration time.
//!
//! Both engines produce the same output for the same input: filter and map keep
//! input order, `group_by` keeps input order inside each group, and `combine`
//! only relies on the combiner being associative.

mod parallel;
mod sequential;

pub use parallel::ParallelEngine;
pub use sequential::SequentialEngine;

use crate::combiners::CombineFn;
use crate::config::ExecMode;
use crate::error::Result;
use std::collections::BTreeMap;

/// The capability set every pipeline stage is written against.
pub trait Engine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Keep the items matching `pred`, preserving order.
    fn filter<T, P>(&self, items: Vec<T>, pred: P) -> Vec<T>
    where
        T: Send,
        P: Fn(&T) -> bool + Send + Sync;

    /// Derive a new value from every item, preserving order.
    fn map<T, O, F>(&self, items: Vec<T>, f: F) -> Vec<O>
    where
        T: Send,
        O: Send,
        F: Fn(T) -> O + Send + Sync;

    /// Fallible [`map`](Engine::map); the first error (in input order for the
    /// sequential engine, any for the parallel one) aborts the whole call.
    fn try_map<T, O, E, F>(&self, items: Vec<T>, f: F) -> Result<Vec<O>, E>
    where
        T: Send,
        O: Send,
        E: Send,
        F: Fn(T) -> Result<O, E> + Send + Sync;

    /// Number of items matching `pred`.
    fn count<T, P>(&self, items: &[T], pred: P) -> usize
    where
        T: Sync,
        P: Fn(&T) -> bool + Send + Sync;

    /// Group items by key. Items keep their relative input order inside a group.
    fn group_by<T, K, F>(&self, items: Vec<T>, key: F) -> BTreeMap<K, Vec<T>>
    where
        T: Send,
        K: Ord + Send,
        F: Fn(&T) -> K + Send + Sync;

    /// Fold every item into a combiner and return its finished output.
    fn combine<T, A, O, C>(&self, items: &[T], comb: &C) -> O
    where
        T: Clone + Sync,
        A: Send,
        C: CombineFn<T, A, O>;
}

impl<E: Engine> Engine for &E {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn filter<T, P>(&self, items: Vec<T>, pred: P) -> Vec<T>
    where
        T: Send,
        P: Fn(&T) -> bool + Send + Sync,
    {
        (**self).filter(items, pred)
    }

    fn map<T, O, F>(&self, items: Vec<T>, f: F) -> Vec<O>
    where
        T: Send,
        O: Send,
        F: Fn(T) -> O + Send + Sync,
    {
        (**self).map(items, f)
    }

    fn try_map<T, O, E2, F>(&self, items: Vec<T>, f: F) -> Result<Vec<O>, E2>
    where
        T: Send,
        O: Send,
        E2: Send,
        F: Fn(T) -> Result<O, E2> + Send + Sync,
    {
        (**self).try_map(items, f)
    }

    fn count<T, P>(&self, items: &[T], pred: P) -> usize
    where
        T: Sync,
        P: Fn(&T) -> bool + Send + Sync,
    {
        (**self).count(items, pred)
    }

    fn group_by<T, K, F>(&self, items: Vec<T>, key: F) -> BTreeMap<K, Vec<T>>
    where
        T: Send,
        K: Ord + Send,
        F: Fn(&T) -> K + Send + Sync,
    {
        (**self).group_by(items, key)
    }

    fn combine<T, A, O, C>(&self, items: &[T], comb: &C) -> O
    where
        T: Clone + Sync,
        A: Send,
        C: CombineFn<T, A, O>,
    {
        (**self).combine(items, comb)
    }
}

/// Engine chosen at configuration time.
pub enum AnyEngine {
    Sequential(SequentialEngine),
    Parallel(ParallelEngine),
}

impl AnyEngine {
    /// Build the engine described by `mode`.
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) if the parallel thread
    /// pool cannot be created.
    pub fn from_mode(mode: &ExecMode) -> Result<Self> {
        Ok(match *mode {
            ExecMode::Sequential => Self::Sequential(SequentialEngine),
            ExecMode::Parallel {
                threads,
                partitions,
            } => Self::Parallel(ParallelEngine::new(threads, partitions)?),
        })
    }

    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel(_))
    }
}

impl Engine for AnyEngine {
    fn name(&self) -> &'static str {
        match self {
            Self::Sequential(e) => e.name(),
            Self::Parallel(e) => e.name(),
        }
    }

    fn filter<T, P>(&self, items: Vec<T>, pred: P) -> Vec<T>
    where
        T: Send,
        P: Fn(&T) -> bool + Send + Sync,
    {
        match self {
            Self::Sequential(e) => e.filter(items, pred),
            Self::Parallel(e) => e.filter(items, pred),
        }
    }

    fn map<T, O, F>(&self, items: Vec<T>, f: F) -> Vec<O>
    where
        T: Send,
        O: Send,
        F: Fn(T) -> O + Send + Sync,
    {
        match self {
            Self::Sequential(e) => e.map(items, f),
            Self::Parallel(e) => e.map(items, f),
        }
    }

    fn try_map<T, O, E, F>(&self, items: Vec<T>, f: F) -> Result<Vec<O>, E>
    where
        T: Send,
        O: Send,
        E: Send,
        F: Fn(T) -> Result<O, E> + Send + Sync,
    {
        match self {
            Self::Sequential(e) => e.try_map(items, f),
            Self::Parallel(e) => e.try_map(items, f),
        }
    }

    fn count<T, P>(&self, items: &[T], pred: P) -> usize
    where
        T: Sync,
        P: Fn(&T) -> bool + Send + Sync,
    {
        match self {
            Self::Sequential(e) => e.count(items, pred),
            Self::Parallel(e) => e.count(items, pred),
        }
    }

    fn group_by<T, K, F>(&self, items: Vec<T>, key: F) -> BTreeMap<K, Vec<T>>
    where
        T: Send,
        K: Ord + Send,
        F: Fn(&T) -> K + Send + Sync,
    {
        match self {
            Self::Sequential(e) => e.group_by(items, key),
            Self::Parallel(e) => e.group_by(items, key),
        }
    }

    fn combine<T, A, O, C>(&self, items: &[T], comb: &C) -> O
    where
        T: Clone + Sync,
        A: Send,
        C: CombineFn<T, A, O>,
    {
        match self {
            Self::Sequential(e) => e.combine(items, comb),
            Self::Parallel(e) => e.combine(items, comb),
        }
    }
}
