use super::Engine;
use crate::combiners::CombineFn;
use std::collections::BTreeMap;

/// Single-threaded engine (one partition, in-process, in order).
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialEngine;

impl Engine for SequentialEngine {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn filter<T, P>(&self, items: Vec<T>, pred: P) -> Vec<T>
    where
        T: Send,
        P: Fn(&T) -> bool + Send + Sync,
    {
        items.into_iter().filter(|t| pred(t)).collect()
    }

    fn map<T, O, F>(&self, items: Vec<T>, f: F) -> Vec<O>
    where
        T: Send,
        O: Send,
        F: Fn(T) -> O + Send + Sync,
    {
        items.into_iter().map(f).collect()
    }

    fn try_map<T, O, E, F>(&self, items: Vec<T>, f: F) -> Result<Vec<O>, E>
    where
        T: Send,
        O: Send,
        E: Send,
        F: Fn(T) -> Result<O, E> + Send + Sync,
    {
        items.into_iter().map(f).collect()
    }

    fn count<T, P>(&self, items: &[T], pred: P) -> usize
    where
        T: Sync,
        P: Fn(&T) -> bool + Send + Sync,
    {
        items.iter().filter(|t| pred(t)).count()
    }

    fn group_by<T, K, F>(&self, items: Vec<T>, key: F) -> BTreeMap<K, Vec<T>>
    where
        T: Send,
        K: Ord + Send,
        F: Fn(&T) -> K + Send + Sync,
    {
        let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
        for item in items {
            groups.entry(key(&item)).or_default().push(item);
        }
        groups
    }

    fn combine<T, A, O, C>(&self, items: &[T], comb: &C) -> O
    where
        T: Clone + Sync,
        A: Send,
        C: CombineFn<T, A, O>,
    {
        let mut acc = comb.create();
        for v in items {
            comb.add_input(&mut acc, v.clone());
        }
        comb.finish(acc)
    }
}
