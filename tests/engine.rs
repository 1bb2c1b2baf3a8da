use anyhow::Result;
use reelbeam::combiners::{CombineFn, DistinctCount, TopN};
use reelbeam::{AnyEngine, Engine, ExecMode, ParallelEngine, SequentialEngine};

fn engines() -> Result<Vec<AnyEngine>> {
    Ok(vec![
        AnyEngine::from_mode(&ExecMode::Sequential)?,
        AnyEngine::from_mode(&ExecMode::Parallel {
            threads: Some(3),
            partitions: Some(7),
        })?,
    ])
}

#[test]
fn filter_and_map_preserve_input_order() -> Result<()> {
    let input: Vec<u32> = (0..1000).collect();
    for engine in engines()? {
        let evens = engine.filter(input.clone(), |x| x % 2 == 0);
        let doubled = engine.map(evens, |x| x * 2);
        let expected: Vec<u32> = (0..1000).filter(|x| x % 2 == 0).map(|x| x * 2).collect();
        assert_eq!(doubled, expected, "engine {}", engine.name());
    }
    Ok(())
}

#[test]
fn try_map_stops_on_error() -> Result<()> {
    let input: Vec<i32> = (0..100).collect();
    for engine in engines()? {
        let ok: Result<Vec<i32>, String> = engine.try_map(input.clone(), |x| Ok(x + 1));
        assert_eq!(ok.map(|v| v.len()), Ok(100));

        let err: Result<Vec<i32>, String> = engine.try_map(input.clone(), |x| {
            if x == 42 { Err(format!("bad {x}")) } else { Ok(x) }
        });
        assert_eq!(err, Err("bad 42".to_owned()));
    }
    Ok(())
}

#[test]
fn group_by_keeps_order_within_groups() -> Result<()> {
    let input: Vec<(char, u32)> = (0..300).map(|i| (['a', 'b', 'c'][i % 3], i as u32)).collect();
    for engine in engines()? {
        let groups = engine.group_by(input.clone(), |(k, _)| *k);
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!['a', 'b', 'c']);
        for (k, items) in &groups {
            assert_eq!(items.len(), 100);
            assert!(items.iter().all(|(key, _)| key == k));
            assert!(items.windows(2).all(|w| w[0].1 < w[1].1));
        }
    }
    Ok(())
}

#[test]
fn count_matches_iterator_count() -> Result<()> {
    let input: Vec<u64> = (1..=500).collect();
    for engine in engines()? {
        assert_eq!(engine.count(&input, |x| x % 5 == 0), 100);
        assert_eq!(engine.count(&[] as &[u64], |_| true), 0);
    }
    Ok(())
}

#[test]
fn top_n_is_descending_and_bounded() -> Result<()> {
    let input: Vec<i64> = vec![5, 1, 9, 3, 9, 7, -2, 8];
    for engine in engines()? {
        assert_eq!(engine.combine(&input, &TopN::new(3)), vec![9, 9, 8]);
        assert_eq!(engine.combine(&input, &TopN::new(0)), Vec::<i64>::new());
        assert_eq!(engine.combine(&input, &TopN::new(50)).len(), input.len());
    }
    Ok(())
}

#[test]
fn top_n_merge_matches_single_accumulator() {
    let top = TopN::new(4);
    let mut left = top.create();
    let mut right = top.create();
    for v in [10, 2, 33, 4, 5] {
        top.add_input(&mut left, v);
    }
    for v in [6, 70, 8, 1] {
        top.add_input(&mut right, v);
    }
    top.merge(&mut left, right);
    assert_eq!(top.finish(left), vec![70, 33, 10, 8]);
}

#[test]
fn distinct_count_treats_none_as_a_value() -> Result<()> {
    let input = vec![Some("a"), None, Some("b"), Some("a"), None];
    for engine in engines()? {
        assert_eq!(engine.combine(&input, &DistinctCount::new()), 3);
    }
    Ok(())
}

#[test]
fn parallel_engine_rejects_zero_counts() -> Result<()> {
    assert!(ParallelEngine::new(Some(0), None).is_err());
    assert!(ParallelEngine::new(None, Some(0)).is_err());

    let engine = ParallelEngine::new(Some(2), Some(5))?;
    assert_eq!(engine.threads(), 2);
    assert_eq!(engine.partitions(), 5);
    assert_eq!(engine.name(), "parallel");
    assert_eq!(SequentialEngine.name(), "sequential");
    Ok(())
}

#[test]
fn engine_by_reference_forwards() {
    let engine = SequentialEngine;
    let by_ref = &engine;
    assert_eq!(by_ref.map(vec![1, 2, 3], |x| x + 1), vec![2, 3, 4]);
}
