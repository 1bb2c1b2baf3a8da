use anyhow::Result;
use reelbeam::io::parquet::{read_partition_file, write_records};
use reelbeam::record::{Dataset, Record, Schema};
use reelbeam::store::{DATA_FILE, HIVE_NULL_PARTITION, parse_partition_dir, partition_dir_name};
use reelbeam::testing::{RecordBuilder, assert_same_dataset, plot_of};
use reelbeam::{AnyEngine, ExecMode, PartitionedStore, SequentialEngine, WriteMode};
use std::fs::File;

fn sample() -> Dataset {
    let schema = Schema::new(vec!["director".to_owned(), "wiki_page".to_owned()]);
    let records = vec![
        RecordBuilder::new("Metropolis")
            .plot(plot_of(120))
            .year(1927)
            .genre("science fiction")
            .extra(&[Some("Fritz Lang"), None])
            .build(),
        RecordBuilder::new("Sunrise")
            .plot(plot_of(80))
            .year(1927)
            .extra(&[Some("F. W. Murnau"), Some("https://en.wikipedia.org/wiki/Sunrise")])
            .build(),
        RecordBuilder::new("Alien")
            .plot(plot_of(95))
            .year(1979)
            .genre("horror")
            .extra(&[None, None])
            .build(),
        RecordBuilder::new("Undated")
            .plot(plot_of(70))
            .extra(&[Some("Anonymous"), None])
            .build(),
    ];
    Dataset::new(schema, records)
}

fn dir_names(store: &PartitionedStore) -> Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(store.root())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    Ok(names)
}

#[test]
fn partition_dir_names_round_trip() {
    assert_eq!(partition_dir_name(Some(1990)), "decade=1990");
    assert_eq!(partition_dir_name(Some(-10)), "decade=-10");
    assert_eq!(
        partition_dir_name(None),
        format!("decade={HIVE_NULL_PARTITION}")
    );
    for d in [Some(1920), Some(-10), None] {
        assert_eq!(parse_partition_dir(&partition_dir_name(d)), Some(d));
    }
    assert_eq!(parse_partition_dir("year=1990"), None);
    assert_eq!(parse_partition_dir("decade=abc"), None);
}

#[test]
fn write_then_read_round_trips() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = PartitionedStore::new(tmp.path().join("parquet"));
    let ds = sample();

    let written = store.write(&SequentialEngine, &ds, WriteMode::Overwrite)?;
    let summary: Vec<(Option<i32>, usize)> = written.iter().map(|p| (p.decade, p.rows)).collect();
    assert_eq!(summary, vec![(None, 1), (Some(1920), 2), (Some(1970), 1)]);
    assert!(written.iter().all(|p| p.path.ends_with(DATA_FILE) && p.path.is_file()));
    assert_eq!(
        dir_names(&store)?,
        vec![
            "decade=1920".to_owned(),
            "decade=1970".to_owned(),
            format!("decade={HIVE_NULL_PARTITION}"),
        ]
    );

    let back = store.read(&SequentialEngine)?;
    assert_same_dataset(&back, &ds);
    Ok(())
}

#[test]
fn overwrite_is_idempotent() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = PartitionedStore::new(tmp.path());
    let ds = sample();

    store.write(&SequentialEngine, &ds, WriteMode::Overwrite)?;
    let once = store.read(&SequentialEngine)?;
    store.write(&SequentialEngine, &ds, WriteMode::Overwrite)?;
    let twice = store.read(&SequentialEngine)?;
    assert_same_dataset(&twice, &once);
    assert_eq!(store.partitions()?.len(), 3);
    Ok(())
}

#[test]
fn write_modes_differ_on_stale_partitions() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = PartitionedStore::new(tmp.path());
    let ds = sample();
    store.write(&SequentialEngine, &ds, WriteMode::Overwrite)?;

    let only_1970 = Dataset::new(
        ds.schema.clone(),
        ds.records
            .iter()
            .filter(|r| r.decade == Some(1970))
            .cloned()
            .collect(),
    );

    store.write(&SequentialEngine, &only_1970, WriteMode::OverwritePartitions)?;
    assert_eq!(store.read(&SequentialEngine)?.len(), ds.len());

    store.write(&SequentialEngine, &only_1970, WriteMode::Overwrite)?;
    assert_same_dataset(&store.read(&SequentialEngine)?, &only_1970);
    Ok(())
}

#[test]
fn parallel_write_matches_sequential() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let seq_store = PartitionedStore::new(tmp.path().join("seq"));
    let par_store = PartitionedStore::new(tmp.path().join("par"));
    let parallel = AnyEngine::from_mode(&ExecMode::Parallel {
        threads: Some(4),
        partitions: None,
    })?;

    let records: Vec<Record> = (0..300)
        .map(|i| {
            RecordBuilder::new(&format!("Movie {i}"))
                .plot(plot_of(50 + i % 40))
                .year(1900 + i32::try_from(i).unwrap_or(0) / 3)
                .build()
        })
        .collect();
    let ds = Dataset::new(Schema::default(), records);

    let a = seq_store.write(&SequentialEngine, &ds, WriteMode::Overwrite)?;
    let b = par_store.write(&parallel, &ds, WriteMode::Overwrite)?;
    assert_eq!(a.len(), 10);
    assert_eq!(
        a.iter().map(|p| (p.decade, p.rows)).collect::<Vec<_>>(),
        b.iter().map(|p| (p.decade, p.rows)).collect::<Vec<_>>()
    );
    assert_same_dataset(&par_store.read(&parallel)?, &seq_store.read(&SequentialEngine)?);
    Ok(())
}

#[test]
fn empty_or_missing_store_is_a_read_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;

    let missing = PartitionedStore::new(tmp.path().join("does-not-exist"));
    let err = missing.read(&SequentialEngine).unwrap_err();
    assert!(err.is_store_read(), "{err}");
    assert!(err.to_string().contains("no decade=* partitions"), "{err}");

    std::fs::create_dir_all(tmp.path().join("empty").join("decade=1990"))?;
    let empty = PartitionedStore::new(tmp.path().join("empty"));
    assert!(empty.read(&SequentialEngine).unwrap_err().is_store_read());
    Ok(())
}

#[test]
fn unwritable_root_is_a_write_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("file_not_dir");
    std::fs::write(&root, b"occupied")?;

    let err = PartitionedStore::new(&root)
        .write(&SequentialEngine, &sample(), WriteMode::Overwrite)
        .unwrap_err();
    assert!(err.is_store_write(), "{err}");
    assert!(err.to_string().contains("file_not_dir"), "{err}");
    Ok(())
}

#[test]
fn failed_partition_keeps_earlier_ones() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = PartitionedStore::new(tmp.path());
    // Partitions are written in key order: null, 1920, then 1970.
    let blocked = tmp.path().join(partition_dir_name(Some(1970)));
    std::fs::write(&blocked, b"not a directory")?;

    let err = store
        .write(&SequentialEngine, &sample(), WriteMode::OverwritePartitions)
        .unwrap_err();
    assert!(err.is_store_write(), "{err}");
    assert!(tmp.path().join(partition_dir_name(None)).join(DATA_FILE).is_file());
    assert!(tmp.path().join(partition_dir_name(Some(1920))).join(DATA_FILE).is_file());
    assert!(blocked.is_file());
    Ok(())
}

#[test]
fn rewrite_replaces_data_file_in_place() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = PartitionedStore::new(tmp.path());
    let ds = sample();
    store.write(&SequentialEngine, &ds, WriteMode::Overwrite)?;

    let dir = tmp.path().join(partition_dir_name(Some(1920)));
    let leftover = RecordBuilder::new("Leftover")
        .plot(plot_of(60))
        .year(1925)
        .extra(&[None, None])
        .build();
    write_records(
        File::create(dir.join("part-00000.parquet"))?,
        &ds.schema,
        &[&leftover],
    )?;
    std::fs::write(dir.join("_SUCCESS"), b"")?;

    store.write(&SequentialEngine, &ds, WriteMode::OverwritePartitions)?;
    let mut left: Vec<String> = std::fs::read_dir(&dir)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    left.sort();
    assert_eq!(left, vec!["_SUCCESS".to_owned(), DATA_FILE.to_owned()]);
    assert_same_dataset(&store.read(&SequentialEngine)?, &ds);
    Ok(())
}

#[test]
fn corrupt_partition_is_a_read_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path().join("decade=1990");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(DATA_FILE), b"not parquet at all")?;

    let err = PartitionedStore::new(tmp.path())
        .read(&SequentialEngine)
        .unwrap_err();
    assert!(err.is_store_read(), "{err}");
    Ok(())
}

#[test]
fn diverging_passthrough_columns_are_rejected() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = PartitionedStore::new(tmp.path());
    store.write(&SequentialEngine, &sample(), WriteMode::Overwrite)?;

    let other_schema = Schema::new(vec!["studio".to_owned()]);
    let odd = RecordBuilder::new("Odd")
        .plot(plot_of(60))
        .year(2005)
        .extra(&[Some("Pixar")])
        .build();
    let dir = tmp.path().join(partition_dir_name(Some(2000)));
    std::fs::create_dir_all(&dir)?;
    write_records(File::create(dir.join(DATA_FILE))?, &other_schema, &[&odd])?;

    assert!(store.read(&SequentialEngine).unwrap_err().is_store_read());
    Ok(())
}

#[test]
fn partition_file_keeps_nulls_and_columns() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let ds = sample();
    let path = tmp.path().join("all.parquet");
    let refs: Vec<&Record> = ds.records.iter().collect();
    assert_eq!(write_records(File::create(&path)?, &ds.schema, &refs)?, 4);

    let data = read_partition_file(&path, Some(1234))?;
    assert_eq!(data.passthrough, ds.schema.passthrough);
    assert_eq!(data.records, ds.records);
    Ok(())
}
