use anyhow::Result;
use reelbeam::record::{Dataset, Schema};
use reelbeam::testing::{RecordBuilder, plot_of};
use reelbeam::validation::{Check, ValidationReport, checks_for, validate};
use reelbeam::{AnyEngine, ExecMode, SequentialEngine, ValidationProfile};

fn dataset(n: usize) -> Dataset {
    let records = (0..n)
        .map(|i| {
            RecordBuilder::new(&format!("Movie {i}"))
                .plot(plot_of(60))
                .year(1950 + i32::try_from(i % 60).unwrap_or(0))
                .build()
        })
        .collect();
    Dataset::new(Schema::default(), records)
}

#[test]
fn below_threshold_fails_only_min_rows() {
    let ds = dataset(100);
    let report = validate(
        &SequentialEngine,
        &ds,
        &checks_for(ValidationProfile::Exact, 150),
    );
    assert_eq!(report.total_rows, 100);
    assert!(!report.all_passed);
    assert_eq!(report.failed_checks(), vec!["min_row_threshold"]);
    let min_rows = report.check("min_row_threshold").expect("check present");
    assert!(!min_rows.passed);
    assert_eq!(min_rows.description, "At least 150 rows remain after filtering");
}

#[test]
fn clean_dataset_passes_every_check() {
    let report = validate(
        &SequentialEngine,
        &dataset(150),
        &checks_for(ValidationProfile::Exact, 150),
    );
    assert!(report.all_passed, "{:?}", report.failed_checks());
    let names: Vec<&str> = report.checks.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "min_row_threshold",
            "no_null_plot",
            "no_null_title",
            "plot_length_positive",
            "unique_titles",
        ]
    );
}

#[test]
fn duplicate_and_missing_titles_are_caught() {
    let mut ds = dataset(3);
    ds.records.push(RecordBuilder::new("Movie 1").plot(plot_of(60)).build());
    ds.records.push(RecordBuilder::untitled().plot(plot_of(60)).build());
    let checks = [Check::UniqueTitles, Check::NoNullTitle];
    let report = validate(&SequentialEngine, &ds, &checks);
    assert!(!report.check("unique_titles").expect("present").passed);
    assert!(!report.check("no_null_title").expect("present").passed);

    // Two missing titles are duplicates of each other.
    let untitled = Dataset::new(
        Schema::default(),
        vec![
            RecordBuilder::untitled().plot("a").build(),
            RecordBuilder::untitled().plot("b").build(),
        ],
    );
    assert!(!Check::UniqueTitles.evaluate(&SequentialEngine, &untitled));
}

#[test]
fn plot_checks() {
    let mut ds = dataset(2);
    ds.records[0].plot = None;
    ds.records[1].plot_length = 0;
    assert!(!Check::NoNullPlot.evaluate(&SequentialEngine, &ds));
    assert!(!Check::PlotLengthPositive.evaluate(&SequentialEngine, &ds));
}

#[test]
fn scaled_profile_swaps_uniqueness_for_decades() -> Result<()> {
    let checks = checks_for(ValidationProfile::Scaled, 10);
    assert!(checks.contains(&Check::HasDecades));
    assert!(!checks.contains(&Check::UniqueTitles));

    let mut ds = dataset(20);
    ds.records.push(ds.records[0].clone());
    let engine = AnyEngine::from_mode(&ExecMode::Parallel {
        threads: Some(2),
        partitions: None,
    })?;
    assert!(validate(&engine, &ds, &checks).all_passed);

    for r in &mut ds.records {
        r.decade = None;
    }
    let report = validate(&engine, &ds, &checks);
    assert_eq!(report.failed_checks(), vec!["has_decades"]);
    Ok(())
}

#[test]
fn engines_produce_the_same_outcomes() -> Result<()> {
    let mut ds = dataset(140);
    ds.records[5].title = None;
    ds.records.push(ds.records[9].clone());
    let checks = checks_for(ValidationProfile::Exact, 150);
    let parallel = AnyEngine::from_mode(&ExecMode::Parallel {
        threads: Some(4),
        partitions: Some(16),
    })?;
    let seq = validate(&SequentialEngine, &ds, &checks);
    let par = validate(&parallel, &ds, &checks);
    assert_eq!(seq.checks, par.checks);
    assert_eq!(seq.all_passed, par.all_passed);
    Ok(())
}

#[test]
fn empty_dataset_never_errors() {
    let report = validate(
        &SequentialEngine,
        &Dataset::default(),
        &checks_for(ValidationProfile::Exact, 150),
    );
    assert!(!report.all_passed);
    assert_eq!(report.failed_checks(), vec!["min_row_threshold"]);
    assert!(validate(&SequentialEngine, &Dataset::default(), &[]).all_passed);
}

#[test]
fn report_file_format() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("nested").join("validation_results.json");
    let report = validate(
        &SequentialEngine,
        &dataset(3),
        &checks_for(ValidationProfile::Exact, 150),
    );
    report.write_json(&path)?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(json["total_rows"], 3);
    assert_eq!(json["all_passed"], false);
    assert_eq!(json["checks"]["no_null_title"]["passed"], true);
    assert_eq!(
        json["checks"]["no_null_title"]["description"],
        "All titles are non-null"
    );
    let ts = json["timestamp"].as_str().expect("timestamp is a string");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");

    assert_eq!(ValidationReport::read_json(&path)?, report);
    Ok(())
}
