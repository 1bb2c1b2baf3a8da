//! Validation stage: named data-quality checks over a cleaned dataset.
//!
//! Validation never fails a run. Each [`Check`] evaluates to a boolean that is
//! recorded in a [`ValidationReport`] together with a human-readable
//! description; the caller decides what to do with a failed report (the
//! [`Session`](crate::Session) logs a warning and stores the data anyway).

use crate::combiners::DistinctCount;
use crate::config::ValidationProfile;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::io::json::write_json_pretty;
use crate::record::Dataset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument};

/// One named data-quality predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Check {
    /// Every record has a title.
    NoNullTitle,
    /// Every record has a plot.
    NoNullPlot,
    /// Every `plot_length` is positive.
    PlotLengthPositive,
    /// No two records share a title. Two missing titles count as a duplicate.
    UniqueTitles,
    /// At least this many records.
    MinRowThreshold(usize),
    /// At least one record has a decade.
    HasDecades,
}

impl Check {
    /// Key of the check in the report.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NoNullTitle => "no_null_title",
            Self::NoNullPlot => "no_null_plot",
            Self::PlotLengthPositive => "plot_length_positive",
            Self::UniqueTitles => "unique_titles",
            Self::MinRowThreshold(_) => "min_row_threshold",
            Self::HasDecades => "has_decades",
        }
    }

    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::NoNullTitle => "All titles are non-null".to_owned(),
            Self::NoNullPlot => "All plots are non-null".to_owned(),
            Self::PlotLengthPositive => "All plot lengths are greater than 0".to_owned(),
            Self::UniqueTitles => "All titles are unique".to_owned(),
            Self::MinRowThreshold(n) => format!("At least {n} rows remain after filtering"),
            Self::HasDecades => "At least one record has a decade".to_owned(),
        }
    }

    /// Evaluate the predicate over the whole dataset.
    pub fn evaluate<E: Engine>(&self, engine: &E, ds: &Dataset) -> bool {
        let records = &ds.records;
        match *self {
            Self::NoNullTitle => engine.count(records, |r| r.title.is_none()) == 0,
            Self::NoNullPlot => engine.count(records, |r| r.plot.is_none()) == 0,
            Self::PlotLengthPositive => engine.count(records, |r| r.plot_length == 0) == 0,
            Self::UniqueTitles => {
                let titles: Vec<Option<&str>> =
                    records.iter().map(|r| r.title.as_deref()).collect();
                let distinct = engine.combine(&titles, &DistinctCount::<Option<&str>>::new());
                distinct == titles.len() as u64
            }
            Self::MinRowThreshold(n) => records.len() >= n,
            Self::HasDecades => engine.count(records, |r| r.decade.is_some()) > 0,
        }
    }
}

/// The check set of a profile, in report order.
#[must_use]
pub fn checks_for(profile: ValidationProfile, min_rows: usize) -> Vec<Check> {
    let distinctness = match profile {
        ValidationProfile::Exact => Check::UniqueTitles,
        ValidationProfile::Scaled => Check::HasDecades,
    };
    vec![
        Check::NoNullTitle,
        Check::NoNullPlot,
        Check::PlotLengthPositive,
        distinctness,
        Check::MinRowThreshold(min_rows),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub description: String,
}

/// Snapshot of one validation run. Serializes to the report file format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub timestamp: DateTime<Utc>,
    pub total_rows: usize,
    pub checks: BTreeMap<String, CheckOutcome>,
    pub all_passed: bool,
}

impl ValidationReport {
    /// Outcome of a check by name.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.get(name)
    }

    /// Names of the checks that did not pass.
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, o)| !o.passed)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Persist the report as pretty JSON, creating parent directories.
    ///
    /// # Errors
    /// Returns [`Error::Report`] if the file cannot be written.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_json_pretty(path, self).map_err(|e| Error::report(path, e))
    }

    /// Load a report written by [`write_json`](Self::write_json).
    ///
    /// # Errors
    /// Returns [`Error::Report`] if the file cannot be read or parsed.
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::report(path, e))?;
        serde_json::from_str(&text).map_err(|e| Error::report(path, e))
    }
}

/// Evaluate `checks` over `ds`. `all_passed` is the AND of every outcome
/// (vacuously true for an empty check list).
#[instrument(skip_all, fields(engine = engine.name(), rows = ds.len()))]
pub fn validate<E: Engine>(engine: &E, ds: &Dataset, checks: &[Check]) -> ValidationReport {
    let checks: BTreeMap<String, CheckOutcome> = checks
        .iter()
        .map(|c| {
            let passed = c.evaluate(engine, ds);
            debug!(check = c.name(), passed, "check evaluated");
            (
                c.name().to_owned(),
                CheckOutcome {
                    passed,
                    description: c.description(),
                },
            )
        })
        .collect();
    let all_passed = checks.values().all(|o| o.passed);
    ValidationReport {
        timestamp: Utc::now(),
        total_rows: ds.len(),
        checks,
        all_passed,
    }
}
