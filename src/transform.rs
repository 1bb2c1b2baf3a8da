//! Transform stage: load the tabular source, then clean and enrich it.
//!
//! Steps run in a fixed order, each a whole-dataset pass through the engine:
//! 1. load rows (optionally capped) and normalize the header,
//! 2. drop rows whose plot is missing or blank,
//! 3. derive `plot_length` and `title_clean`,
//! 4. drop rows with fewer than `min_plot_words` plot words,
//! 5. derive `decade` from `release_year`.
//!
//! The stage either returns the complete cleaned [`Dataset`] or fails with
//! [`Error::Ingest`]; nothing is written to disk here.

use crate::config::PipelineConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::io::csv::{RawRow, read_table};
use crate::record::{
    self, Dataset, GENRE, KNOWN_COLUMNS, PLOT, REQUIRED_COLUMNS, RELEASE_YEAR, Record, Schema,
    TITLE,
};
use anyhow::{anyhow, bail};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Knobs of the transform stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransformOptions {
    /// Read at most this many data rows.
    pub row_limit: Option<usize>,
    /// Minimum plot word count a record needs to be kept.
    pub min_plot_words: u32,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            row_limit: None,
            min_plot_words: 50,
        }
    }
}

impl From<&PipelineConfig> for TransformOptions {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            row_limit: cfg.row_limit,
            min_plot_words: cfg.min_plot_words,
        }
    }
}

/// Cleaned dataset plus how many source rows went into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformOutput {
    pub dataset: Dataset,
    pub rows_ingested: usize,
}

/// Run the whole stage: [`ingest`] followed by [`clean`].
///
/// # Errors
/// Returns [`Error::Ingest`] if the source is missing, unreadable, lacks a
/// required column, or holds a malformed row.
#[instrument(skip_all, fields(engine = engine.name(), path = %path.display()))]
pub fn transform<E: Engine>(
    engine: &E,
    path: &Path,
    opts: &TransformOptions,
) -> Result<TransformOutput> {
    let raw = ingest(engine, path, opts.row_limit)?;
    let rows_ingested = raw.len();
    let dataset = clean(engine, raw, opts.min_plot_words);
    info!(
        rows_ingested,
        rows_kept = dataset.len(),
        passthrough = dataset.schema.passthrough.len(),
        "transform complete"
    );
    Ok(TransformOutput {
        dataset,
        rows_ingested,
    })
}

/// Load the source into records with only the source columns populated
/// (derived fields are left at their defaults).
///
/// Header names are normalized first. Columns named like a derived field are
/// ignored; [`clean`] recomputes them.
///
/// # Errors
/// Returns [`Error::Ingest`] (see [`transform`]).
pub fn ingest<E: Engine>(engine: &E, path: &Path, row_limit: Option<usize>) -> Result<Dataset> {
    let table = read_table(path, row_limit).map_err(|e| Error::ingest(path, e))?;
    let layout = ColumnLayout::resolve(&table.headers).map_err(|e| Error::ingest(path, e))?;
    debug!(rows = table.rows.len(), columns = table.headers.len(), "source loaded");
    let records = engine
        .try_map(table.rows, |row| layout.parse_row(row))
        .map_err(|e| Error::ingest(path, e))?;
    Ok(Dataset::new(layout.schema(), records))
}

/// Apply the cleaning and enrichment steps to ingested records.
#[instrument(skip_all, fields(engine = engine.name(), rows = dataset.len()))]
pub fn clean<E: Engine>(engine: &E, dataset: Dataset, min_plot_words: u32) -> Dataset {
    let Dataset { schema, records } = dataset;

    let records = engine.filter(records, |r| {
        r.plot.as_deref().is_some_and(|p| !p.trim().is_empty())
    });
    debug!(rows = records.len(), "dropped missing or blank plots");

    let records = engine.map(records, |mut r| {
        r.plot_length = r.plot.as_deref().map_or(0, record::plot_length);
        r.title_clean = r.title.as_deref().map(record::clean_title);
        r
    });

    let records = engine.filter(records, |r| r.plot_length >= min_plot_words);
    debug!(rows = records.len(), min_plot_words, "dropped short plots");

    let records = engine.map(records, |mut r| {
        r.decade = r.release_year.map(record::decade_of);
        r
    });

    Dataset::new(schema, records)
}

/// Where each [`Record`] field lives in the source rows.
#[derive(Debug)]
struct ColumnLayout {
    title: usize,
    plot: usize,
    release_year: usize,
    genre: Option<usize>,
    passthrough: Vec<(String, usize)>,
}

impl ColumnLayout {
    fn resolve(headers: &[String]) -> anyhow::Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| record::normalize_column_name(h))
            .collect();

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                bail!("duplicate column {name:?} after header normalization");
            }
        }
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|c| !names.iter().any(|n| n == *c))
        {
            bail!("missing required column {missing:?} (found {names:?})");
        }

        let position = |col: &str| names.iter().position(|n| n == col);
        let passthrough = names
            .iter()
            .enumerate()
            .filter(|(_, n)| !KNOWN_COLUMNS.contains(&n.as_str()))
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Ok(Self {
            title: position(TITLE).ok_or_else(|| anyhow!("missing column {TITLE}"))?,
            plot: position(PLOT).ok_or_else(|| anyhow!("missing column {PLOT}"))?,
            release_year: position(RELEASE_YEAR)
                .ok_or_else(|| anyhow!("missing column {RELEASE_YEAR}"))?,
            genre: position(GENRE),
            passthrough,
        })
    }

    fn schema(&self) -> Schema {
        Schema::new(self.passthrough.iter().map(|(n, _)| n.clone()).collect())
    }

    fn parse_row(&self, row: RawRow) -> anyhow::Result<Record> {
        let RawRow { line, mut fields } = row;
        let mut take = |i: usize| fields.get_mut(i).and_then(Option::take);

        let release_year = take(self.release_year)
            .map(|raw| parse_year(&raw).map_err(|e| anyhow!("line {line}: {e}")))
            .transpose()?
            .flatten();
        Ok(Record {
            title: take(self.title),
            plot: take(self.plot),
            release_year,
            genre: self.genre.and_then(&mut take),
            extra: self.passthrough.iter().map(|(_, i)| take(*i)).collect(),
            ..Record::default()
        })
    }
}

/// Release years outside this range are rejected at ingest.
const YEAR_RANGE: RangeInclusive<i32> = -9999..=9999;

/// Parse a release year. Blank is null; integral floats such as `1994.0`
/// are accepted. Values outside [`YEAR_RANGE`] are errors.
#[allow(clippy::cast_possible_truncation)]
fn parse_year(raw: &str) -> anyhow::Result<Option<i32>> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let year = match s.parse::<i32>() {
        Ok(y) => y,
        Err(_) => match s.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) => {
                f as i32
            }
            _ => bail!("invalid release_year {raw:?}"),
        },
    };
    if !YEAR_RANGE.contains(&year) {
        bail!(
            "release_year {year} outside {}..={}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        );
    }
    Ok(Some(year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lenient_years() -> anyhow::Result<()> {
        assert_eq!(parse_year("1994")?, Some(1994));
        assert_eq!(parse_year(" 1994.0 ")?, Some(1994));
        assert_eq!(parse_year("  ")?, None);
        assert!(parse_year("1994.5").is_err());
        assert!(parse_year("nineteen").is_err());
        assert!(parse_year("NaN").is_err());
        assert!(parse_year("-2147483648").is_err());
        assert!(parse_year("10000.0").is_err());
        assert_eq!(parse_year("-9999")?, Some(-9999));
        Ok(())
    }

    #[test]
    fn layout_requires_core_columns() {
        let headers = vec!["Title".to_owned(), "Plot".to_owned()];
        let err = ColumnLayout::resolve(&headers).unwrap_err();
        assert!(err.to_string().contains("release_year"));
    }

    #[test]
    fn layout_rejects_normalization_collisions() {
        let headers: Vec<String> = ["Title", "Plot", "Release Year", "release-year"]
            .map(String::from)
            .to_vec();
        assert!(ColumnLayout::resolve(&headers).is_err());
    }
}
