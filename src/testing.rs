//! Test helpers for pipeline code.
//!
//! - [`plot_of`] / [`plot_with`]: plots with an exact word count
//! - [`RecordBuilder`]: records with their derived fields already computed
//! - [`MovieCsv`]: source files in the layout of the Wikipedia movie-plots dump
//! - [`assert_same_dataset`]: order-independent dataset comparison
//!
//! ```
//! use reelbeam::testing::{RecordBuilder, plot_with};
//!
//! let r = RecordBuilder::new("Heat").plot(plot_with("heist", 60)).year(1995).build();
//! assert_eq!(r.plot_length, 60);
//! assert_eq!(r.decade, Some(1990));
//! ```

use crate::record::{self, Dataset, Record};
use anyhow::{Context, Result};
use std::path::Path;

/// `n` filler words separated by single spaces.
#[must_use]
pub fn plot_of(n: usize) -> String {
    (0..n)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A plot of exactly `n` words (`n >= 1`) whose first word is `keyword`.
#[must_use]
pub fn plot_with(keyword: &str, n: usize) -> String {
    let rest = plot_of(n.saturating_sub(1));
    if rest.is_empty() {
        keyword.to_owned()
    } else {
        format!("{keyword} {rest}")
    }
}

/// Builds a [`Record`] as the transform stage would produce it.
#[derive(Clone, Debug, Default)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self::default().title(title)
    }

    /// A record without a title.
    #[must_use]
    pub fn untitled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.record.title = Some(title.to_owned());
        self
    }

    #[must_use]
    pub fn plot(mut self, plot: impl Into<String>) -> Self {
        self.record.plot = Some(plot.into());
        self
    }

    #[must_use]
    pub fn year(mut self, year: i32) -> Self {
        self.record.release_year = Some(year);
        self
    }

    #[must_use]
    pub fn genre(mut self, genre: &str) -> Self {
        self.record.genre = Some(genre.to_owned());
        self
    }

    /// Passthrough values, positional against the dataset schema.
    #[must_use]
    pub fn extra(mut self, values: &[Option<&str>]) -> Self {
        self.record.extra = values.iter().map(|v| v.map(str::to_owned)).collect();
        self
    }

    /// Fill in `plot_length`, `title_clean` and `decade`.
    #[must_use]
    pub fn build(self) -> Record {
        let mut r = self.record;
        r.plot_length = r.plot.as_deref().map_or(0, record::plot_length);
        r.title_clean = r.title.as_deref().map(record::clean_title);
        r.decade = r.release_year.map(record::decade_of);
        r
    }
}

/// Header of the Wikipedia movie-plots dump, in file order.
pub const MOVIE_HEADER: [&str; 8] = [
    "Release Year",
    "Title",
    "Origin/Ethnicity",
    "Director",
    "Cast",
    "Genre",
    "Wiki Page",
    "Plot",
];

/// Writer for CSV source fixtures.
#[derive(Clone, Debug)]
pub struct MovieCsv {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Default for MovieCsv {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieCsv {
    /// Empty fixture with [`MOVIE_HEADER`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_header(&MOVIE_HEADER)
    }

    /// Empty fixture with a custom header.
    #[must_use]
    pub fn with_header(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| (*h).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row in [`MOVIE_HEADER`] layout. An empty `year` is written as
    /// an empty field.
    #[must_use]
    pub fn movie(self, title: &str, year: &str, genre: &str, plot: &str) -> Self {
        let slug = record::clean_title(title);
        self.row(&[
            year,
            title,
            "American",
            "Unknown",
            "",
            genre,
            &format!("https://en.wikipedia.org/wiki/{slug}"),
            plot,
        ])
    }

    /// Append a row verbatim.
    #[must_use]
    pub fn row(mut self, fields: &[&str]) -> Self {
        self.rows.push(fields.iter().map(|f| (*f).to_owned()).collect());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the fixture. Rows are not checked against the header width.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut w = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("create {}", path.display()))?;
        w.write_record(&self.header)?;
        for row in &self.rows {
            w.write_record(row)?;
        }
        w.flush()?;
        Ok(())
    }
}

/// Assert two datasets hold the same schema and the same multiset of records.
///
/// # Panics
/// Panics with both sides printed on mismatch.
pub fn assert_same_dataset(actual: &Dataset, expected: &Dataset) {
    assert_eq!(
        actual.schema, expected.schema,
        "Schema mismatch:\n  Expected: {:?}\n  Actual: {:?}",
        expected.schema, actual.schema
    );
    assert_eq!(
        actual.len(),
        expected.len(),
        "Dataset length mismatch:\n  Expected length: {}\n  Actual length: {}",
        expected.len(),
        actual.len()
    );
    let (a, e) = (actual.sorted_records(), expected.sorted_records());
    if a != e {
        let missing: Vec<_> = e.iter().filter(|r| !a.contains(r)).collect();
        let extra: Vec<_> = a.iter().filter(|r| !e.contains(r)).collect();
        panic!("Dataset content mismatch:\n  Missing records: {missing:?}\n  Extra records: {extra:?}");
    }
}
