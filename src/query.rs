//! Keyword search over a loaded store.
//!
//! A search is a case-insensitive substring match against `plot`, followed by
//! a top-N selection on `plot_length`. Ranking is fully deterministic:
//! longer plots first, then titles in ascending order (missing titles last),
//! then the record's position in the loaded dataset.

use crate::combiners::TopN;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::io::json::write_json_pretty;
use crate::record::{Dataset, Record};
use crate::store::PartitionedStore;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Genre shown for records without one.
pub const UNKNOWN_GENRE: &str = "unknown";

/// A matched record reduced to its reported fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHit {
    pub title: Option<String>,
    pub plot_length: u32,
    pub decade: Option<i32>,
    pub year: Option<i32>,
    pub genre: String,
}

impl QueryHit {
    fn project(r: &Record) -> Self {
        Self {
            title: r.title.clone(),
            plot_length: r.plot_length,
            decade: r.decade,
            year: r.release_year,
            genre: r
                .genre
                .clone()
                .unwrap_or_else(|| UNKNOWN_GENRE.to_owned()),
        }
    }
}

/// Outcome of one keyword search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub keyword: String,
    /// Matches before truncation to the result limit.
    pub total_matches: usize,
    /// Best matches first.
    pub results: Vec<QueryHit>,
}

impl QueryResult {
    /// `query_<keyword>.json`, with the keyword lowercased and every
    /// character that is not alphanumeric or `_` replaced by `_`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let slug: String = self
            .keyword
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        format!("query_{slug}.json")
    }

    /// Write the result as pretty JSON into `dir` and return the file path.
    ///
    /// # Errors
    /// Returns [`Error::Report`] if the directory or file cannot be written.
    pub fn save_json(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        write_json_pretty(&path, self).map_err(|e| Error::report(&path, e))?;
        Ok(path)
    }

    /// Human-readable listing.
    #[must_use]
    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Keyword: '{}'", self.keyword);
        let _ = writeln!(out, "Total matches: {}", self.total_matches);
        let _ = writeln!(out, "Top {} movies by plot length:", self.results.len());
        let _ = writeln!(out, "{rule}");
        for (i, hit) in self.results.iter().enumerate() {
            let year = hit.year.map_or_else(|| "n/a".to_owned(), |y| y.to_string());
            let decade = hit.decade.map_or_else(|| "n/a".to_owned(), |d| format!("{d}s"));
            let _ = writeln!(out);
            let _ = writeln!(out, "{}. {}", i + 1, hit.title.as_deref().unwrap_or("(untitled)"));
            let _ = writeln!(out, "   Year: {year} | Decade: {decade}");
            let _ = writeln!(out, "   Genre: {}", hit.genre);
            let _ = writeln!(out, "   Plot Length: {} words", hit.plot_length);
        }
        out
    }
}

/// Ranking key; the greatest key is the best match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Rank<'a> {
    plot_length: u32,
    titled: bool,
    title: Reverse<&'a str>,
    position: Reverse<usize>,
}

impl<'a> Rank<'a> {
    fn of(position: usize, r: &'a Record) -> Self {
        Self {
            plot_length: r.plot_length,
            titled: r.title.is_some(),
            title: Reverse(r.title.as_deref().unwrap_or_default()),
            position: Reverse(position),
        }
    }
}

/// Searches one in-memory dataset.
pub struct QueryEngine<E: Engine> {
    dataset: Dataset,
    engine: E,
}

impl<E: Engine> QueryEngine<E> {
    pub fn new(dataset: Dataset, engine: E) -> Self {
        Self { dataset, engine }
    }

    /// Load every partition of `store` and search over the result.
    ///
    /// # Errors
    /// Returns [`Error::StoreRead`] if the store has no partitions or a
    /// partition cannot be read.
    pub fn open(store: &PartitionedStore, engine: E) -> Result<Self> {
        let dataset = store.read(&engine)?;
        info!(rows = dataset.len(), root = %store.root().display(), "query engine ready");
        Ok(Self::new(dataset, engine))
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Top `top_n` records whose plot contains `keyword` (ignoring case).
    /// An empty match set is not an error.
    #[instrument(skip(self), fields(engine = self.engine.name()))]
    pub fn search(&self, keyword: &str, top_n: usize) -> QueryResult {
        let needle = keyword.to_lowercase();
        let candidates: Vec<(usize, &Record)> = self.dataset.records.iter().enumerate().collect();
        let matched = self.engine.filter(candidates, |(_, r)| {
            r.plot
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains(&needle))
        });
        let total_matches = matched.len();
        debug!(total_matches, "plots matched");

        let ranks = self.engine.map(matched, |(i, r)| Rank::of(i, r));
        let best = self.engine.combine(&ranks, &TopN::new(top_n));
        let results = best
            .iter()
            .map(|rank| QueryHit::project(&self.dataset.records[rank.position.0]))
            .collect();

        QueryResult {
            keyword: keyword.to_owned(),
            total_matches,
            results,
        }
    }
}
