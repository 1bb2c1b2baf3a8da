//! Pipeline configuration.
//!
//! [`PipelineConfig`] is plain serde data: it can be built in code, loaded
//! from a JSON file with [`PipelineConfig::from_json_file`], and then
//! overridden field by field (the binary does this with its CLI flags).
//! Every field has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "input": "wiki_movie_plots_deduped.csv", "row_limit": 2000,
//!   "mode": { "kind": "parallel", "threads": 4 } }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which execution engine runs the stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecMode {
    #[default]
    Sequential,
    Parallel {
        #[serde(default)]
        threads: Option<usize>,
        #[serde(default)]
        partitions: Option<usize>,
    },
}

/// How the store treats partitions left over from previous runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Remove every existing decade partition under the root, then write.
    #[default]
    Overwrite,
    /// Replace only the decade partitions present in the dataset being written.
    OverwritePartitions,
}

/// Which set of data-quality checks a run evaluates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationProfile {
    /// Includes the exact `unique_titles` check.
    Exact,
    /// Replaces `unique_titles` with `has_decades`.
    Scaled,
}

/// Everything a [`Session`](crate::Session) needs to run the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tabular source file (CSV, optionally gzip/zstd compressed).
    pub input: PathBuf,
    /// Root for every output: `parquet/`, `validation_results.json`, query results.
    pub output_dir: PathBuf,
    /// Read at most this many data rows from the source.
    pub row_limit: Option<usize>,
    pub mode: ExecMode,
    /// Check set; `None` picks one from `mode`.
    pub validation: Option<ValidationProfile>,
    pub write_mode: WriteMode,
    /// Records with fewer plot words are dropped.
    pub min_plot_words: u32,
    /// Row count below which `min_row_threshold` fails.
    pub min_rows: usize,
    /// Default result limit for queries.
    pub top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("wiki_movie_plots_deduped.csv"),
            output_dir: PathBuf::from("output"),
            row_limit: None,
            mode: ExecMode::Sequential,
            validation: None,
            write_mode: WriteMode::Overwrite,
            min_plot_words: 50,
            min_rows: 150,
            top_n: 5,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the file cannot be read or parsed, or if
    /// the loaded values fail [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("read {}: {e}", path.display())))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| Error::config(format!("parse {}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values no run could succeed with.
    ///
    /// # Errors
    /// Returns [`Error::Config`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.min_plot_words == 0 {
            return Err(Error::config("min_plot_words must be at least 1"));
        }
        if self.top_n == 0 {
            return Err(Error::config("top_n must be at least 1"));
        }
        if self.row_limit == Some(0) {
            return Err(Error::config("row_limit must be at least 1 when set"));
        }
        if let ExecMode::Parallel {
            threads,
            partitions,
        } = self.mode
            && (threads == Some(0) || partitions == Some(0))
        {
            return Err(Error::config(
                "parallel threads and partitions must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// Check set for this run: the explicit profile, or `Exact` for the
    /// sequential engine and `Scaled` for the parallel one.
    #[must_use]
    pub fn validation_profile(&self) -> ValidationProfile {
        self.validation.unwrap_or(match self.mode {
            ExecMode::Sequential => ValidationProfile::Exact,
            ExecMode::Parallel { .. } => ValidationProfile::Scaled,
        })
    }

    /// Root of the decade-partitioned store.
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        self.output_dir.join("parquet")
    }

    /// Where the validation report of a run is written.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("validation_results.json")
    }
}
