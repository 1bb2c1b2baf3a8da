//! Error type shared by every pipeline stage.
//!
//! Ingest and store-read failures abort the current invocation; validation
//! failures are never errors (they live in the
//! [`ValidationReport`](crate::validation::ValidationReport)).

use std::path::{Path, PathBuf};

/// Boxed source error carried by the variants below.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure a pipeline run or a query can surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tabular source is missing, unreadable, or does not match the expected schema.
    /// Raised before any output is written.
    #[error("ingest failed for {path}: {source}")]
    Ingest {
        /// Source file that was being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: BoxError,
    },

    /// A decade partition could not be written. Partitions written earlier in
    /// the same run stay on disk.
    #[error("failed to write partition at {path}: {source}")]
    StoreWrite {
        /// Partition directory or store root.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: BoxError,
    },

    /// The store could not be read back (no partitions, unreadable file, or
    /// partitions with diverging schemas).
    #[error("failed to read store at {path}: {source}")]
    StoreRead {
        /// Store root or the offending partition file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: BoxError,
    },

    /// A side file (validation report, query result) could not be written.
    #[error("failed to write report {path}: {source}")]
    Report {
        /// Target file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: BoxError,
    },

    /// The pipeline configuration is invalid or could not be loaded.
    #[error("invalid configuration: {detail}")]
    Config {
        /// What is wrong with it.
        detail: String,
    },
}

impl Error {
    pub(crate) fn ingest(path: &Path, source: impl Into<BoxError>) -> Self {
        Self::Ingest {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn store_write(path: &Path, source: impl Into<BoxError>) -> Self {
        Self::StoreWrite {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn store_read(path: &Path, source: impl Into<BoxError>) -> Self {
        Self::StoreRead {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn report(path: &Path, source: impl Into<BoxError>) -> Self {
        Self::Report {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// `true` for errors that terminate a run before any output exists.
    #[must_use]
    pub const fn is_ingest(&self) -> bool {
        matches!(self, Self::Ingest { .. })
    }

    /// `true` for failures while writing the partitioned store.
    #[must_use]
    pub const fn is_store_write(&self) -> bool {
        matches!(self, Self::StoreWrite { .. })
    }

    /// `true` for query-time store failures.
    #[must_use]
    pub const fn is_store_read(&self) -> bool {
        matches!(self, Self::StoreRead { .. })
    }
}
