//! # Reelbeam
//!
//! A small extract-transform-load-query pipeline over a flat file of movie
//! records (the Wikipedia movie-plots dump and anything shaped like it).
//!
//! ```text
//! CSV ──► transform ──► validate (report) ──► decade-partitioned Parquet ──► keyword query
//! ```
//!
//! ## Stages
//!
//! - [`transform`]: load rows, normalize headers, drop missing/blank or short
//!   plots, derive `plot_length`, `title_clean` and `decade`.
//! - [`validation`]: named data-quality checks collected into a
//!   [`ValidationReport`]. A failed check never stops a run.
//! - [`store`]: one Parquet file per decade under `decade=<value>/`, and the
//!   reader that puts them back together.
//! - [`query`]: case-insensitive keyword match on plots, top-N by plot length.
//!
//! Every stage is written against the [`Engine`] trait, so the same code runs
//! on the calling thread ([`SequentialEngine`]) or on a private Rayon pool
//! ([`ParallelEngine`]). A [`Session`] owns the [`PipelineConfig`] and the
//! engine it selects.
//!
//! ## Quick start
//!
//! ```no_run
//! use reelbeam::{ExecMode, PipelineConfig, Session};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = PipelineConfig {
//!     input: "wiki_movie_plots_deduped.csv".into(),
//!     row_limit: Some(500),
//!     mode: ExecMode::Parallel { threads: Some(4), partitions: None },
//!     ..PipelineConfig::default()
//! };
//! let session = Session::new(config)?;
//! let summary = session.run()?;
//! assert!(summary.report.total_rows <= 500);
//!
//! let result = session.query_engine()?.search("space", 5);
//! println!("{}", result.render());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `compression-gzip` (default): read `.gz` sources
//! - `compression-zstd` (default): read `.zst` sources

pub mod combiners;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod query;
pub mod record;
pub mod session;
pub mod store;
pub mod testing;
pub mod transform;
pub mod validation;

pub use config::{ExecMode, PipelineConfig, ValidationProfile, WriteMode};
pub use engine::{AnyEngine, Engine, ParallelEngine, SequentialEngine};
pub use error::{Error, Result};
pub use query::{QueryEngine, QueryHit, QueryResult};
pub use record::{Dataset, Record, Schema};
pub use session::{RunSummary, Session};
pub use store::{PartitionSummary, PartitionedStore};
pub use transform::{TransformOptions, TransformOutput};
pub use validation::{Check, CheckOutcome, ValidationReport};
