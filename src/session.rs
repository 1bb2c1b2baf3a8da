//! End-to-end orchestration of one configured pipeline.

use crate::config::PipelineConfig;
use crate::engine::{AnyEngine, Engine};
use crate::error::Result;
use crate::query::QueryEngine;
use crate::store::{PartitionSummary, PartitionedStore};
use crate::transform::{TransformOptions, transform};
use crate::validation::{ValidationReport, checks_for, validate};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// What a pipeline run did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows_ingested: usize,
    pub rows_after_transform: usize,
    pub partitions: Vec<PartitionSummary>,
    pub report: ValidationReport,
}

/// A validated config plus the engine it selects.
///
/// ```no_run
/// use reelbeam::{PipelineConfig, Session};
/// # fn main() -> anyhow::Result<()> {
/// let session = Session::new(PipelineConfig::default())?;
/// let summary = session.run()?;
/// println!("{} rows stored", summary.rows_after_transform);
/// let hits = session.query_engine()?.search("war", 5);
/// println!("{}", hits.render());
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: PipelineConfig,
    engine: AnyEngine,
}

impl Session {
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) if the config is
    /// invalid or the engine cannot be built.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let engine = AnyEngine::from_mode(&config.mode)?;
        Ok(Self { config, engine })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn engine(&self) -> &AnyEngine {
        &self.engine
    }

    #[must_use]
    pub fn store(&self) -> PartitionedStore {
        PartitionedStore::new(self.config.store_dir())
    }

    /// Transform, validate, write the report, then store.
    ///
    /// A failed validation is logged and recorded in the report; the data is
    /// stored regardless.
    ///
    /// # Errors
    /// [`Error::Ingest`](crate::Error::Ingest) before anything is written,
    /// [`Error::Report`](crate::Error::Report) if the report cannot be saved,
    /// [`Error::StoreWrite`](crate::Error::StoreWrite) during the store stage.
    #[instrument(skip_all, fields(engine = self.engine.name(), input = %self.config.input.display()))]
    pub fn run(&self) -> Result<RunSummary> {
        let cfg = &self.config;
        let out = transform(&self.engine, &cfg.input, &TransformOptions::from(cfg))?;

        let profile = cfg.validation_profile();
        let report = validate(&self.engine, &out.dataset, &checks_for(profile, cfg.min_rows));
        if report.all_passed {
            info!(?profile, "validation passed");
        } else {
            warn!(failed = ?report.failed_checks(), "validation failed; storing data anyway");
        }
        report.write_json(cfg.report_path())?;

        let partitions = self
            .store()
            .write(&self.engine, &out.dataset, cfg.write_mode)?;
        info!(
            rows = out.dataset.len(),
            partitions = partitions.len(),
            "pipeline run complete"
        );
        Ok(RunSummary {
            rows_ingested: out.rows_ingested,
            rows_after_transform: out.dataset.len(),
            partitions,
            report,
        })
    }

    /// Load the store written by [`run`](Self::run) for searching.
    ///
    /// # Errors
    /// Returns [`Error::StoreRead`](crate::Error::StoreRead) if the store is
    /// empty or unreadable.
    pub fn query_engine(&self) -> Result<QueryEngine<&AnyEngine>> {
        QueryEngine::open(&self.store(), &self.engine)
    }
}
