//! Decade-partitioned Parquet store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/decade=1990/data.parquet
//! <root>/decade=2000/data.parquet
//! <root>/decade=__HIVE_DEFAULT_PARTITION__/data.parquet   (records without a decade)
//! ```
//!
//! Every partition is written to a temporary file inside its own directory
//! and renamed over `data.parquet`, so a reader of a partition that is being
//! replaced sees either the old file or the new one, never a partial write.
//! [`WriteMode::Overwrite`] removes stale partitions before writing, so during
//! such a write a reader can find the store incomplete.
//! Partitions are independent: a failed run can leave some of them replaced
//! and others untouched.

use crate::config::WriteMode;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::io::glob::{partition_dirs, partition_files};
use crate::io::parquet::{PartitionData, read_partition_file, write_records};
use crate::record::{DECADE, Dataset, Record, Schema};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Directory value used for records whose decade is null.
pub const HIVE_NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// File name of the single data file in every partition written here.
pub const DATA_FILE: &str = "data.parquet";

/// `decade=<value>` directory name for a partition key.
#[must_use]
pub fn partition_dir_name(decade: Option<i32>) -> String {
    match decade {
        Some(d) => format!("{DECADE}={d}"),
        None => format!("{DECADE}={HIVE_NULL_PARTITION}"),
    }
}

/// Inverse of [`partition_dir_name`]. The outer `None` means `name` is not a
/// decade partition directory.
#[must_use]
pub fn parse_partition_dir(name: &str) -> Option<Option<i32>> {
    let value = name.strip_prefix(DECADE)?.strip_prefix('=')?;
    if value == HIVE_NULL_PARTITION {
        return Some(None);
    }
    value.parse().ok().map(Some)
}

/// What a write produced for one decade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub decade: Option<i32>,
    pub rows: usize,
    pub path: PathBuf,
}

/// Handle on a store root. Holds no open files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionedStore {
    root: PathBuf,
}

impl PartitionedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Data files of every partition currently on disk, sorted by path.
    ///
    /// # Errors
    /// Returns [`Error::StoreRead`] if the root cannot be listed.
    pub fn partitions(&self) -> Result<Vec<PathBuf>> {
        partition_files(&self.root, DECADE).map_err(|e| Error::store_read(&self.root, e))
    }

    /// Group `ds` by decade and write one partition per group, in parallel on
    /// a parallel engine. Returns one summary per partition, ordered by decade
    /// (null first).
    ///
    /// With [`WriteMode::Overwrite`] every existing partition under the root is
    /// removed first; with [`WriteMode::OverwritePartitions`] only the
    /// partitions being written are replaced.
    ///
    /// # Errors
    /// Returns [`Error::StoreWrite`] on the first partition that cannot be
    /// written. Partitions finished before it stay on disk.
    #[instrument(skip_all, fields(engine = engine.name(), root = %self.root.display(), ?mode))]
    pub fn write<E: Engine>(
        &self,
        engine: &E,
        ds: &Dataset,
        mode: WriteMode,
    ) -> Result<Vec<PartitionSummary>> {
        fs::create_dir_all(&self.root).map_err(|e| Error::store_write(&self.root, e))?;
        if mode == WriteMode::Overwrite {
            let stale =
                partition_dirs(&self.root, DECADE).map_err(|e| Error::store_write(&self.root, e))?;
            for dir in stale {
                fs::remove_dir_all(&dir).map_err(|e| Error::store_write(&dir, e))?;
            }
        }

        let refs: Vec<&Record> = ds.records.iter().collect();
        let groups: Vec<(Option<i32>, Vec<&Record>)> =
            engine.group_by(refs, |r| r.decade).into_iter().collect();
        let schema = &ds.schema;
        let written = engine.try_map(groups, |(decade, rows)| {
            self.write_partition(schema, decade, &rows)
        })?;

        info!(
            partitions = written.len(),
            rows = ds.len(),
            "store write complete"
        );
        Ok(written)
    }

    fn write_partition(
        &self,
        schema: &Schema,
        decade: Option<i32>,
        rows: &[&Record],
    ) -> Result<PartitionSummary> {
        let dir = self.root.join(partition_dir_name(decade));
        fs::create_dir_all(&dir).map_err(|e| Error::store_write(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| Error::store_write(&dir, e))?;
        write_records(tmp.as_file_mut(), schema, rows).map_err(|e| Error::store_write(&dir, e))?;
        let path = dir.join(DATA_FILE);
        tmp.persist(&path)
            .map_err(|e| Error::store_write(&dir, e.error))?;
        remove_foreign_data_files(&dir).map_err(|e| Error::store_write(&dir, e))?;

        debug!(?decade, rows = rows.len(), path = %path.display(), "partition written");
        Ok(PartitionSummary {
            decade,
            rows: rows.len(),
            path,
        })
    }

    /// Read every partition back into one dataset. Record order across
    /// partitions is unspecified.
    ///
    /// # Errors
    /// Returns [`Error::StoreRead`] if no partition exists under the root, a
    /// partition file cannot be decoded, or partitions disagree on their
    /// passthrough columns.
    #[instrument(skip_all, fields(engine = engine.name(), root = %self.root.display()))]
    pub fn read<E: Engine>(&self, engine: &E) -> Result<Dataset> {
        let files = self.partitions()?;
        if files.is_empty() {
            return Err(Error::store_read(
                &self.root,
                format!("no {DECADE}=* partitions found"),
            ));
        }

        let parts: Vec<(PathBuf, PartitionData)> = engine.try_map(files, |file| {
            let fallback = file
                .parent()
                .and_then(Path::file_name)
                .and_then(|n| parse_partition_dir(&n.to_string_lossy()))
                .flatten();
            let data =
                read_partition_file(&file, fallback).map_err(|e| Error::store_read(&file, e))?;
            Ok::<_, Error>((file, data))
        })?;

        let mut schema: Option<Schema> = None;
        let mut records = Vec::new();
        for (file, data) in parts {
            debug!(path = %file.display(), rows = data.records.len(), "partition read");
            match &schema {
                None => schema = Some(Schema::new(data.passthrough)),
                Some(s) if s.passthrough != data.passthrough => {
                    return Err(Error::store_read(
                        &file,
                        format!(
                            "passthrough columns {:?} differ from {:?}",
                            data.passthrough, s.passthrough
                        ),
                    ));
                }
                Some(_) => {}
            }
            records.extend(data.records);
        }

        let ds = Dataset::new(schema.unwrap_or_default(), records);
        info!(rows = ds.len(), "store read complete");
        Ok(ds)
    }
}

/// Delete every `*.parquet` file in a partition directory other than [`DATA_FILE`].
fn remove_foreign_data_files(dir: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let foreign = path.extension().is_some_and(|ext| ext == "parquet")
            && path.file_name().is_some_and(|name| name != DATA_FILE)
            && path.is_file();
        if foreign {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
