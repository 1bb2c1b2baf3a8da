//! File-format plumbing: CSV ingestion, Parquet partitions, JSON side files,
//! and partition discovery. These helpers report failures with `anyhow`; the
//! pipeline stages attach the path and map them onto [`crate::Error`].

pub mod compression;
pub mod csv;
pub mod glob;
pub mod json;
pub mod parquet;
