//! JSON side files (validation reports, query results).

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `value` as indented JSON, creating parent directories if needed.
///
/// # Errors
/// Returns an error if a directory or the file cannot be created, or
/// serialization fails.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, value)
        .with_context(|| format!("serialize JSON to {}", path.display()))?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}
