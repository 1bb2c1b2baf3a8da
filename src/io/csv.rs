//! Raw CSV ingestion.
//!
//! The source schema is only known at runtime (passthrough columns), so rows
//! are read as untyped string fields rather than deserialized with Serde.

use crate::io::compression::auto_detect_reader;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

/// One data row: its 1-based line in the source and its fields.
/// Empty fields are `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    pub line: u64,
    pub fields: Vec<Option<String>>,
}

/// Header plus data rows, exactly as they appear in the source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Read a CSV file with a header row, stopping after `row_limit` data rows.
///
/// **Compression**: gzip and zstd input is detected from the extension or the
/// magic bytes (when the respective feature flags are enabled).
///
/// # Errors
/// Returns an error if the file cannot be opened or decompressed, the header is
/// missing, or a row is malformed (including a field count that differs from
/// the header).
pub fn read_table(path: impl AsRef<Path>, row_limit: Option<usize>) -> Result<RawTable> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(rdr);

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(str::to_owned)
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        anyhow::bail!("{} has no header row", path.display());
    }

    let limit = row_limit.unwrap_or(usize::MAX);
    let mut rows = Vec::new();
    for (i, rec) in rdr.records().take(limit).enumerate() {
        let rec = rec.with_context(|| format!("parse CSV record #{}", i + 1))?;
        let line = rec.position().map_or(i as u64 + 2, csv::Position::line);
        let fields = rec
            .iter()
            .map(|f| (!f.is_empty()).then(|| f.to_owned()))
            .collect();
        rows.push(RawRow { line, fields });
    }
    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_header_rows_and_limit() -> Result<()> {
        let mut f = tempfile::NamedTempFile::new()?;
        writeln!(f, "Title,Plot\nA,one two\nB,\nC,three")?;
        let table = read_table(f.path(), Some(2))?;
        assert_eq!(table.headers, vec!["Title", "Plot"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].fields, vec![Some("B".to_owned()), None]);
        assert_eq!(table.rows[1].line, 3);
        Ok(())
    }

    #[test]
    fn ragged_rows_are_errors() -> Result<()> {
        let mut f = tempfile::NamedTempFile::new()?;
        writeln!(f, "Title,Plot\nA,one,extra")?;
        assert!(read_table(f.path(), None).is_err());
        Ok(())
    }
}
