//! Parquet encoding of [`Record`]s.
//!
//! The column layout comes from [`Schema::column_names`]: core source columns,
//! passthrough columns (all `Utf8`), then derived columns. Files are written
//! with Snappy block compression.
//!
//! Reading is lenient about physical types: every known column is cast to its
//! logical Arrow type first, so files produced by other writers (e.g. with
//! `Int64` years or `LargeUtf8` strings) load the same way.

use crate::record::{
    self, DECADE, GENRE, KNOWN_COLUMNS, PLOT, PLOT_LENGTH, RELEASE_YEAR, Record, Schema, TITLE,
    TITLE_CLEAN,
};
use anyhow::{Context, Result, anyhow};
use arrow::array::{Array, ArrayRef, Int32Array, StringArray, UInt32Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Arrow schema for a record layout.
#[must_use]
pub fn arrow_schema(schema: &Schema) -> ArrowSchema {
    let mut fields = vec![
        Field::new(TITLE, DataType::Utf8, true),
        Field::new(PLOT, DataType::Utf8, true),
        Field::new(RELEASE_YEAR, DataType::Int32, true),
        Field::new(GENRE, DataType::Utf8, true),
    ];
    fields.extend(
        schema
            .passthrough
            .iter()
            .map(|name| Field::new(name.as_str(), DataType::Utf8, true)),
    );
    fields.extend([
        Field::new(PLOT_LENGTH, DataType::UInt32, false),
        Field::new(TITLE_CLEAN, DataType::Utf8, true),
        Field::new(DECADE, DataType::Int32, true),
    ]);
    ArrowSchema::new(fields)
}

fn to_batch(schema: &Schema, records: &[&Record]) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter(records.iter().map(|r| r.title.as_deref()))),
        Arc::new(StringArray::from_iter(records.iter().map(|r| r.plot.as_deref()))),
        Arc::new(Int32Array::from_iter(records.iter().map(|r| r.release_year))),
        Arc::new(StringArray::from_iter(records.iter().map(|r| r.genre.as_deref()))),
    ];
    for idx in 0..schema.passthrough.len() {
        columns.push(Arc::new(StringArray::from_iter(
            records
                .iter()
                .map(|r| r.extra.get(idx).and_then(|v| v.as_deref())),
        )));
    }
    columns.push(Arc::new(UInt32Array::from_iter_values(
        records.iter().map(|r| r.plot_length),
    )));
    columns.push(Arc::new(StringArray::from_iter(
        records.iter().map(|r| r.title_clean.as_deref()),
    )));
    columns.push(Arc::new(Int32Array::from_iter(records.iter().map(|r| r.decade))));

    RecordBatch::try_new(Arc::new(arrow_schema(schema)), columns)
        .context("assemble record batch")
}

/// Encode `records` as a single Snappy-compressed Parquet file into `writer`.
///
/// Works for zero records (a file with the schema and no rows is written).
///
/// # Returns
/// Number of rows written.
///
/// # Errors
/// Returns an error if the batch cannot be assembled or the writer fails.
pub fn write_records<W: Write + Send>(
    writer: W,
    schema: &Schema,
    records: &[&Record],
) -> Result<usize> {
    let batch = to_batch(schema, records)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut w =
        ArrowWriter::try_new(writer, batch.schema(), Some(props)).context("create ArrowWriter")?;
    w.write(&batch).context("write batch to parquet")?;
    w.close().context("close ArrowWriter")?;
    Ok(records.len())
}

/// Contents of one partition file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionData {
    /// Passthrough column names, in file order.
    pub passthrough: Vec<String>,
    pub records: Vec<Record>,
}

/// Cast a column to `ty`, or `None` if the batch has no such column.
fn cast_column(batch: &RecordBatch, name: &str, ty: &DataType) -> Result<Option<ArrayRef>> {
    batch
        .column_by_name(name)
        .map(|col| cast(col, ty).with_context(|| format!("cast column {name} to {ty}")))
        .transpose()
}

fn downcast<'a, T: 'static>(arr: &'a ArrayRef, name: &str) -> Result<&'a T> {
    arr.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("column {name} has unexpected type {}", arr.data_type()))
}

fn str_at(arr: Option<&StringArray>, i: usize) -> Option<String> {
    arr.filter(|a| a.is_valid(i)).map(|a| a.value(i).to_owned())
}

fn i32_at(arr: Option<&Int32Array>, i: usize) -> Option<i32> {
    arr.filter(|a| a.is_valid(i)).map(|a| a.value(i))
}

/// Read one partition file back into records.
///
/// `title`, `plot` and `plot_length` must be present. A missing `genre` reads
/// as null, a missing `title_clean` is recomputed from the title, and a missing
/// `decade` column takes `fallback_decade` (the value encoded in the partition
/// directory name).
///
/// # Errors
/// Returns an error if the file cannot be opened or decoded, a required column
/// is missing, or a column cannot be cast to its expected type.
pub fn read_partition_file(
    path: impl AsRef<Path>,
    fallback_decade: Option<i32>,
) -> Result<PartitionData> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("open ParquetRecordBatchReader")?;
    let passthrough: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|n| !KNOWN_COLUMNS.contains(&n.as_str()))
        .collect();
    for required in [TITLE, PLOT, PLOT_LENGTH] {
        if builder.schema().field_with_name(required).is_err() {
            anyhow::bail!("{} is missing column {required}", path.display());
        }
    }

    let reader = builder
        .with_batch_size(64 * 1024)
        .build()
        .context("build ParquetRecordBatchReader")?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.context("read next batch")?;
        decode_batch(&batch, &passthrough, fallback_decade, &mut records)?;
    }
    Ok(PartitionData {
        passthrough,
        records,
    })
}

fn decode_batch(
    batch: &RecordBatch,
    passthrough: &[String],
    fallback_decade: Option<i32>,
    out: &mut Vec<Record>,
) -> Result<()> {
    let utf8 = |name: &str| cast_column(batch, name, &DataType::Utf8);
    let title_col = utf8(TITLE)?;
    let plot_col = utf8(PLOT)?;
    let genre_col = utf8(GENRE)?;
    let title_clean_col = utf8(TITLE_CLEAN)?;
    let year_col = cast_column(batch, RELEASE_YEAR, &DataType::Int32)?;
    let decade_col = cast_column(batch, DECADE, &DataType::Int32)?;
    let plot_length_col = cast_column(batch, PLOT_LENGTH, &DataType::UInt32)?
        .ok_or_else(|| anyhow!("missing column {PLOT_LENGTH}"))?;
    let extra_cols = passthrough
        .iter()
        .map(|name| utf8(name.as_str()))
        .collect::<Result<Vec<_>>>()?;

    let title = title_col.as_ref().map(|a| downcast::<StringArray>(a, TITLE)).transpose()?;
    let plot = plot_col.as_ref().map(|a| downcast::<StringArray>(a, PLOT)).transpose()?;
    let genre = genre_col.as_ref().map(|a| downcast::<StringArray>(a, GENRE)).transpose()?;
    let title_clean = title_clean_col
        .as_ref()
        .map(|a| downcast::<StringArray>(a, TITLE_CLEAN))
        .transpose()?;
    let year = year_col.as_ref().map(|a| downcast::<Int32Array>(a, RELEASE_YEAR)).transpose()?;
    let decade = decade_col.as_ref().map(|a| downcast::<Int32Array>(a, DECADE)).transpose()?;
    let plot_length = downcast::<UInt32Array>(&plot_length_col, PLOT_LENGTH)?;
    let extras = extra_cols
        .iter()
        .zip(passthrough)
        .map(|(col, name)| col.as_ref().map(|a| downcast::<StringArray>(a, name)).transpose())
        .collect::<Result<Vec<_>>>()?;

    for i in 0..batch.num_rows() {
        let title_value = str_at(title, i);
        let title_clean_value = if title_clean.is_some() {
            str_at(title_clean, i)
        } else {
            title_value.as_deref().map(record::clean_title)
        };
        out.push(Record {
            plot: str_at(plot, i),
            release_year: i32_at(year, i),
            genre: str_at(genre, i),
            plot_length: if plot_length.is_valid(i) {
                plot_length.value(i)
            } else {
                0
            },
            title_clean: title_clean_value,
            decade: if decade.is_some() {
                i32_at(decade, i)
            } else {
                fallback_decade
            },
            extra: extras.iter().map(|arr| str_at(*arr, i)).collect(),
            title: title_value,
        });
    }
    Ok(())
}
