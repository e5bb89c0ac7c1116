//! CSV file viewer
//!
//! Reads comma separated files into a [`Frame`] with Arrow's CSV reader.
//! The first line is the header and column types are inferred from every
//! record in the file. Rows with fewer fields than the header are padded
//! with nulls.

use anyhow::{bail, Context, Result};
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::io::Cursor;
use std::sync::Arc;

use crate::frame::Frame;

/// CSV viewer for tabular display of CSV files
pub struct CsvViewer {
    /// Rows decoded per Arrow batch
    batch_size: usize,
    /// CSV delimiter character
    delimiter: u8,
}

impl CsvViewer {
    /// Create a new CSV viewer with default settings
    pub fn new() -> Self {
        Self {
            batch_size: 8192,
            delimiter: b',',
        }
    }

    /// Create a viewer with custom batch size
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::new()
        }
    }

    /// Set the delimiter character
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read a whole CSV file
    pub fn read_bytes(&self, data: &[u8]) -> Result<Frame> {
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            bail!("No columns to parse from file");
        }

        let format = Format::default()
            .with_header(true)
            .with_delimiter(self.delimiter)
            .with_truncated_rows(true);

        let (inferred, records) = format
            .infer_schema(Cursor::new(data), None)
            .context("Failed to infer CSV schema")?;
        let schema = Arc::new(normalize_schema(&inferred, records));

        let reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .with_delimiter(self.delimiter)
            .with_truncated_rows(true)
            .with_batch_size(self.batch_size)
            .build(Cursor::new(data))
            .context("Failed to create CSV reader")?;

        let batches = reader
            .collect::<Result<Vec<RecordBatch>, _>>()
            .context("Failed to read CSV records")?;

        let batch = concat_batches(&schema, &batches).context("Failed to combine CSV batches")?;

        tracing::debug!("Read CSV with {} rows, {} columns", batch.num_rows(), batch.num_columns());
        Ok(Frame::new(batch))
    }
}

impl Default for CsvViewer {
    fn default() -> Self {
        Self::new()
    }
}

/// Name blank headers and give columns without any value a concrete type:
/// float64 when the file has rows (all missing), string otherwise.
fn normalize_schema(schema: &Schema, records: usize) -> Schema {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let name = if field.name().trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                field.name().clone()
            };
            let data_type = match field.data_type() {
                DataType::Null if records > 0 => DataType::Float64,
                DataType::Null => DataType::Utf8,
                other => other.clone(),
            };
            Field::new(name, data_type, true)
        })
        .collect();

    Schema::new(fields)
}
