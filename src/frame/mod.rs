//! Tabular frame
//!
//! A [`Frame`] is an Arrow [`RecordBatch`] produced by one of the viewers.
//! It answers the questions the dashboard asks about a loaded file: shape,
//! per-column types and null counts, in-memory size, a row preview and a CSV
//! rendering for export.

pub mod builder;
pub mod histogram;
pub mod stats;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::sync::Arc;

pub use builder::{Cell, ColumnBuilder};
pub use histogram::Histogram;
pub use stats::{ColumnSummary, Describe};

/// An in-memory table with named, ordered columns
#[derive(Debug, Clone)]
pub struct Frame {
    batch: RecordBatch,
}

impl Frame {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Build a frame from named columns.
    ///
    /// `row_count` is needed because a frame may have rows but no columns
    /// (a single empty JSON record, for instance).
    pub fn from_columns(columns: Vec<(String, ArrayRef)>, row_count: usize) -> Result<Self> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(name.as_str(), array.data_type().clone(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, array)| array).collect();

        let options = RecordBatchOptions::new().with_row_count(Some(row_count));
        let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
            .context("Failed to assemble table")?;

        Ok(Self { batch })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Column by position
    pub fn column(&self, index: usize) -> &ArrayRef {
        self.batch.column(index)
    }

    /// Column by name (first match)
    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Human-readable type of a column
    pub fn dtype(&self, index: usize) -> String {
        format_data_type(self.batch.column(index).data_type())
    }

    /// Names of the integer and floating point columns, in column order
    pub fn numeric_columns(&self) -> Vec<String> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .filter(|f| is_numeric(f.data_type()))
            .map(|f| f.name().clone())
            .collect()
    }

    /// Approximate in-memory size in bytes
    pub fn memory_usage(&self) -> usize {
        self.batch.get_array_memory_size()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Frame {
        let len = n.min(self.num_rows());
        Frame::new(self.batch.slice(0, len))
    }

    /// All rows as display strings, nulls shown as `null_repr`
    pub fn rows(&self, null_repr: &str) -> Result<Vec<Vec<String>>> {
        let options = FormatOptions::default().with_null(null_repr);
        let formatters = self
            .batch
            .columns()
            .iter()
            .map(|column| ColumnFormatter::new(column.as_ref(), &options))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.num_rows())
            .map(|row| formatters.iter().map(|f| f.value(row, null_repr)).collect())
            .collect())
    }

    /// Serialize as comma separated text with a header row and no index
    /// column. Nulls and float NaN become empty fields.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.column_names())
            .context("Failed to write CSV header")?;

        let nan_masks = self
            .batch
            .columns()
            .iter()
            .map(|column| nan_mask(column.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        for (i, mut row) in self.rows("")?.into_iter().enumerate() {
            for (cell, mask) in row.iter_mut().zip(&nan_masks) {
                if mask.as_ref().is_some_and(|m| m[i]) {
                    cell.clear();
                }
            }
            writer.write_record(&row).context("Failed to write CSV row")?;
        }

        let bytes = writer.into_inner().context("Failed to flush CSV output")?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }
}

/// Which rows of a float column hold NaN; `None` for other types
fn nan_mask(array: &dyn Array) -> Result<Option<Vec<bool>>> {
    if !matches!(
        array.data_type(),
        DataType::Float16 | DataType::Float32 | DataType::Float64
    ) {
        return Ok(None);
    }
    let floats = cast(array, &DataType::Float64).context("Failed to convert column to float64")?;
    let mask = floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.is_some_and(f64::is_nan))
        .collect();
    Ok(Some(mask))
}

/// Formats one column; all-null columns have no Arrow formatter
enum ColumnFormatter<'a> {
    Values(ArrayFormatter<'a>),
    Nulls,
}

impl<'a> ColumnFormatter<'a> {
    fn new(array: &'a dyn Array, options: &FormatOptions<'a>) -> Result<Self> {
        if array.data_type() == &DataType::Null {
            return Ok(ColumnFormatter::Nulls);
        }
        let formatter = ArrayFormatter::try_new(array, options).context("Unsupported column type")?;
        Ok(ColumnFormatter::Values(formatter))
    }

    fn value(&self, row: usize, null_repr: &str) -> String {
        match self {
            ColumnFormatter::Values(f) => f.value(row).to_string(),
            ColumnFormatter::Nulls => null_repr.to_string(),
        }
    }
}

/// Integer and floating point types; booleans are not numeric
pub fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

/// Format a data type as a human-readable string
pub fn format_data_type(dt: &DataType) -> String {
    match dt {
        DataType::Null => "null".to_string(),
        DataType::Boolean => "boolean".to_string(),
        DataType::Int8 => "int8".to_string(),
        DataType::Int16 => "int16".to_string(),
        DataType::Int32 => "int32".to_string(),
        DataType::Int64 => "int64".to_string(),
        DataType::UInt8 => "uint8".to_string(),
        DataType::UInt16 => "uint16".to_string(),
        DataType::UInt32 => "uint32".to_string(),
        DataType::UInt64 => "uint64".to_string(),
        DataType::Float16 => "float16".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "string".to_string(),
        DataType::Date32 | DataType::Date64 => "date".to_string(),
        DataType::Timestamp(unit, tz) => {
            let unit_str = match unit {
                TimeUnit::Second => "s",
                TimeUnit::Millisecond => "ms",
                TimeUnit::Microsecond => "μs",
                TimeUnit::Nanosecond => "ns",
            };
            match tz {
                Some(tz) => format!("timestamp({}, {})", unit_str, tz),
                None => format!("timestamp({})", unit_str),
            }
        }
        DataType::Time32(_) | DataType::Time64(_) => "time".to_string(),
        DataType::Duration(_) => "duration".to_string(),
        other => other.to_string().to_lowercase(),
    }
}
