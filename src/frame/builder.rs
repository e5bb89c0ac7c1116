//! Column building from loosely typed cells
//!
//! JSON records and spreadsheet cells arrive as individual values rather than
//! typed columns. [`ColumnBuilder`] collects them per column and picks one
//! Arrow type for the whole column when the frame is assembled.

use anyhow::Result;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMillisecondArray};
use chrono::NaiveDateTime;
use std::sync::Arc;

use super::Frame;

/// A single untyped value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Cell {
    /// Text form used when a column mixes kinds
    pub(crate) fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Empty,
    Bool,
    Int,
    Float,
    DateTime,
    Text,
}

/// Widen the column kind to accommodate one more cell
fn merge(kind: Kind, cell: &Cell) -> Kind {
    let cell_kind = match cell {
        Cell::Null => return kind,
        Cell::Bool(_) => Kind::Bool,
        Cell::Int(_) => Kind::Int,
        Cell::Float(_) => Kind::Float,
        Cell::DateTime(_) => Kind::DateTime,
        Cell::Text(_) => Kind::Text,
    };

    match (kind, cell_kind) {
        (Kind::Empty, k) => k,
        (a, b) if a == b => a,
        (Kind::Int, Kind::Float) | (Kind::Float, Kind::Int) => Kind::Float,
        _ => Kind::Text,
    }
}

/// Accumulates the cells of one named column
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: String,
    cells: Vec<Cell>,
}

impl ColumnBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Pad with nulls up to `len` cells
    pub fn pad_to(&mut self, len: usize) {
        if self.cells.len() < len {
            self.cells.resize(len, Cell::Null);
        }
    }

    /// Convert into a typed Arrow array.
    ///
    /// Integers mixed with floats widen to float64; any other mix, and
    /// columns with no values at all, become strings.
    pub fn finish(self) -> (String, ArrayRef) {
        let kind = self.cells.iter().fold(Kind::Empty, merge);

        let array: ArrayRef = match kind {
            Kind::Bool => Arc::new(
                self.cells
                    .iter()
                    .map(|c| match c {
                        Cell::Bool(b) => Some(*b),
                        _ => None,
                    })
                    .collect::<BooleanArray>(),
            ),
            Kind::Int => Arc::new(
                self.cells
                    .iter()
                    .map(|c| match c {
                        Cell::Int(i) => Some(*i),
                        _ => None,
                    })
                    .collect::<Int64Array>(),
            ),
            Kind::Float => Arc::new(
                self.cells
                    .iter()
                    .map(|c| match c {
                        Cell::Int(i) => Some(*i as f64),
                        Cell::Float(f) => Some(*f),
                        _ => None,
                    })
                    .collect::<Float64Array>(),
            ),
            Kind::DateTime => Arc::new(
                self.cells
                    .iter()
                    .map(|c| match c {
                        Cell::DateTime(dt) => Some(dt.and_utc().timestamp_millis()),
                        _ => None,
                    })
                    .collect::<TimestampMillisecondArray>(),
            ),
            Kind::Empty | Kind::Text => Arc::new(
                self.cells
                    .iter()
                    .map(|c| c.to_text())
                    .collect::<StringArray>(),
            ),
        };

        (self.name, array)
    }
}

/// Assemble finished columns into a frame with `row_count` rows
pub fn into_frame(columns: Vec<ColumnBuilder>, row_count: usize) -> Result<Frame> {
    let columns = columns
        .into_iter()
        .map(|mut column| {
            column.pad_to(row_count);
            column.finish()
        })
        .collect();

    Frame::from_columns(columns, row_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use arrow::datatypes::{DataType, TimeUnit};
    use chrono::NaiveDate;

    fn finish(cells: Vec<Cell>) -> ArrayRef {
        let mut builder = ColumnBuilder::new("col");
        for cell in cells {
            builder.push(cell);
        }
        builder.finish().1
    }

    #[test]
    fn test_int_column() {
        let array = finish(vec![Cell::Int(1), Cell::Null, Cell::Int(3)]);
        assert_eq!(array.data_type(), &DataType::Int64);
        assert_eq!(array.null_count(), 1);
    }

    #[test]
    fn test_int_and_float_widen() {
        let array = finish(vec![Cell::Int(1), Cell::Float(2.5)]);
        assert_eq!(array.data_type(), &DataType::Float64);
    }

    #[test]
    fn test_bool_column() {
        let array = finish(vec![Cell::Bool(true), Cell::Bool(false)]);
        assert_eq!(array.data_type(), &DataType::Boolean);
    }

    #[test]
    fn test_mixed_kinds_become_text() {
        let array = finish(vec![Cell::Int(1), Cell::Text("x".to_string()), Cell::Bool(true)]);
        assert_eq!(array.data_type(), &DataType::Utf8);

        let strings = array.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(strings.value(0), "1");
        assert_eq!(strings.value(1), "x");
        assert_eq!(strings.value(2), "true");
    }

    #[test]
    fn test_all_null_column_is_text() {
        let array = finish(vec![Cell::Null, Cell::Null]);
        assert_eq!(array.data_type(), &DataType::Utf8);
        assert_eq!(array.null_count(), 2);
    }

    #[test]
    fn test_datetime_column() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let array = finish(vec![Cell::DateTime(dt), Cell::Null]);
        assert_eq!(
            array.data_type(),
            &DataType::Timestamp(TimeUnit::Millisecond, None)
        );
    }

    #[test]
    fn test_into_frame_pads_short_columns() {
        let mut a = ColumnBuilder::new("a");
        a.push(Cell::Int(1));
        a.push(Cell::Int(2));
        let mut b = ColumnBuilder::new("b");
        b.push(Cell::Text("only".to_string()));

        let frame = into_frame(vec![a, b], 2).unwrap();
        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.column(1).null_count(), 1);
    }
}
