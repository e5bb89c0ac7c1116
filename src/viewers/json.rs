//! JSON record viewer
//!
//! A top-level array is read as one row per element; any other top-level
//! value is a single row. Object keys become columns in the order they are
//! first seen. An element that is itself an array spreads across positional
//! columns `0`, `1`, ...; any other element that is not an object goes in
//! column `0`. Arrays or objects nested below that are kept as JSON text.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;

use crate::frame::builder::into_frame;
use crate::frame::{Cell, ColumnBuilder, Frame};

/// Column holding elements that are neither objects nor arrays
const SCALAR_COLUMN: &str = "0";

/// Parse JSON from bytes
pub fn read_bytes(data: &[u8]) -> Result<Frame> {
    let text = std::str::from_utf8(data).context("JSON file is not valid UTF-8")?;
    let value: Value = serde_json::from_str(text).context("JSON parse error")?;

    let records = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    records_to_frame(records)
}

/// Build a frame with one row per record
pub fn records_to_frame(records: Vec<Value>) -> Result<Frame> {
    let mut columns: Vec<ColumnBuilder> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    let mut column_for = |name: &str, columns: &mut Vec<ColumnBuilder>| -> usize {
        *positions.entry(name.to_string()).or_insert_with(|| {
            columns.push(ColumnBuilder::new(name));
            columns.len() - 1
        })
    };

    for (row, record) in records.iter().enumerate() {
        match record {
            Value::Object(fields) => {
                for (key, value) in fields {
                    let idx = column_for(key, &mut columns);
                    columns[idx].pad_to(row);
                    columns[idx].push(to_cell(value));
                }
            }
            Value::Array(items) => {
                for (position, value) in items.iter().enumerate() {
                    let idx = column_for(&position.to_string(), &mut columns);
                    columns[idx].pad_to(row);
                    columns[idx].push(to_cell(value));
                }
            }
            other => {
                let idx = column_for(SCALAR_COLUMN, &mut columns);
                columns[idx].pad_to(row);
                columns[idx].push(to_cell(other));
            }
        }
    }

    tracing::debug!("Read {} JSON records into {} columns", records.len(), columns.len());
    into_frame(columns, records.len())
}

fn to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map_or(Cell::Null, Cell::Float),
        },
        Value::String(s) => Cell::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => Cell::Text(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    #[test]
    fn test_array_of_records() {
        let data = br#"[{"venue": "Hall A", "capacity": 300}, {"venue": "Club B", "capacity": 120}]"#;
        let frame = read_bytes(data).unwrap();

        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.column_names(), vec!["venue", "capacity"]);
        assert_eq!(frame.dtype(1), "int64");
    }

    #[test]
    fn test_single_record_is_one_row() {
        let frame = read_bytes(br#"{"venue": "Hall A", "capacity": 300}"#).unwrap();

        assert_eq!(frame.num_rows(), 1);
        assert_eq!(frame.num_columns(), 2);
    }

    #[test]
    fn test_empty_object_is_one_row() {
        let frame = read_bytes(b"{}").unwrap();
        assert_eq!(frame.num_rows(), 1);
        assert_eq!(frame.num_columns(), 0);
    }

    #[test]
    fn test_empty_array() {
        let frame = read_bytes(b"[]").unwrap();
        assert_eq!(frame.num_rows(), 0);
        assert_eq!(frame.num_columns(), 0);
    }

    #[test]
    fn test_keys_in_first_seen_order() {
        let data = br#"[{"z": 1, "a": 2}, {"m": 3, "z": 4}]"#;
        let frame = read_bytes(data).unwrap();

        assert_eq!(frame.column_names(), vec!["z", "a", "m"]);
        assert_eq!(frame.column(1).null_count(), 1);
        assert_eq!(frame.column(2).null_count(), 1);
    }

    #[test]
    fn test_mixed_numbers_widen() {
        let frame = read_bytes(br#"[{"v": 1}, {"v": 2.5}, {"v": null}]"#).unwrap();
        assert_eq!(frame.dtype(0), "float64");
        assert_eq!(frame.column(0).null_count(), 1);
    }

    #[test]
    fn test_nested_values_kept_as_text() {
        let frame = read_bytes(br#"[{"tags": ["a", "b"], "meta": {"k": 1}}]"#).unwrap();
        let rows = frame.rows("").unwrap();

        assert_eq!(rows[0][0], r#"["a","b"]"#);
        assert_eq!(rows[0][1], r#"{"k":1}"#);
    }

    #[test]
    fn test_scalar_elements() {
        let frame = read_bytes(b"[1, 2, 3]").unwrap();
        assert_eq!(frame.column_names(), vec!["0"]);
        assert_eq!(frame.num_rows(), 3);
    }

    #[test]
    fn test_array_elements_spread_into_positional_columns() {
        let frame = read_bytes(b"[[1, 2], [3, 4]]").unwrap();

        assert_eq!(frame.column_names(), vec!["0", "1"]);
        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.dtype(0), "int64");
        assert_eq!(frame.rows("").unwrap(), vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_short_array_elements_padded_with_nulls() {
        let frame = read_bytes(br#"[[1], [2, "x"]]"#).unwrap();

        assert_eq!(frame.column_names(), vec!["0", "1"]);
        assert_eq!(frame.column(1).null_count(), 1);
        assert_eq!(frame.rows("null").unwrap()[0], vec!["1", "null"]);
    }

    #[test]
    fn test_invalid_json() {
        let err = read_bytes(b"{not json").unwrap_err();
        assert!(err.to_string().contains("JSON parse error"));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(read_bytes(&[0xff, 0xfe, 0x00]).is_err());
    }
}
