//! Spreadsheet viewer
//!
//! Reads the first worksheet of an `.xlsx` workbook with calamine. The first
//! row of the used range is the header; blank header cells are named
//! `Unnamed: <index>`.

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

use crate::frame::builder::into_frame;
use crate::frame::{Cell, ColumnBuilder, Frame};

/// Whole numbers below this magnitude are read as integers
const MAX_EXACT_INTEGER: f64 = 9.0e15;

/// Spreadsheet viewer
#[derive(Debug, Clone, Default)]
pub struct XlsxViewer {
    /// Worksheet to read; the first one when unset
    sheet: Option<String>,
}

impl XlsxViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a named worksheet instead of the first one
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn read_bytes(&self, data: &[u8]) -> Result<Frame> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data)).context("Failed to open workbook")?;

        let sheet = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .context("Workbook has no worksheets")?,
        };

        let range = workbook
            .worksheet_range(&sheet)
            .with_context(|| format!("Failed to read worksheet {}", sheet))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return into_frame(Vec::new(), 0);
        };

        let mut columns: Vec<ColumnBuilder> = header
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = to_cell(cell)
                    .to_text()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| format!("Unnamed: {}", i));
                ColumnBuilder::new(name)
            })
            .collect();

        let mut row_count = 0;
        for row in rows {
            for (column, cell) in columns.iter_mut().zip(row.iter()) {
                column.push(to_cell(cell));
            }
            row_count += 1;
        }

        tracing::debug!("Read worksheet {} with {} rows, {} columns", sheet, row_count, columns.len());
        into_frame(columns, row_count)
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Null,
        Data::Bool(b) => Cell::Bool(*b),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => Cell::Int(*f as i64),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => dt.as_datetime().map_or(Cell::Null, Cell::DateTime),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}
