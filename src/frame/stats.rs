//! Summary statistics
//!
//! [`Describe`] mirrors the classic "describe" table: for numeric columns
//! count, mean, sample standard deviation, min, quartiles and max. A frame
//! without numeric columns is described by count, unique, top and freq of
//! its remaining columns instead.

use anyhow::{Context, Result};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use std::collections::HashMap;

use super::{is_numeric, Frame};

/// Per-column statistics of a numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

/// Per-column statistics of a non-numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// Descriptive statistics of a frame
#[derive(Debug, Clone, PartialEq)]
pub enum Describe {
    Numeric(Vec<NumericSummary>),
    Categorical(Vec<CategoricalSummary>),
}

/// One row of the column information table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    pub nulls: usize,
}

impl Describe {
    /// Compute statistics for every numeric column, or for every other
    /// column when there is none.
    pub fn of(frame: &Frame) -> Result<Self> {
        let names = frame.column_names();
        let numeric: Vec<usize> = (0..frame.num_columns())
            .filter(|&i| is_numeric(frame.column(i).data_type()))
            .collect();

        if !numeric.is_empty() {
            let summaries = numeric
                .into_iter()
                .map(|i| {
                    let values = numeric_values(frame.column(i).as_ref())?;
                    Ok(summarize_numeric(names[i], &values))
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Describe::Numeric(summaries));
        }

        let rows = frame.rows("")?;
        let summaries = (0..frame.num_columns())
            .map(|i| {
                let column = frame.column(i);
                let values = rows
                    .iter()
                    .enumerate()
                    .filter(|(row, _)| column.is_valid(*row) && column.data_type() != &DataType::Null)
                    .map(|(_, r)| r[i].as_str());
                summarize_categorical(names[i], values)
            })
            .collect();
        Ok(Describe::Categorical(summaries))
    }

    /// Table layout: statistic names down the first column, one column per
    /// described frame column.
    pub fn table(&self) -> (Vec<String>, Vec<Vec<String>>) {
        match self {
            Describe::Numeric(summaries) => {
                let header = header_row(summaries.iter().map(|s| s.column.as_str()));
                let stats: [(&str, fn(&NumericSummary) -> String); 8] = [
                    ("count", |s| format_stat(s.count as f64)),
                    ("mean", |s| format_stat(s.mean)),
                    ("std", |s| format_stat(s.std)),
                    ("min", |s| format_stat(s.min)),
                    ("25%", |s| format_stat(s.q25)),
                    ("50%", |s| format_stat(s.q50)),
                    ("75%", |s| format_stat(s.q75)),
                    ("max", |s| format_stat(s.max)),
                ];
                let rows = stats
                    .iter()
                    .map(|(label, f)| {
                        std::iter::once(label.to_string())
                            .chain(summaries.iter().map(f))
                            .collect()
                    })
                    .collect();
                (header, rows)
            }
            Describe::Categorical(summaries) => {
                let header = header_row(summaries.iter().map(|s| s.column.as_str()));
                let stats: [(&str, fn(&CategoricalSummary) -> String); 4] = [
                    ("count", |s| s.count.to_string()),
                    ("unique", |s| s.unique.to_string()),
                    ("top", |s| s.top.clone().unwrap_or_else(|| "NaN".to_string())),
                    ("freq", |s| {
                        if s.top.is_some() {
                            s.freq.to_string()
                        } else {
                            "NaN".to_string()
                        }
                    }),
                ];
                let rows = stats
                    .iter()
                    .map(|(label, f)| {
                        std::iter::once(label.to_string())
                            .chain(summaries.iter().map(f))
                            .collect()
                    })
                    .collect();
                (header, rows)
            }
        }
    }
}

impl ColumnSummary {
    /// Name, type, non-null count and null count for every column
    pub fn of(frame: &Frame) -> Vec<ColumnSummary> {
        frame
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let column = frame.column(i);
                let nulls = if column.data_type() == &DataType::Null {
                    column.len()
                } else {
                    column.null_count()
                };
                ColumnSummary {
                    name: name.to_string(),
                    dtype: frame.dtype(i),
                    non_null: column.len() - nulls,
                    nulls,
                }
            })
            .collect()
    }
}

/// Non-null, non-NaN values of a numeric column as f64
pub fn numeric_values(array: &dyn Array) -> Result<Vec<f64>> {
    let floats = cast(array, &DataType::Float64).context("Failed to convert column to float64")?;
    Ok(floats
        .as_primitive::<Float64Type>()
        .iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

fn header_row<'a>(columns: impl Iterator<Item = &'a str>) -> Vec<String> {
    std::iter::once(String::new())
        .chain(columns.map(|c| c.to_string()))
        .collect()
}

fn format_stat(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.6}", value)
    }
}

fn summarize_numeric(column: &str, values: &[f64]) -> NumericSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = sorted.len();
    let mean = if count == 0 {
        f64::NAN
    } else {
        sorted.iter().sum::<f64>() / count as f64
    };

    NumericSummary {
        column: column.to_string(),
        count,
        mean,
        std: std_dev(&sorted, mean),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&sorted, 0.25),
        q50: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

fn summarize_categorical<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> CategoricalSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut count = 0;

    for value in values {
        count += 1;
        let entry = counts.entry(value).or_insert(0);
        if *entry == 0 {
            order.push(value);
        }
        *entry += 1;
    }

    // First seen wins on ties
    let mut top: Option<(&str, usize)> = None;
    for value in &order {
        let freq = counts[value];
        if top.map_or(true, |(_, best)| freq > best) {
            top = Some((value, freq));
        }
    }

    CategoricalSummary {
        column: column.to_string(),
        count,
        unique: order.len(),
        top: top.map(|(v, _)| v.to_string()),
        freq: top.map_or(0, |(_, f)| f),
    }
}

/// Sample standard deviation (n - 1 denominator); NaN below two values
fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    variance.sqrt()
}

/// Linear interpolation between the closest ranks of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
