//! Histogram of one numeric column

use anyhow::{anyhow, Result};
use plotters::prelude::*;

use super::stats::numeric_values;
use super::Frame;

/// Number of equal-width bins
pub const DEFAULT_BINS: usize = 50;

/// One histogram bar; `end` is exclusive except on the last bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Distribution of one numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Bin the non-null values of `column` into `bins` equal-width bins
    /// spanning its min and max. A constant column gets a unit-wide range
    /// centred on its value. Returns `None` when the column is missing or
    /// has no values.
    pub fn of(frame: &Frame, column: &str, bins: usize) -> Result<Option<Self>> {
        let Some(array) = frame.column_by_name(column) else {
            return Ok(None);
        };
        let values = numeric_values(array.as_ref())?;
        Ok(Self::from_values(column, &values, bins))
    }

    pub fn from_values(column: &str, values: &[f64], bins: usize) -> Option<Self> {
        if values.is_empty() || bins == 0 {
            return None;
        }

        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| Bin {
                start: min + width * i as f64,
                end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
                count,
            })
            .collect();

        Some(Self {
            column: column.to_string(),
            bins,
        })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    pub fn range(&self) -> (f64, f64) {
        match (self.bins.first(), self.bins.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (0.0, 0.0),
        }
    }

    /// Draw the bars as an SVG document. Axis labels are left to the page.
    pub fn to_svg(&self, width: u32, height: u32) -> Result<String> {
        let (lo, hi) = self.range();
        let top = self.max_count().max(1);
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| anyhow!("Failed to draw histogram: {}", e))?;

            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .build_cartesian_2d(lo..hi, 0usize..top)
                .map_err(|e| anyhow!("Failed to draw histogram: {}", e))?;

            chart
                .draw_series(self.bins.iter().filter(|b| b.count > 0).map(|b| {
                    Rectangle::new([(b.start, 0), (b.end, b.count)], BLUE.mix(0.6).filled())
                }))
                .map_err(|e| anyhow!("Failed to draw histogram: {}", e))?;

            root.present()
                .map_err(|e| anyhow!("Failed to draw histogram: {}", e))?;
        }
        Ok(svg)
    }
}
