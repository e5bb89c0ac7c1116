//! File viewers
//!
//! Turns a fetched object into a [`Frame`]. The reader is picked from the key
//! suffix by [`FileFormat`]; keys with any other suffix are reported as
//! unsupported without being fetched.

pub mod csv;
pub mod json;
pub mod xlsx;

use anyhow::Result;
use thiserror::Error;

use crate::frame::Frame;
use crate::s3::ObjectStore;

pub use self::csv::CsvViewer;
pub use self::xlsx::XlsxViewer;

/// Readable file formats, chosen by key suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
    Json,
    Unsupported,
}

impl FileFormat {
    /// Match on the exact trailing suffix; `data.CSV` is unsupported
    pub fn from_key(key: &str) -> Self {
        if key.ends_with(".csv") {
            FileFormat::Csv
        } else if key.ends_with(".xlsx") {
            FileFormat::Spreadsheet
        } else if key.ends_with(".json") {
            FileFormat::Json
        } else {
            FileFormat::Unsupported
        }
    }

    pub fn is_supported(&self) -> bool {
        *self != FileFormat::Unsupported
    }

    /// Parse a fetched body with this format's reader
    pub fn parse(&self, data: &[u8]) -> Result<Frame> {
        match self {
            FileFormat::Csv => CsvViewer::new().read_bytes(data),
            FileFormat::Spreadsheet => XlsxViewer::new().read_bytes(data),
            FileFormat::Json => json::read_bytes(data),
            FileFormat::Unsupported => anyhow::bail!("Unsupported file format"),
        }
    }
}

/// Why an object could not be turned into a frame
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file format")]
    Unsupported { key: String },

    #[error("{source:#}")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{source:#}")]
    Parse {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl LoadError {
    pub fn key(&self) -> &str {
        match self {
            LoadError::Unsupported { key } | LoadError::Fetch { key, .. } | LoadError::Parse { key, .. } => key,
        }
    }
}

/// Fetch one object and parse it into a frame
pub async fn load_object(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<Frame, LoadError> {
    let format = FileFormat::from_key(key);
    if !format.is_supported() {
        return Err(LoadError::Unsupported { key: key.to_string() });
    }

    let body = store
        .get_object(bucket, key)
        .await
        .map_err(|source| LoadError::Fetch {
            key: key.to_string(),
            source,
        })?;

    let frame = format.parse(&body).map_err(|source| LoadError::Parse {
        key: key.to_string(),
        source,
    })?;

    tracing::info!(
        "Loaded s3://{}/{} ({} rows, {} columns)",
        bucket,
        key,
        frame.num_rows(),
        frame.num_columns()
    );
    Ok(frame)
}
