//! Dashboard settings
//!
//! Read from the platform-specific app config folder:
//! - Linux: ~/.config/s3-dashboard/settings.json
//! - Windows: %APPDATA%/s3-dashboard/settings.json
//! - macOS: ~/Library/Application Support/s3-dashboard/settings.json
//!
//! Credentials are never part of the settings.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::s3::{ConnectOptions, DEFAULT_REGIONS};

/// One fixed-prefix browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Heading shown above the file picker
    pub title: String,
    /// Key prefix listed by the view
    pub prefix: String,
}

impl ViewSettings {
    fn new(title: &str, prefix: &str) -> Self {
        Self {
            title: title.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

/// Dashboard settings; every field falls back to its default when missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bucket every view reads from
    pub bucket: String,

    /// The three fixed-prefix browsers, in tab order
    pub views: [ViewSettings; 3],

    /// Regions offered in the sidebar; the first is preselected
    pub regions: Vec<String>,

    /// Address the HTTP server listens on
    pub bind_address: String,

    /// S3-compatible endpoint to use instead of AWS
    pub endpoint_url: Option<String>,

    /// Path-style addressing, needed by most S3-compatible stores
    pub force_path_style: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bucket: "azimuth-venue-analysis".to_string(),
            views: [
                ViewSettings::new("Azimuth Venue Analysis", "Azimuth_Delivery/Azimuth_venue_analysis/"),
                ViewSettings::new("Deduplicate Data", "Azimuth_Delivery/Deduplicate data/"),
                ViewSettings::new("Untreated Data", "Azimuth_Delivery/Untreated data/"),
            ],
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            bind_address: "127.0.0.1:8501".to_string(),
            endpoint_url: None,
            force_path_style: false,
        }
    }
}

impl Settings {
    /// Load settings from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Settings file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {:?}", path))?;

        settings
            .validate()
            .with_context(|| format!("Invalid settings in {:?}", path))?;

        tracing::info!(
            "Loaded settings: bucket={}, endpoint={:?}",
            settings.bucket,
            settings.endpoint_url
        );

        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, contents).with_context(|| format!("Failed to write settings to {:?}", path))?;

        tracing::debug!("Saved settings to {:?}", path);

        Ok(())
    }

    /// Get the path to the settings file
    pub fn settings_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "github.n-orlov", "s3-dashboard")
            .context("Failed to determine settings directory")?;

        Ok(proj_dirs.config_dir().join("settings.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            bail!("bucket must not be empty");
        }
        if self.regions.is_empty() {
            bail!("at least one region must be configured");
        }
        if let Some(endpoint) = &self.endpoint_url {
            let url = Url::parse(endpoint).with_context(|| format!("endpoint_url {:?} is not a valid URL", endpoint))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("endpoint_url must use http or https, got {}", url.scheme());
            }
        }
        Ok(())
    }

    /// Region preselected in the sidebar
    pub fn default_region(&self) -> &str {
        self.regions.first().map(String::as_str).unwrap_or(DEFAULT_REGIONS[0])
    }

    pub fn is_known_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    /// Client options derived from the endpoint settings
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            endpoint_url: self.endpoint_url.clone(),
            force_path_style: self.force_path_style,
        }
    }
}
