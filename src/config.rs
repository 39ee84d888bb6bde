//! TOML configuration file support.
//!
//! Instead of passing many CLI flags, users can keep settings in a config
//! file:
//!
//! ```toml
//! # hwlog.toml
//! [ambient]
//! column_name = "Ambient [°C]"
//! calibration_offset_c = 4.0
//! tolerance_seconds = 2.0
//!
//! [load]
//! chunk_rows = 25000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure for hwlog.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Ambient merge settings.
    #[serde(default)]
    pub ambient: AmbientConfig,

    /// Streaming loader settings.
    #[serde(default)]
    pub load: LoadConfig,
}

/// Configuration for the ambient merge step.
#[derive(Debug, Default, Deserialize)]
pub struct AmbientConfig {
    /// Output column name for the merged ambient series.
    pub column_name: Option<String>,

    /// Calibration offset subtracted from every raw reading (°C).
    pub calibration_offset_c: Option<f64>,

    /// Hard cutoff for the nearest-timestamp join (seconds).
    pub tolerance_seconds: Option<f64>,
}

/// Configuration for the windowed streaming loader.
#[derive(Debug, Default, Deserialize)]
pub struct LoadConfig {
    /// Physical data rows per chunk.
    pub chunk_rows: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
