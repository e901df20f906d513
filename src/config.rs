//! Encoder configuration.
//!
//! Trimming itself is driven entirely by the command line. The optional
//! `trimimage.toml` only tunes how results are written.
//!
//! ## Config File Location
//!
//! ```text
//! photos/
//! ├── trimimage.toml     # picked up when trimming photos/ (or a pattern in it)
//! ├── 231.JPG
//! └── Corrected/
//! ```
//!
//! `--config <FILE>` takes precedence over the file in the base folder.
//!
//! ## Configuration Options
//!
//! ```toml
//! jpeg_quality = 90      # JPEG encoder quality (1-100)
//! fallback_dpi = 300.0   # stamped on outputs whose source has no DPI
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, Resolution, TrimSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the traversal base folder.
pub const CONFIG_FILE_NAME: &str = "trimimage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `trimimage.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimConfig {
    /// JPEG encoder quality (1 = worst, 100 = best).
    pub jpeg_quality: u32,
    /// DPI written to outputs whose source carries no resolution.
    pub fallback_dpi: Option<f32>,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: Quality::default().value(),
            fallback_dpi: None,
        }
    }
}

impl TrimConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(
                "jpeg_quality must be 1-100".into(),
            ));
        }
        if self
            .fallback_dpi
            .is_some_and(|dpi| !(dpi.is_finite() && dpi > 0.0))
        {
            return Err(ConfigError::Validation(
                "fallback_dpi must be a positive number".into(),
            ));
        }
        Ok(())
    }

    /// Encoder settings for the imaging layer.
    pub fn settings(&self) -> TrimSettings {
        TrimSettings {
            quality: Quality::new(self.jpeg_quality),
            fallback_resolution: self.fallback_dpi.map(Resolution::uniform),
        }
    }
}

fn read_config_file(path: &Path) -> Result<TrimConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: TrimConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// `explicit` (from `--config`) must exist. Without it, `trimimage.toml` in
/// `base_folder` is used when present, and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, base_folder: &Path) -> Result<TrimConfig, ConfigError> {
    if let Some(path) = explicit {
        log::debug!("Using config {}", path.display());
        return read_config_file(path);
    }

    let candidate = base_folder.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        log::debug!("Using config {}", candidate.display());
        return read_config_file(&candidate);
    }

    log::debug!("No {CONFIG_FILE_NAME} in {}, using defaults", base_folder.display());
    Ok(TrimConfig::default())
}

/// Returns a fully-commented stock `trimimage.toml` with all keys and explanations.
///
/// Used by the `--gen-config` flag.
pub fn stock_config_toml() -> &'static str {
    r##"# trimimage configuration
# =======================
# All settings are optional. Values shown below are the defaults.
#
# trimimage looks for this file in the folder being trimmed, or takes an
# explicit path with --config. Unknown keys will cause an error.

# JPEG encoder quality (1 = worst, 100 = best).
# Other formats are lossless and ignore this.
jpeg_quality = 90

# Resolution (dots per inch) stamped on JPEG and PNG outputs whose source
# carries no resolution of its own. Omit to leave such outputs unstamped.
# fallback_dpi = 300.0
"##
}
