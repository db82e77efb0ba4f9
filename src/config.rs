//! Optional TOML configuration
//!
//! ```toml
//! rate = 48000
//!
//! [scan]
//! fallback_frame_size = 32768
//! ```
//!
//! Every key is optional; command line flags win over the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::flac::ScanLimits;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default target sample rate.
    pub rate: Option<u32>,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub fallback_frame_size: Option<usize>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Scan limits with unset keys at their defaults.
    pub fn limits(&self) -> ScanLimits {
        let mut limits = ScanLimits::default();
        if let Some(size) = self.scan.fallback_frame_size {
            limits.fallback_frame_size = size;
        }
        limits
    }
}
