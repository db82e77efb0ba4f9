pub mod mapped;

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ErrorKind, FileError};
use crate::flac::{ScanLimits, WalkStats};
use crate::{set_sample_rate, verify};

/// What to do with each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rewrite the file in place.
    Patch { sample_rate: u32 },
    /// Patch an in-memory copy and report what would happen.
    DryRun { sample_rate: u32 },
    /// Walk the file and validate every checksum, changing nothing.
    Check,
}

impl Mode {
    pub fn target_rate(&self) -> Option<u32> {
        match *self {
            Mode::Patch { sample_rate } | Mode::DryRun { sample_rate } => Some(sample_rate),
            Mode::Check => None,
        }
    }
}

/// Outcome for a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file_path: String,
    pub file_name: String,
    pub status: Status,
    /// Rate found in STREAMINFO before patching.
    pub stream_rate: Option<u32>,
    pub target_rate: Option<u32>,
    pub metadata_blocks: usize,
    pub frames: usize,
    pub recovered_boundaries: usize,
    /// Frames coded at a rate other than STREAMINFO's.
    pub rate_mismatches: usize,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Patched,
    WouldPatch,
    Valid,
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Patched => write!(f, "PATCHED"),
            Status::WouldPatch => write!(f, "WOULD PATCH"),
            Status::Valid => write!(f, "VALID"),
            Status::Error => write!(f, "ERROR"),
        }
    }
}

/// Applies one [`Mode`] to any number of files. A failure is recorded in
/// that file's result and never stops the batch.
#[derive(Debug, Clone)]
pub struct Rewriter {
    pub mode: Mode,
    pub limits: ScanLimits,
}

impl Rewriter {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            limits: ScanLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ScanLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Process every file in order.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<FileResult> {
        paths.iter().map(|p| self.process(p)).collect()
    }

    /// Process a single file
    pub fn process<P: AsRef<Path>>(&self, path: P) -> FileResult {
        let path = path.as_ref();
        let file_path = path.display().to_string();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.clone());

        let mut result = FileResult {
            file_path,
            file_name,
            status: Status::Error,
            stream_rate: None,
            target_rate: self.mode.target_rate(),
            metadata_blocks: 0,
            frames: 0,
            recovered_boundaries: 0,
            rate_mismatches: 0,
            error: None,
            error_kind: None,
        };

        match self.walk(path) {
            Ok(stats) => {
                result.status = match self.mode {
                    Mode::Patch { .. } => Status::Patched,
                    Mode::DryRun { .. } => Status::WouldPatch,
                    Mode::Check => Status::Valid,
                };
                result.stream_rate = stats.stream_info.map(|si| si.sample_rate);
                result.metadata_blocks = stats.metadata_blocks;
                result.frames = stats.frames;
                result.recovered_boundaries = stats.recovered_boundaries;
                result.rate_mismatches = stats.rate_mismatches;
                info!(
                    file = %result.file_path,
                    frames = stats.frames,
                    recovered = stats.recovered_boundaries,
                    "{}",
                    result.status
                );
            }
            Err(e) => {
                warn!(file = %result.file_path, kind = %e.kind(), "{}", e);
                result.error_kind = Some(e.kind());
                result.error = Some(e.to_string());
            }
        }

        result
    }

    fn walk(&self, path: &Path) -> Result<WalkStats, FileError> {
        let limits = &self.limits;
        match self.mode {
            Mode::Patch { sample_rate } => {
                mapped::with_mapped_file(path, |data| set_sample_rate(data, sample_rate, limits))
            }
            Mode::DryRun { sample_rate } => {
                mapped::with_file_copy(path, |data| set_sample_rate(data, sample_rate, limits))
            }
            Mode::Check => mapped::with_readonly_map(path, |data| verify(data, limits)),
        }
    }
}
