//! Rewrite the sample rate of FLAC files in place.
//!
//! The rate is stored in STREAMINFO and again in every frame header, and
//! each frame is covered by a header CRC-8 and a frame CRC-16. [`fix_bytes`]
//! walks the stream, finds every frame boundary and hands each block to a
//! [`Patcher`]; [`SampleRatePatcher`] updates the rate fields and re-stamps
//! the checksums. Nothing is decoded and the file never changes size.

pub mod batch;
pub mod config;
pub mod error;
pub mod flac;
pub mod logging;
pub mod patch;
pub mod report;

pub use error::{ErrorKind, FileError, FlacError};
pub use flac::{check_bytes, fix_bytes, ScanLimits, WalkStats};
pub use patch::{NullPatcher, Patcher, SampleRatePatcher};

/// Set every sample rate field in `flac` to `sample_rate`.
pub fn set_sample_rate(
    flac: &mut [u8],
    sample_rate: u32,
    limits: &ScanLimits,
) -> Result<WalkStats, FlacError> {
    let mut patcher = SampleRatePatcher::new(sample_rate)?;
    fix_bytes(flac, &mut patcher, limits)
}

/// Walk `flac` without changing it, checking every frame boundary and CRC.
pub fn verify(flac: &[u8], limits: &ScanLimits) -> Result<WalkStats, FlacError> {
    check_bytes(flac, limits)
}
