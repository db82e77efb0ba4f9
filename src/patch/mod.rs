//! Per-block patching
//!
//! The walker finds block and frame boundaries; a [`Patcher`] decides what,
//! if anything, to change inside each one. Which method is called depends on
//! the phase of the walk, never on sniffing the bytes.

pub mod sample_rate;

pub use sample_rate::SampleRatePatcher;

use crate::error::FlacError;
use crate::flac::crc::{crc16, crc8};
use crate::flac::metadata::MetadataBlockHeader;

pub trait Patcher {
    /// Called once per metadata block. `block` includes the 4-byte block
    /// header described by `header`.
    fn patch_metadata(
        &mut self,
        header: &MetadataBlockHeader,
        block: &mut [u8],
    ) -> Result<(), FlacError>;

    /// Called once per audio frame. `frame` is the complete frame, from the
    /// sync code through the CRC-16 footer; the header (CRC-8 included) is
    /// `frame[..header_len]`.
    fn patch_frame(&mut self, frame: &mut [u8], header_len: usize) -> Result<(), FlacError>;
}

/// Changes nothing. Walking with it validates every frame boundary and
/// checksum without touching the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPatcher;

impl Patcher for NullPatcher {
    fn patch_metadata(
        &mut self,
        _header: &MetadataBlockHeader,
        _block: &mut [u8],
    ) -> Result<(), FlacError> {
        Ok(())
    }

    fn patch_frame(&mut self, _frame: &mut [u8], _header_len: usize) -> Result<(), FlacError> {
        Ok(())
    }
}

/// Re-stamp both checksums of an audio frame after its header changed.
///
/// Writes the header CRC-8 into `frame[header_len - 1]` and the CRC-16 into
/// the last two bytes. Nothing checks that `frame` really is a frame; the
/// caller guarantees `frame.len() >= header_len + 2` and `header_len >= 1`.
pub fn fix_crcs(frame: &mut [u8], header_len: usize) {
    frame[header_len - 1] = crc8(&frame[..header_len - 1]);

    let footer = frame.len() - 2;
    let crc = crc16(&frame[..footer]);
    frame[footer..].copy_from_slice(&crc.to_be_bytes());
}
