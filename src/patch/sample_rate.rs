//! Sample rate rewriting
//!
//! The rate lives in two places: the 20-bit field in STREAMINFO and the
//! 4-bit rate code in every frame header. Frames that spell their rate out
//! in extra header bytes (codes 0xC-0xE) would need the header to change
//! length, which the in-place approach cannot do, so they are refused.

use tracing::debug;

use super::{fix_crcs, Patcher};
use crate::error::FlacError;
use crate::flac::frame::{is_explicit_rate_code, is_standard_rate, sample_rate_code};
use crate::flac::metadata::{write_sample_rate, MetadataBlockHeader, StreamInfo, BLOCK_STREAMINFO};

/// A [`Patcher`] that sets every sample rate field to one target rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRatePatcher {
    sample_rate: u32,
    code: u8,
}

impl SampleRatePatcher {
    /// Fails with [`FlacError::UnsupportedRate`] unless `sample_rate` has a
    /// frame header code.
    pub fn new(sample_rate: u32) -> Result<Self, FlacError> {
        let code = sample_rate_code(sample_rate).ok_or(FlacError::UnsupportedRate(sample_rate))?;
        Ok(Self { sample_rate, code })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Patcher for SampleRatePatcher {
    fn patch_metadata(
        &mut self,
        header: &MetadataBlockHeader,
        block: &mut [u8],
    ) -> Result<(), FlacError> {
        // Only STREAMINFO carries a rate
        if header.block_type != BLOCK_STREAMINFO {
            return Ok(());
        }

        let file_rate = StreamInfo::parse(block)?.sample_rate;
        if file_rate == 0 {
            return Err(FlacError::ZeroStreamRate);
        }
        // Re-running on an already patched file is almost always a mistake,
        // so it is reported rather than skipped
        if file_rate == self.sample_rate {
            return Err(FlacError::AlreadyAtRate(self.sample_rate));
        }
        if !is_standard_rate(file_rate) {
            return Err(FlacError::NonstandardStreamRate(file_rate));
        }

        debug!(from = file_rate, to = self.sample_rate, "STREAMINFO sample rate");
        write_sample_rate(block, self.sample_rate);
        Ok(())
    }

    fn patch_frame(&mut self, frame: &mut [u8], header_len: usize) -> Result<(), FlacError> {
        if is_explicit_rate_code(frame[2] & 0x0F) {
            return Err(FlacError::NonstandardFrameRate);
        }

        frame[2] = (frame[2] & 0xF0) | self.code;
        fix_crcs(frame, header_len);
        Ok(())
    }
}
