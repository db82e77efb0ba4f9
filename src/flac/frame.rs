//! FLAC frame header parsing
//!
//! FLAC frames start with a 14-bit sync code followed by header info.
//! Frame header structure:
//! AAAAAAAA AAAAAABC DDDDEEEE FFFFGGGH [number] [block size] [rate] CCCCCCCC
//!
//! A = sync (14 bits, 11111111 111110)
//! B = reserved
//! C = blocking strategy (0 = fixed, 1 = variable)
//! D = block size code (4 bits): 0x6/0x7 = 8/16-bit value stored after the number
//! E = sample rate code (4 bits): 0xC/0xD/0xE = 8/16/16-bit value stored after
//!     the block size, 0xF = invalid
//! F = channel assignment (4 bits)
//! G = sample size code (3 bits)
//! H = reserved
//! number = frame or sample number, 1-7 bytes (see `varint`)
//! CCCCCCCC = CRC-8 of everything before it
//!
//! Frames carry no length field. The payload that follows the header is
//! opaque here; a frame ends where the next one begins.

use crate::error::FlacError;
use crate::flac::varint::varint_length;

/// Shortest possible header: 4 fixed bytes, 1-byte number, CRC-8.
pub const FRAME_HEADER_MIN_LEN: usize = 4 + 1 + 1;
/// Longest possible header: 4 fixed bytes, 7-byte number, 16-bit block size,
/// 16-bit sample rate, CRC-8.
pub const FRAME_HEADER_MAX_LEN: usize = 4 + 7 + 2 + 2 + 1;

/// The eleven rates that have a 4-bit code in the frame header.
pub const STANDARD_RATES: [u32; 11] = [
    8000, 16000, 22050, 24000, 32000, 44100, 48000, 88200, 96000, 176400, 192000,
];

// Frame header sample rate codes (Hz); 0 = "see STREAMINFO", 12-15 are not
// plain rates.
const CODED_RATES: [u32; 12] = [
    0, 88200, 176400, 192000, 8000, 16000, 22050, 24000, 32000, 44100, 48000, 96000,
];

/// True when `p` starts with the frame sync code `11111111 111110xx`.
pub fn is_sync(p: &[u8]) -> bool {
    p.len() >= 2 && p[0] == 0xFF && p[1] & !0x03 == 0xF8
}

/// True for rate codes that defer the sample rate to extra header bytes.
pub fn is_explicit_rate_code(code: u8) -> bool {
    matches!(code, 0xC..=0xE)
}

/// The 4-bit frame header code for a standard sample rate.
pub fn sample_rate_code(sample_rate: u32) -> Option<u8> {
    CODED_RATES
        .iter()
        .skip(1)
        .position(|&r| r == sample_rate)
        .map(|i| i as u8 + 1)
}

/// The sample rate a 4-bit frame header code stands for, if it names one.
pub fn coded_sample_rate(code: u8) -> Option<u32> {
    match CODED_RATES.get(code as usize) {
        Some(&0) | None => None,
        Some(&rate) => Some(rate),
    }
}

pub fn is_standard_rate(sample_rate: u32) -> bool {
    STANDARD_RATES.contains(&sample_rate)
}

/// Layout facts of one frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub variable_blocking: bool,
    pub block_size_code: u8,
    pub sample_rate_code: u8,
    /// Header length in bytes, including the trailing CRC-8.
    pub len: usize,
}

impl FrameHeader {
    /// Work out where the header starting at `p[0]` ends.
    ///
    /// Explicit sample rate codes (0xC-0xE) are counted as occupying their
    /// extra bytes; deciding whether to accept them is up to the caller.
    /// Nothing past the computed header length is read, and nothing past the
    /// end of `p` is ever touched.
    pub fn parse(p: &[u8]) -> Result<Self, FlacError> {
        if p.len() < 4 {
            return Err(FlacError::TruncatedFrameHeader);
        }
        if !is_sync(p) {
            return Err(FlacError::InvalidSync);
        }

        let block_size_code = p[2] >> 4;
        let sample_rate_code = p[2] & 0x0F;

        let mut len = 5;
        len += match block_size_code {
            0x6 => 1,
            0x7 => 2,
            _ => 0,
        };
        len += match sample_rate_code {
            0xC => 1,
            0xD | 0xE => 2,
            _ => 0,
        };

        let (n, valid) = varint_length(&p[4..]);
        if !valid {
            return Err(if 4 + n > p.len() {
                FlacError::TruncatedFrameHeader
            } else {
                FlacError::InvalidFrameNumber
            });
        }
        len += n;

        if len > p.len() {
            return Err(FlacError::TruncatedFrameHeader);
        }

        Ok(FrameHeader {
            variable_blocking: p[1] & 0x01 != 0,
            block_size_code,
            sample_rate_code,
            len,
        })
    }

    pub fn has_explicit_rate(&self) -> bool {
        is_explicit_rate_code(self.sample_rate_code)
    }

    /// Sample rate named by the header's rate code, if it names one.
    pub fn sample_rate(&self) -> Option<u32> {
        coded_sample_rate(self.sample_rate_code)
    }
}
