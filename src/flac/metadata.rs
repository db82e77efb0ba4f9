//! Metadata block headers and STREAMINFO
//!
//! Every metadata block starts with a 4-byte header:
//! LTTTTTTT NNNNNNNN NNNNNNNN NNNNNNNN
//!
//! L = last-metadata-block flag
//! T = block type (7 bits): 0 = STREAMINFO, 127 = invalid
//! N = length of the block data that follows (24 bits, big-endian)
//!
//! STREAMINFO data (34 bytes). Offsets below are counted from the start of
//! the block *header*, which is how blocks are handed to patchers:
//!
//! ```text
//!  4..6   min block size (16)
//!  6..8   max block size (16)
//!  8..11  min frame size (24), 0 = unknown
//! 11..14  max frame size (24), 0 = unknown
//! 14..17  sample rate (20) | channels-1 (3) | bits-1 (5) | total samples (36)
//!         RRRRRRRR RRRRRRRR RRRRCCCB ...
//! ```

use crate::error::FlacError;

pub const FLAC_MAGIC: &[u8; 4] = b"fLaC";
pub const BLOCK_HEADER_LEN: usize = 4;
pub const BLOCK_STREAMINFO: u8 = 0;
pub const STREAMINFO_LEN: usize = 34;

const BLOCK_TYPE_INVALID: u8 = 0x7F;

const MIN_FRAME_SIZE_AT: usize = 8;
const MAX_FRAME_SIZE_AT: usize = 11;
const SAMPLE_RATE_AT: usize = 14;

/// Read a 24-bit big-endian integer from `p[0..3]`.
pub fn read_u24(p: &[u8]) -> u32 {
    u32::from_be_bytes([0, p[0], p[1], p[2]])
}

/// Read the 20-bit STREAMINFO sample rate from a block (header included).
///
/// Layout: all of byte 14, all of byte 15, high nibble of byte 16.
pub fn read_sample_rate(block: &[u8]) -> u32 {
    let p = &block[SAMPLE_RATE_AT..SAMPLE_RATE_AT + 3];
    ((p[0] as u32) << 12) | ((p[1] as u32) << 4) | ((p[2] as u32) >> 4)
}

/// Overwrite the 20-bit STREAMINFO sample rate, keeping the low nibble of
/// byte 16 (channel count and top bit of the sample size).
pub fn write_sample_rate(block: &mut [u8], sample_rate: u32) {
    let p = &mut block[SAMPLE_RATE_AT..SAMPLE_RATE_AT + 3];
    p[0] = (sample_rate >> 12) as u8;
    p[1] = (sample_rate >> 4) as u8;
    p[2] = ((sample_rate << 4) as u8) | (p[2] & 0x0F);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataBlockHeader {
    pub is_last: bool,
    pub block_type: u8,
    /// Bytes of block data following the 4-byte header.
    pub len: usize,
}

impl MetadataBlockHeader {
    pub fn parse(p: &[u8]) -> Result<Self, FlacError> {
        if p.len() < BLOCK_HEADER_LEN {
            return Err(FlacError::TruncatedBlockHeader);
        }

        let block_type = p[0] & 0x7F;
        if block_type == BLOCK_TYPE_INVALID {
            return Err(FlacError::InvalidBlockType);
        }

        Ok(MetadataBlockHeader {
            is_last: p[0] & 0x80 != 0,
            block_type,
            len: read_u24(&p[1..4]) as usize,
        })
    }

    /// Header plus data.
    pub fn total_len(&self) -> usize {
        BLOCK_HEADER_LEN + self.len
    }
}

/// Facts read from STREAMINFO before anything is patched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamInfo {
    /// Smallest frame in bytes, 0 if unknown.
    pub min_frame_size: usize,
    /// Largest frame in bytes, 0 if unknown.
    pub max_frame_size: usize,
    pub sample_rate: u32,
}

impl StreamInfo {
    /// Parse a STREAMINFO block, header included.
    pub fn parse(block: &[u8]) -> Result<Self, FlacError> {
        let data_len = block.len().saturating_sub(BLOCK_HEADER_LEN);
        if data_len < STREAMINFO_LEN {
            return Err(FlacError::ShortStreamInfo(data_len));
        }

        Ok(StreamInfo {
            min_frame_size: read_u24(&block[MIN_FRAME_SIZE_AT..]) as usize,
            max_frame_size: read_u24(&block[MAX_FRAME_SIZE_AT..]) as usize,
            sample_rate: read_sample_rate(block),
        })
    }
}
