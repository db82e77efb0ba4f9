//! Synthetic FLAC streams for tests

use crate::flac::crc::{crc16, crc8};
use crate::flac::frame::sample_rate_code;
use crate::flac::metadata::write_sample_rate;

/// A STREAMINFO block, header included: 4096-sample blocks, mono, 16-bit.
pub fn streaminfo(is_last: bool, min_frame_size: u32, max_frame_size: u32, rate: u32) -> Vec<u8> {
    let mut block = vec![0u8; 38];
    block[0] = if is_last { 0x80 } else { 0x00 };
    block[3] = 34;
    block[4..8].copy_from_slice(&[0x10, 0x00, 0x10, 0x00]);
    block[8..11].copy_from_slice(&min_frame_size.to_be_bytes()[1..]);
    block[11..14].copy_from_slice(&max_frame_size.to_be_bytes()[1..]);
    block[17] = 0xF0;
    write_sample_rate(&mut block, rate);
    block
}

/// A complete frame with valid CRCs. For explicit rate codes (0xC-0xE) the
/// first 1 or 2 bytes of `body` become the header's rate bytes.
pub fn frame(rate_code: u8, number: u8, body: &[u8]) -> Vec<u8> {
    assert!(number < 0x80, "single-byte frame numbers only");
    let extra = match rate_code {
        0xC => 1,
        0xD | 0xE => 2,
        _ => 0,
    };

    let mut frame = vec![0xFF, 0xF8, 0xC0 | rate_code, 0x08, number];
    frame.extend(&body[..extra]);
    frame.push(crc8(&frame));
    frame.extend(&body[extra..]);
    let crc = crc16(&frame);
    frame.extend(crc.to_be_bytes());
    frame
}

pub struct Built {
    pub data: Vec<u8>,
    /// Start of each audio frame in `data`.
    pub frame_offsets: Vec<usize>,
}

pub struct FlacBuilder {
    rate: u32,
    padding: Option<usize>,
    frames: Vec<Vec<u8>>,
    frame_size_hints: bool,
}

impl FlacBuilder {
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            padding: None,
            frames: Vec::new(),
            frame_size_hints: false,
        }
    }

    /// Add a PADDING block after STREAMINFO.
    pub fn padding(mut self, len: usize) -> Self {
        self.padding = Some(len);
        self
    }

    /// Add a frame coded at the stream's own rate.
    pub fn frame(self, payload: &[u8]) -> Self {
        let code = sample_rate_code(self.rate).expect("standard rate");
        self.frame_with_rate_code(code, payload)
    }

    pub fn frame_with_rate_code(mut self, rate_code: u8, body: &[u8]) -> Self {
        let number = self.frames.len() as u8;
        self.frames.push(frame(rate_code, number, body));
        self
    }

    /// Record the real min/max frame sizes in STREAMINFO.
    pub fn with_frame_size_hints(mut self) -> Self {
        self.frame_size_hints = true;
        self
    }

    pub fn build(self) -> Built {
        let (min, max) = if self.frame_size_hints {
            let sizes = self.frames.iter().map(|f| f.len() as u32);
            (sizes.clone().min().unwrap_or(0), sizes.max().unwrap_or(0))
        } else {
            (0, 0)
        };

        let mut data = b"fLaC".to_vec();
        data.extend(streaminfo(self.padding.is_none(), min, max, self.rate));
        if let Some(len) = self.padding {
            data.extend([0x81]);
            data.extend(&(len as u32).to_be_bytes()[1..]);
            data.extend(vec![0u8; len]);
        }

        let mut frame_offsets = Vec::new();
        for frame in self.frames {
            frame_offsets.push(data.len());
            data.extend(frame);
        }

        Built {
            data,
            frame_offsets,
        }
    }
}
