//! Frame boundary search
//!
//! Frames carry no length field, so the end of a frame is found by looking
//! for the start of the next one: the sync code followed by a header whose
//! CRC-8 checks out. The 14-bit sync code alone shows up all the time inside
//! compressed audio; requiring a valid header CRC makes a false positive
//! rare, and the walker's CRC-16 check catches the ones that remain.

use crate::flac::crc::crc8;
use crate::flac::frame::{is_sync, FrameHeader};

/// Offset of the first plausible frame header in `p`, if any.
///
/// A candidate must start with the sync code, parse as a complete header
/// inside `p`, and have a CRC-8 of zero over the header including its own
/// CRC byte.
pub fn find_frame_header(p: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < p.len() {
        i += p[i..].iter().position(|&b| b == 0xFF)?;

        if is_sync(&p[i..]) {
            if let Ok(header) = FrameHeader::parse(&p[i..]) {
                if crc8(&p[i..i + header.len]) == 0 {
                    return Some(i);
                }
            }
        }

        i += 1;
    }
    None
}
