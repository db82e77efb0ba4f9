//! Container walk
//!
//! A FLAC stream is the "fLaC" magic, a chain of metadata blocks ending with
//! the one flagged as last, then audio frames until the end of the buffer.
//! Metadata blocks declare their length. Frames don't, so each frame's end
//! is found by searching for the next frame header (see `resync`) and
//! confirming the whole frame with its CRC-16.
//!
//! When the CRC-16 check fails, the candidate boundary was most likely a
//! valid-looking header inside the frame payload. The search then resumes
//! one byte past it, extending the running CRC-16 over the skipped bytes,
//! until the CRC comes out zero or the search range runs out.

use tracing::{debug, warn};

use crate::error::FlacError;
use crate::flac::crc::{crc16, crc16_update};
use crate::flac::frame::{
    is_explicit_rate_code, is_sync, FrameHeader, FRAME_HEADER_MAX_LEN, FRAME_HEADER_MIN_LEN,
};
use crate::flac::metadata::{MetadataBlockHeader, StreamInfo, BLOCK_STREAMINFO, FLAC_MAGIC};
use crate::flac::resync::find_frame_header;
use crate::patch::Patcher;

/// Default bound for treating an undelimited tail as the final frame.
pub const DEFAULT_FALLBACK_FRAME_SIZE: usize = 16 * 1024;

/// Tunable bounds for the frame search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// When no next frame header can be found, the rest of the buffer is
    /// accepted as the last frame only if it is at most this long (or at
    /// most STREAMINFO's max frame size).
    pub fallback_frame_size: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            fallback_frame_size: DEFAULT_FALLBACK_FRAME_SIZE,
        }
    }
}

/// What a walk saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub metadata_blocks: usize,
    pub frames: usize,
    /// Frames whose first candidate end failed the CRC-16 check and whose
    /// real end was found by continuing the search.
    pub recovered_boundaries: usize,
    /// The last frame had no following header and was taken as the tail of
    /// the buffer.
    pub tail_fallback: bool,
    /// Frames whose coded rate differed from STREAMINFO's before patching.
    /// Frames that defer to STREAMINFO (code 0) never count.
    pub rate_mismatches: usize,
    /// First STREAMINFO block, as it was before patching.
    pub stream_info: Option<StreamInfo>,
}

/// Where one frame ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameExtent {
    header_len: usize,
    len: usize,
    sample_rate: Option<u32>,
    recovered: bool,
    tail_fallback: bool,
}

/// One delimited piece of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Metadata {
        offset: usize,
        header: MetadataBlockHeader,
    },
    Frame {
        offset: usize,
        len: usize,
        header_len: usize,
    },
}

/// Walk position and everything learned so far.
///
/// Measuring a segment only reads bytes from its own start onwards, so a
/// caller may patch each segment before asking for the next one.
struct Walk {
    pos: usize,
    in_frames: bool,
    bounds: StreamInfo,
    limits: ScanLimits,
    stats: WalkStats,
}

impl Walk {
    fn start(flac: &[u8], limits: &ScanLimits) -> Result<Self, FlacError> {
        if flac.len() < FLAC_MAGIC.len() {
            return Err(FlacError::TooShort);
        }
        if &flac[..FLAC_MAGIC.len()] != FLAC_MAGIC {
            return Err(FlacError::NotFlac);
        }

        Ok(Walk {
            pos: FLAC_MAGIC.len(),
            in_frames: false,
            bounds: StreamInfo::default(),
            limits: *limits,
            stats: WalkStats::default(),
        })
    }

    fn next_segment(&mut self, flac: &[u8]) -> Result<Option<Segment>, FlacError> {
        if self.in_frames {
            self.next_frame(flac)
        } else {
            self.next_metadata_block(flac).map(Some)
        }
    }

    fn next_metadata_block(&mut self, flac: &[u8]) -> Result<Segment, FlacError> {
        let p = &flac[self.pos..];
        if p.is_empty() {
            return Err(FlacError::MissingMetadata);
        }

        let header = MetadataBlockHeader::parse(p)?;
        if p.len() < header.total_len() {
            return Err(FlacError::TruncatedBlock);
        }

        if header.block_type == BLOCK_STREAMINFO && self.stats.stream_info.is_none() {
            self.stats.stream_info = Some(StreamInfo::parse(&p[..header.total_len()])?);
        }

        debug!(
            offset = self.pos,
            block_type = header.block_type,
            len = header.len,
            "metadata block"
        );

        let segment = Segment::Metadata {
            offset: self.pos,
            header,
        };
        self.stats.metadata_blocks += 1;
        self.pos += header.total_len();
        if header.is_last {
            self.in_frames = true;
            self.bounds = self.stats.stream_info.unwrap_or_default();
        }
        Ok(segment)
    }

    fn next_frame(&mut self, flac: &[u8]) -> Result<Option<Segment>, FlacError> {
        let pos = self.pos;
        if pos >= flac.len() {
            return Ok(None);
        }

        let extent = frame_extent(&flac[pos..], &self.bounds, &self.limits, pos)?;
        assert!(extent.len > 0, "no progress at frame {:#x}", pos);

        if extent.len < extent.header_len + 2 {
            return Err(FlacError::ShortFrame {
                offset: pos,
                len: extent.len,
            });
        }

        debug!(offset = pos, len = extent.len, "frame");
        if let (Some(coded), Some(si)) = (extent.sample_rate, self.stats.stream_info) {
            if coded != si.sample_rate {
                warn!(
                    frame = pos,
                    coded,
                    stream = si.sample_rate,
                    "frame at {:#x} is coded at {} Hz, STREAMINFO says {} Hz",
                    pos,
                    coded,
                    si.sample_rate
                );
                self.stats.rate_mismatches += 1;
            }
        }

        self.stats.frames += 1;
        if extent.recovered {
            self.stats.recovered_boundaries += 1;
        }
        self.stats.tail_fallback = extent.tail_fallback;
        self.pos += extent.len;

        Ok(Some(Segment::Frame {
            offset: pos,
            len: extent.len,
            header_len: extent.header_len,
        }))
    }
}

/// Walk a whole FLAC stream in place, handing every metadata block and every
/// audio frame to `patcher`.
///
/// The buffer never changes length. On error it may already be partly
/// patched.
pub fn fix_bytes<P: Patcher + ?Sized>(
    flac: &mut [u8],
    patcher: &mut P,
    limits: &ScanLimits,
) -> Result<WalkStats, FlacError> {
    let mut walk = Walk::start(flac, limits)?;

    while let Some(segment) = walk.next_segment(flac)? {
        match segment {
            Segment::Metadata { offset, header } => {
                let block = &mut flac[offset..offset + header.total_len()];
                patcher.patch_metadata(&header, block)?;
            }
            Segment::Frame {
                offset,
                len,
                header_len,
            } => patcher.patch_frame(&mut flac[offset..offset + len], header_len)?,
        }
    }

    Ok(walk.stats)
}

/// Walk a whole FLAC stream without changing it, checking every frame
/// boundary and CRC-16. Same result as [`fix_bytes`] with a `NullPatcher`.
pub fn check_bytes(flac: &[u8], limits: &ScanLimits) -> Result<WalkStats, FlacError> {
    let mut walk = Walk::start(flac, limits)?;
    while walk.next_segment(flac)?.is_some() {}
    Ok(walk.stats)
}

/// Measure the frame starting at `p[0]`. `offset` is only used for messages.
fn frame_extent(
    p: &[u8],
    bounds: &StreamInfo,
    limits: &ScanLimits,
    offset: usize,
) -> Result<FrameExtent, FlacError> {
    if p.len() < FRAME_HEADER_MIN_LEN {
        return Err(FlacError::TruncatedFrameHeader);
    }
    if !is_sync(p) {
        return Err(FlacError::InvalidSync);
    }
    if is_explicit_rate_code(p[2] & 0x0F) {
        return Err(FlacError::NonstandardFrameRate);
    }
    let header = FrameHeader::parse(p)?;
    let header_len = header.len;

    // A frame can't end before its own header does, nor before the smallest
    // frame STREAMINFO promises. The next header starts no later than the
    // largest frame plus a maximal header.
    let search_end = if bounds.max_frame_size > 0 {
        (bounds.max_frame_size + FRAME_HEADER_MAX_LEN).min(p.len())
    } else {
        p.len()
    };
    let search_start = header_len.max(bounds.min_frame_size).min(search_end);

    let found = find_frame_header(&p[search_start..search_end]).map(|i| search_start + i);
    let mut boundary = found.unwrap_or(search_end);

    let mut tail_fallback = false;
    let end = match found {
        Some(next) => next,
        None if p.len() <= limits.fallback_frame_size || p.len() <= bounds.max_frame_size => {
            // Presumably the last frame
            tail_fallback = true;
            p.len()
        }
        None => return Err(FlacError::NextFrameNotFound { offset }),
    };

    let mut crc = crc16(&p[..end]);
    if crc == 0 {
        return Ok(FrameExtent {
            header_len,
            len: end,
            sample_rate: header.sample_rate(),
            recovered: false,
            tail_fallback,
        });
    }

    // The candidate was a false positive; keep looking
    while crc != 0 && boundary + 1 < search_end {
        warn!(
            frame = offset,
            candidate = offset + boundary,
            "possibly bogus frame header found at {:#x}",
            offset + boundary
        );
        let Some(i) = find_frame_header(&p[boundary + 1..search_end]) else {
            break;
        };
        let next = boundary + 1 + i;
        crc = crc16_update(crc, &p[boundary..next]);
        boundary = next;
    }

    if crc != 0 {
        return Err(FlacError::FooterCrc { offset });
    }

    debug!(frame = offset, end = offset + boundary, "recovered frame end");
    Ok(FrameExtent {
        header_len,
        len: boundary,
        sample_rate: header.sample_rate(),
        recovered: true,
        tail_fallback: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flac::crc::crc8;
    use crate::flac::testutil::{frame, streaminfo, FlacBuilder};
    use crate::patch::{NullPatcher, SampleRatePatcher};

    fn walk(data: &mut [u8]) -> Result<WalkStats, FlacError> {
        fix_bytes(data, &mut NullPatcher, &ScanLimits::default())
    }

    /// Split a walked buffer back into frames using the frame offsets the
    /// builder recorded, and check both CRCs on each.
    fn assert_checksums_close(data: &[u8], offsets: &[usize]) {
        for (i, &start) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(data.len());
            let frame = &data[start..end];
            let header_len = FrameHeader::parse(frame).expect("header").len;
            assert_eq!(crc8(&frame[..header_len]), 0, "frame {} header CRC", i);
            assert_eq!(crc16(frame), 0, "frame {} CRC-16", i);
        }
    }

    // ==========================================================================
    // MAGIC AND METADATA
    // ==========================================================================

    #[test]
    fn test_too_short() {
        // Truncated to 3 bytes: an error, not a panic
        let mut data = b"fLa".to_vec();
        assert_eq!(walk(&mut data), Err(FlacError::TooShort));
        assert_eq!(walk(&mut []), Err(FlacError::TooShort));
    }

    #[test]
    fn test_not_flac() {
        let mut data = b"RIFF\x00\x00\x00\x00WAVE".to_vec();
        assert_eq!(walk(&mut data), Err(FlacError::NotFlac));
    }

    #[test]
    fn test_magic_only() {
        let mut data = b"fLaC".to_vec();
        assert_eq!(walk(&mut data), Err(FlacError::MissingMetadata));
    }

    #[test]
    fn test_metadata_chain_without_last_flag() {
        // One STREAMINFO not flagged as last, then nothing
        let mut data = b"fLaC".to_vec();
        data.extend(streaminfo(false, 0, 0, 44100));
        assert_eq!(walk(&mut data), Err(FlacError::MissingMetadata));
    }

    #[test]
    fn test_truncated_metadata() {
        let mut data = b"fLaC".to_vec();
        data.extend(streaminfo(true, 0, 0, 44100));

        let mut header_cut = data[..6].to_vec();
        assert_eq!(walk(&mut header_cut), Err(FlacError::TruncatedBlockHeader));

        let mut block_cut = data[..20].to_vec();
        assert_eq!(walk(&mut block_cut), Err(FlacError::TruncatedBlock));
    }

    #[test]
    fn test_invalid_block_type() {
        let mut data = b"fLaC".to_vec();
        data.extend([0xFF, 0x00, 0x00, 0x00]);
        assert_eq!(walk(&mut data), Err(FlacError::InvalidBlockType));
    }

    #[test]
    fn test_metadata_only_stream() {
        let mut data = FlacBuilder::new(44100).padding(8).build().data;
        let stats = walk(&mut data).expect("Should walk");
        assert_eq!(stats.metadata_blocks, 2);
        assert_eq!(stats.frames, 0);
        assert_eq!(stats.stream_info.map(|si| si.sample_rate), Some(44100));
    }

    // ==========================================================================
    // FRAMES
    // ==========================================================================

    #[test]
    fn test_walk_several_frames() {
        let built = FlacBuilder::new(44100)
            .frame(&[0x01, 0x02, 0x03])
            .frame(&[0x04; 40])
            .frame(&[])
            .frame(&[0x05; 7])
            .build();
        let mut data = built.data.clone();

        let stats = walk(&mut data).expect("Should walk");
        assert_eq!(stats.frames, 4);
        assert_eq!(stats.recovered_boundaries, 0);
        assert!(stats.tail_fallback);
        assert_eq!(data, built.data, "NullPatcher must not change anything");
    }

    #[test]
    fn test_frame_size_hints_from_streaminfo() {
        // Known min/max frame sizes narrow the search window; the walk must
        // still find every boundary
        let built = FlacBuilder::new(44100)
            .frame(&[0x10; 20])
            .frame(&[0x20; 24])
            .frame(&[0x30; 22])
            .with_frame_size_hints()
            .build();
        let mut data = built.data;

        let stats = walk(&mut data).expect("Should walk");
        assert_eq!(stats.frames, 3);
        let si = stats.stream_info.expect("STREAMINFO");
        assert_eq!(si.min_frame_size, 28);
        assert_eq!(si.max_frame_size, 32);
    }

    #[test]
    fn test_patch_44100_to_48000() {
        let built = FlacBuilder::new(44100)
            .frame(&[0x00; 4])
            .frame(&[0x5A; 9])
            .build();
        let mut data = built.data.clone();

        let mut patcher = SampleRatePatcher::new(48000).expect("standard rate");
        let stats = fix_bytes(&mut data, &mut patcher, &ScanLimits::default()).expect("Should patch");

        assert_eq!(stats.frames, 2);
        assert_eq!(data.len(), built.data.len());
        assert_eq!(crate::flac::metadata::read_sample_rate(&data[4..]), 48000);
        for &start in &built.frame_offsets {
            assert_eq!(data[start + 2] & 0x0F, 10);
        }
        assert_checksums_close(&data, &built.frame_offsets);
    }

    #[test]
    fn test_bad_sync_after_metadata() {
        let mut data = FlacBuilder::new(44100).build().data;
        data.extend([0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE]);
        assert_eq!(walk(&mut data), Err(FlacError::InvalidSync));
    }

    #[test]
    fn test_truncated_frame_header() {
        let mut data = FlacBuilder::new(44100).build().data;
        data.extend([0xFF, 0xF8, 0xC9]);
        assert_eq!(walk(&mut data), Err(FlacError::TruncatedFrameHeader));
    }

    #[test]
    fn test_explicit_rate_frame_rejected_untouched() {
        // 0xC spells the rate out in one extra header byte, 0xD and 0xE in two
        for code in [0xC, 0xD, 0xE] {
            let built = FlacBuilder::new(44100)
                .frame(&[0x01; 5])
                .frame_with_rate_code(code, &[0x2C, 0x02, 0x03])
                .build();
            let mut data = built.data.clone();

            let mut patcher = SampleRatePatcher::new(48000).expect("standard rate");
            let result = fix_bytes(&mut data, &mut patcher, &ScanLimits::default());
            assert_eq!(result, Err(FlacError::NonstandardFrameRate), "code {:X}", code);

            // The offending frame is exactly as it was
            let second = built.frame_offsets[1];
            assert_eq!(&data[second..], &built.data[second..], "code {:X}", code);
        }
    }

    #[test]
    fn test_short_tail_without_footer() {
        // A header followed by a single byte can't hold a CRC-16 footer
        let mut data = FlacBuilder::new(44100).build().data;
        let offset = data.len();
        data.extend(frame(0x9, 0, &[]));
        data.truncate(offset + 7);
        assert_eq!(
            walk(&mut data),
            Err(FlacError::FooterCrc { offset })
        );
    }

    #[test]
    fn test_corrupted_frame_fails_footer_crc() {
        let built = FlacBuilder::new(44100)
            .frame(&[0x11; 12])
            .frame(&[0x22; 12])
            .build();
        let mut data = built.data;
        let first = built.frame_offsets[0];
        data[first + 8] ^= 0x40;

        assert_eq!(
            walk(&mut data),
            Err(FlacError::FooterCrc { offset: first })
        );
    }

    #[test]
    fn test_undelimited_tail_too_long() {
        // No next header and more than the fallback bound left: give up
        let built = FlacBuilder::new(44100).frame(&[0x00; 200]).build();
        let mut data = built.data;
        let limits = ScanLimits {
            fallback_frame_size: 64,
        };
        assert_eq!(
            fix_bytes(&mut data, &mut NullPatcher, &limits),
            Err(FlacError::NextFrameNotFound {
                offset: built.frame_offsets[0]
            })
        );
    }

    // ==========================================================================
    // SEARCH WINDOW EDGES
    // ==========================================================================
    //
    // STREAMINFO's frame sizes only narrow the search. The window is clamped
    // to what is left of the buffer, so hints that don't fit the data (a
    // short last frame, min > max) shrink it to nothing rather than slicing
    // out of bounds.
    // ==========================================================================

    /// Magic, a last-flagged STREAMINFO with the given frame size hints,
    /// then `frames`.
    fn stream_with_hints(min: u32, max: u32, frames: &[Vec<u8>]) -> Vec<u8> {
        let mut data = b"fLaC".to_vec();
        data.extend(streaminfo(true, min, max, 44100));
        for f in frames {
            data.extend(f);
        }
        data
    }

    #[test]
    fn test_tail_accepted_up_to_max_frame_size() {
        // 208-byte last frame, well past a 64-byte fallback bound, but no
        // bigger than the max frame size STREAMINFO promises
        let built = FlacBuilder::new(44100)
            .frame(&[0x00; 200])
            .with_frame_size_hints()
            .build();
        let mut data = built.data;
        let limits = ScanLimits {
            fallback_frame_size: 64,
        };

        let stats = fix_bytes(&mut data, &mut NullPatcher, &limits).expect("Should walk");
        assert_eq!(stats.frames, 1);
        assert!(stats.tail_fallback);
        let si = stats.stream_info.expect("STREAMINFO");
        assert_eq!(si.max_frame_size, 208);
    }

    #[test]
    fn test_last_frame_shorter_than_min_frame_size() {
        // 48-byte frame, then a 12-byte one; STREAMINFO claims nothing is
        // under 30 bytes
        let frames = [frame(0x9, 0, &[0x00; 40]), frame(0x9, 1, &[0x00; 4])];
        let mut data = stream_with_hints(30, 48, &frames);

        let stats = walk(&mut data).expect("Should walk");
        assert_eq!(stats.frames, 2);
        assert!(stats.tail_fallback);
    }

    #[test]
    fn test_min_frame_size_above_max() {
        let frames = [frame(0x9, 0, &[0x00; 10])];
        let mut data = stream_with_hints(10_000, 20, &frames);

        let stats = walk(&mut data).expect("Should walk");
        assert_eq!(stats.frames, 1);
        assert!(stats.tail_fallback);
    }

    // ==========================================================================
    // READ-ONLY CHECK
    // ==========================================================================

    #[test]
    fn test_check_bytes_matches_null_patcher() {
        let built = FlacBuilder::new(22050)
            .padding(16)
            .frame(&[0x01; 9])
            .frame(&[0x02; 30])
            .frame(&[0x03; 2])
            .build();
        let mut data = built.data.clone();

        let read_only = check_bytes(&built.data, &ScanLimits::default()).expect("Should check");
        let walked = walk(&mut data).expect("Should walk");
        assert_eq!(read_only, walked);
        assert_eq!(read_only.metadata_blocks, 2);
        assert_eq!(read_only.frames, 3);
    }

    #[test]
    fn test_check_bytes_reports_errors() {
        assert_eq!(
            check_bytes(b"fLa", &ScanLimits::default()),
            Err(FlacError::TooShort)
        );

        let built = FlacBuilder::new(44100).frame(&[0x11; 12]).build();
        let mut data = built.data;
        let first = built.frame_offsets[0];
        data[first + 8] ^= 0x40;
        assert_eq!(
            check_bytes(&data, &ScanLimits::default()),
            Err(FlacError::FooterCrc { offset: first })
        );
    }

    #[test]
    fn test_frame_rate_mismatches_counted() {
        // Stream says 44.1kHz; frame 1 is coded 48kHz, frame 2 defers to
        // STREAMINFO (code 0) and does not count
        let built = FlacBuilder::new(44100)
            .frame(&[0x01; 3])
            .frame_with_rate_code(0xA, &[0x02; 5])
            .frame_with_rate_code(0x0, &[0x03; 2])
            .build();

        let stats = check_bytes(&built.data, &ScanLimits::default()).expect("Should check");
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.rate_mismatches, 1);
    }

    // ==========================================================================
    // RESYNCHRONIZATION UNDER PAYLOAD NOISE
    // ==========================================================================
    //
    // A payload can contain a byte sequence that is a perfectly valid frame
    // header: sync code, sane fields, correct CRC-8. Taking it as the next
    // frame would cut the current frame short. The CRC-16 over the short
    // span is wrong, so the walker keeps searching and extends the CRC until
    // it lands on the real boundary.
    // ==========================================================================

    #[test]
    fn test_bogus_header_in_payload() {
        let bogus = frame(0x9, 5, &[]);
        let mut payload = vec![0x11, 0x22];
        payload.extend(&bogus[..6]);
        payload.extend([0x33; 10]);

        let built = FlacBuilder::new(44100)
            .frame(&payload)
            .frame(&[0x44; 8])
            .build();
        let mut data = built.data.clone();

        let stats = walk(&mut data).expect("Should walk");
        assert_eq!(stats.frames, 2, "bogus header must not split the frame");
        assert_eq!(stats.recovered_boundaries, 1);

        let mut patched = built.data.clone();
        let mut patcher = SampleRatePatcher::new(96000).expect("standard rate");
        fix_bytes(&mut patched, &mut patcher, &ScanLimits::default()).expect("Should patch");
        assert_checksums_close(&patched, &built.frame_offsets);

        // The bogus header inside the payload is payload, and stays as it was
        let bogus_at = built.frame_offsets[0] + 6 + 2;
        assert_eq!(&patched[bogus_at..bogus_at + 6], &bogus[..6]);
    }

    #[test]
    fn test_bogus_header_in_last_frame_is_not_recovered() {
        // Recovery only ever extends to another header candidate. A false
        // header inside the final frame leaves nothing to extend to, and the
        // tail fallback only applies when no candidate was found at all.
        let bogus = frame(0xA, 1, &[]);
        let mut payload = vec![0x01];
        payload.extend(&bogus[..6]);
        payload.extend([0x02; 3]);

        let built = FlacBuilder::new(48000).frame(&payload).build();
        let mut data = built.data;
        assert_eq!(
            walk(&mut data),
            Err(FlacError::FooterCrc {
                offset: built.frame_offsets[0]
            })
        );
    }
}
