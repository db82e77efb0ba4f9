pub mod crc;
pub mod frame;
pub mod metadata;
pub mod resync;
pub mod varint;
pub mod walker;

#[cfg(test)]
pub(crate) mod testutil;

pub use frame::{FrameHeader, STANDARD_RATES};
pub use metadata::{MetadataBlockHeader, StreamInfo};
pub use walker::{check_bytes, fix_bytes, ScanLimits, WalkStats};
