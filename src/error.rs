//! Errors raised while walking or patching a FLAC buffer
//!
//! Every error is fatal to the file being processed. Nothing is retried: a
//! failure means either malformed input or an exhausted bounded search, and
//! neither changes on a second attempt.

use std::io;

use serde::Serialize;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FlacError {
    #[error("file too short")]
    TooShort,
    #[error("not a FLAC file")]
    NotFlac,
    #[error("expected a metadata block")]
    MissingMetadata,
    #[error("truncated metadata block header")]
    TruncatedBlockHeader,
    #[error("invalid metadata block type")]
    InvalidBlockType,
    #[error("truncated metadata block")]
    TruncatedBlock,
    #[error("STREAMINFO block too short ({0} bytes)")]
    ShortStreamInfo(usize),
    #[error("truncated frame header")]
    TruncatedFrameHeader,
    #[error("invalid frame sync code")]
    InvalidSync,
    #[error("frame has invalid frame/sample number field")]
    InvalidFrameNumber,
    #[error("frame at {offset:#x} is too short ({len} bytes)")]
    ShortFrame { offset: usize, len: usize },
    #[error("couldn't find next frame after {offset:#x}")]
    NextFrameNotFound { offset: usize },
    #[error("invalid frame footer CRC at {offset:#x}")]
    FooterCrc { offset: usize },
    #[error("frame uses a nonstandard sample rate")]
    NonstandardFrameRate,
    #[error("{0} Hz is not a standard sample rate")]
    UnsupportedRate(u32),
    #[error("STREAMINFO: found sample rate of 0, which is invalid")]
    ZeroStreamRate,
    #[error("STREAMINFO: found nonstandard sample rate {0}, which is unsupported")]
    NonstandardStreamRate(u32),
    #[error("STREAMINFO: sample rate is already {0}")]
    AlreadyAtRate(u32),
}

/// Coarse classification of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Structurally malformed input.
    Format,
    /// No plausible next frame within the search bounds.
    Resync,
    /// Frame CRC-16 still wrong after bounded recovery.
    Checksum,
    /// Explicit or nonstandard sample rate.
    UnsupportedRate,
    /// STREAMINFO already carries the target rate.
    Noop,
    /// Reading, mapping or flushing the file failed.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Format => write!(f, "format"),
            ErrorKind::Resync => write!(f, "resync"),
            ErrorKind::Checksum => write!(f, "checksum"),
            ErrorKind::UnsupportedRate => write!(f, "unsupported-rate"),
            ErrorKind::Noop => write!(f, "noop"),
            ErrorKind::Io => write!(f, "io"),
        }
    }
}

impl FlacError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlacError::TooShort
            | FlacError::NotFlac
            | FlacError::MissingMetadata
            | FlacError::TruncatedBlockHeader
            | FlacError::InvalidBlockType
            | FlacError::TruncatedBlock
            | FlacError::ShortStreamInfo(_)
            | FlacError::TruncatedFrameHeader
            | FlacError::InvalidSync
            | FlacError::InvalidFrameNumber
            | FlacError::ShortFrame { .. }
            | FlacError::ZeroStreamRate => ErrorKind::Format,
            FlacError::NextFrameNotFound { .. } => ErrorKind::Resync,
            FlacError::FooterCrc { .. } => ErrorKind::Checksum,
            FlacError::NonstandardFrameRate
            | FlacError::UnsupportedRate(_)
            | FlacError::NonstandardStreamRate(_) => ErrorKind::UnsupportedRate,
            FlacError::AlreadyAtRate(_) => ErrorKind::Noop,
        }
    }
}

/// Failure processing one file: the walk itself, or getting the bytes in
/// and out.
#[derive(thiserror::Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Flac(#[from] FlacError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::Flac(e) => e.kind(),
            FileError::Io(_) => ErrorKind::Io,
        }
    }
}
