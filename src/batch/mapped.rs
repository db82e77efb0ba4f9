//! Getting file bytes in front of the walker
//!
//! Patching works on a shared writable mapping, so only the handful of bytes
//! that change are ever written back. Checks map the file read-only. Dry runs
//! patch a private copy read into memory.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapMut};

use crate::error::{FileError, FlacError};

/// Run `f` over the file's bytes, mapped read-write, and flush on success.
///
/// A failing `f` may already have changed some bytes; those changes reach
/// the file like any other write to the mapping.
pub fn with_mapped_file<T, F>(path: &Path, f: F) -> Result<T, FileError>
where
    F: FnOnce(&mut [u8]) -> Result<T, FlacError>,
{
    let file = OpenOptions::new().read(true).write(true).open(path)?;
    if file.metadata()?.len() == 0 {
        // Empty files can't be mapped
        return Ok(f(&mut [])?);
    }

    // SAFETY: the mapping is only used for the duration of this call. Another
    // process truncating the file underneath us is not guarded against, just
    // as with any memory-mapped editor.
    let mut map = unsafe { MmapMut::map_mut(&file)? };
    let out = f(&mut map[..])?;
    map.flush()?;
    Ok(out)
}

/// Run `f` over the file's bytes, mapped read-only.
pub fn with_readonly_map<T, F>(path: &Path, f: F) -> Result<T, FileError>
where
    F: FnOnce(&[u8]) -> Result<T, FlacError>,
{
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(f(&[])?);
    }

    // SAFETY: as for `with_mapped_file`; the mapping never outlives this call.
    let map = unsafe { Mmap::map(&file)? };
    Ok(f(&map[..])?)
}

/// Run `f` over an in-memory copy of the file; the file is not touched.
pub fn with_file_copy<T, F>(path: &Path, f: F) -> Result<T, FileError>
where
    F: FnOnce(&mut [u8]) -> Result<T, FlacError>,
{
    let mut data = std::fs::read(path)?;
    Ok(f(&mut data)?)
}
