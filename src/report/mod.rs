pub mod csv;
pub mod json;

use crate::batch::{FileResult, Status};
use std::io;
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, results: &[FileResult]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, results),
        _ => csv::write(&mut file, results),
    }
}

/// Summary statistics for a batch of results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub patched: usize,
    pub would_patch: usize,
    pub valid: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_results(results: &[FileResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for r in results {
            match r.status {
                Status::Patched => summary.patched += 1,
                Status::WouldPatch => summary.would_patch += 1,
                Status::Valid => summary.valid += 1,
                Status::Error => summary.error += 1,
            }
        }

        summary
    }

    pub fn has_errors(&self) -> bool {
        self.error > 0
    }
}
