//! JSON report generation

use crate::batch::FileResult;
use crate::report::Summary;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    summary: JsonSummary,
    files: &'a [FileResult],
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    patched: usize,
    would_patch: usize,
    valid: usize,
    error: usize,
}

pub fn write<W: Write>(writer: &mut W, results: &[FileResult]) -> io::Result<()> {
    let summary = Summary::from_results(results);

    let report = JsonReport {
        generated: chrono::Utc::now().to_rfc3339(),
        summary: JsonSummary {
            total: summary.total,
            patched: summary.patched,
            would_patch: summary.would_patch,
            valid: summary.valid,
            error: summary.error,
        },
        files: results,
    };

    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;

    writer.write_all(json.as_bytes())
}
