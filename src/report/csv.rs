//! CSV report generation

use crate::batch::FileResult;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, results: &[FileResult]) -> io::Result<()> {
    writeln!(
        writer,
        "status,filepath,stream_rate,target_rate,metadata_blocks,frames,recovered,error_kind,error"
    )?;

    for r in results {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            r.status,
            escape_csv(&r.file_path),
            or_dash(r.stream_rate),
            or_dash(r.target_rate),
            r.metadata_blocks,
            r.frames,
            r.recovered_boundaries,
            or_dash(r.error_kind),
            escape_csv(r.error.as_deref().unwrap_or(""))
        )?;
    }

    Ok(())
}

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
