//! flacrate - rewrite the sample rate of FLAC files without re-encoding
//!
//! ```bash
//! # Relabel a 44.1k rip as 48k, in place
//! flacrate --rate 48000 album/*.flac
//!
//! # See what would happen first
//! flacrate --rate 48000 --dry-run album/*.flac
//!
//! # Validate framing and checksums only
//! flacrate --check --report report.json album/*.flac
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use flacrate::batch::{FileResult, Mode, Rewriter, Status};
use flacrate::config::Config;
use flacrate::flac::frame::is_standard_rate;
use flacrate::flac::STANDARD_RATES;
use flacrate::report::{self, Summary};

#[derive(Parser, Debug)]
#[command(name = "flacrate")]
#[command(version)]
#[command(about = "Change the sample rate of FLAC files in place, without re-encoding")]
struct Cli {
    /// Target sample rate in Hz
    #[arg(short, long, value_parser = parse_rate)]
    rate: Option<u32>,

    /// Only validate frame boundaries and checksums
    #[arg(long, conflicts_with_all = ["dry_run", "rate"])]
    check: bool,

    /// Patch in memory and report, but write nothing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Write per-file results (JSON for .json, CSV otherwise)
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Largest tail frame accepted without a STREAMINFO size hint
    #[arg(long, value_name = "BYTES")]
    fallback_frame_size: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// FLAC files to process
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

fn rate_list() -> String {
    STANDARD_RATES
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_rate(s: &str) -> Result<u32, String> {
    let rate: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a sample rate", s))?;
    if is_standard_rate(rate) {
        Ok(rate)
    } else {
        Err(format!(
            "{} Hz is not supported; choose one of {}",
            rate,
            rate_list()
        ))
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = flacrate::logging::init(cli.verbose) {
        eprintln!("{} {}", "warning:".yellow(), e);
    }

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let mut limits = config.limits();
    if let Some(size) = cli.fallback_frame_size {
        limits.fallback_frame_size = size;
    }

    let mode = if cli.check {
        Mode::Check
    } else {
        let sample_rate = match cli.rate.or(config.rate) {
            Some(rate) if is_standard_rate(rate) => rate,
            Some(rate) => {
                eprintln!(
                    "{} config rate {} Hz is not supported; choose one of {}",
                    "error:".red().bold(),
                    rate,
                    rate_list()
                );
                return ExitCode::FAILURE;
            }
            None => {
                eprintln!(
                    "{} no target rate; pass --rate or set `rate` in the config",
                    "error:".red().bold()
                );
                return ExitCode::FAILURE;
            }
        };
        if cli.dry_run {
            Mode::DryRun { sample_rate }
        } else {
            Mode::Patch { sample_rate }
        }
    };

    let rewriter = Rewriter::new(mode).with_limits(limits);
    let mut results = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let result = rewriter.process(path);
        print_result(&result);
        results.push(result);
    }

    let summary = Summary::from_results(&results);
    print_summary(&summary);

    if let Some(path) = &cli.report {
        match report::generate(path, &results) {
            Ok(()) => println!("Report written to {}", path.display()),
            Err(e) => {
                eprintln!(
                    "{} failed to write report {}: {}",
                    "error:".red().bold(),
                    path.display(),
                    e
                );
                return ExitCode::FAILURE;
            }
        }
    }

    if summary.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_result(r: &FileResult) {
    let rates = match (r.stream_rate, r.target_rate) {
        (Some(from), Some(to)) => format!("{} -> {} Hz", from, to),
        (Some(rate), None) => format!("{} Hz", rate),
        _ => String::new(),
    };
    let mut detail = format!("{}, {} frames", rates, r.frames);
    if r.recovered_boundaries > 0 {
        detail.push_str(&format!(", {} recovered", r.recovered_boundaries));
    }
    if r.rate_mismatches > 0 {
        detail.push_str(&format!(", {} at another rate", r.rate_mismatches));
    }

    match r.status {
        Status::Patched => println!("{} {} ({})", "PATCHED".green().bold(), r.file_path, detail),
        Status::WouldPatch => println!(
            "{} {} ({})",
            "WOULD PATCH".cyan().bold(),
            r.file_path,
            detail
        ),
        Status::Valid => println!("{} {} ({})", "VALID".green(), r.file_path, detail),
        Status::Error => eprintln!(
            "{}: {}",
            format!("{:?}", r.file_path).red(),
            r.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn print_summary(s: &Summary) {
    if s.total < 2 {
        return;
    }
    let mut parts = Vec::new();
    if s.patched > 0 {
        parts.push(format!("{} patched", s.patched).green().to_string());
    }
    if s.would_patch > 0 {
        parts.push(format!("{} would patch", s.would_patch).cyan().to_string());
    }
    if s.valid > 0 {
        parts.push(format!("{} valid", s.valid).green().to_string());
    }
    if s.error > 0 {
        parts.push(format!("{} failed", s.error).red().to_string());
    }
    println!("\n{} files: {}", s.total, parts.join(", "));
}
