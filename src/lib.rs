//! neardupe - format-agnostic near-duplicate file finder
//!
//! Files are split into content-defined chunks, each chunk hash sets one bit
//! of a fixed-size fingerprint, and every pair of fingerprints is scored by
//! Jaccard similarity. Pairs at or above the match threshold are reported.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod similarity;

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, FingerprintArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::Report;
use crate::progress::Progress;
use crate::similarity::{fingerprint_file, FingerprintConfig, SimilarityFinder};

/// Run the application for parsed arguments.
///
/// # Errors
///
/// Returns an error for invalid settings, an interrupted scan, or a
/// failure to write the report. Unreadable roots and files are reported in
/// the summary and end the run with [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let Cli {
        verbose,
        quiet,
        no_color,
        config: config_path,
        profile,
        command,
        ..
    } = cli;

    logging::init_logging(verbose, quiet, no_color);
    if no_color {
        yansi::disable();
    }

    let config = Config::load(config_path.as_deref(), profile.as_deref());
    log::debug!("Effective configuration: {:?}", config);

    match command {
        Commands::Scan(args) => run_scan(config, &args, quiet, no_color),
        Commands::Fingerprint(args) => run_fingerprint(&config, &args),
    }
}

fn run_scan(
    mut config: Config,
    args: &ScanArgs,
    quiet: bool,
    no_color: bool,
) -> anyhow::Result<ExitCode> {
    config.merge_scan_args(args);

    let handler = signal::install_handler()?;
    let mut finder_config = config
        .finder_settings()
        .context("Invalid scan settings")?
        .with_shutdown_flag(handler.flag());

    let show_progress =
        !quiet && config.output == OutputFormat::Text && std::io::stderr().is_terminal();
    if show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = SimilarityFinder::new(finder_config);
    let (pairs, summary) = finder.find_similar(&args.paths)?;

    let exit_code = ExitCode::for_scan(pairs.len(), summary.has_read_errors());
    let report = Report {
        pairs: &pairs,
        summary: &summary,
        config: finder.config(),
        exit_code,
    };

    let stdout = std::io::stdout();
    let color = !no_color && stdout.is_terminal();
    report
        .write(config.output, &mut stdout.lock(), color)
        .context("Failed to write report")?;

    Ok(exit_code)
}

fn run_fingerprint(config: &Config, args: &FingerprintArgs) -> anyhow::Result<ExitCode> {
    let fingerprint_config = FingerprintConfig::new(
        args.buckets.unwrap_or(config.bucket_count),
        args.chunk_threshold.unwrap_or(config.chunking_threshold),
    )?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut read_errors = 0usize;

    writeln!(
        out,
        "B={} T={}",
        fingerprint_config.bucket_count(),
        fingerprint_config.chunking_threshold()
    )?;

    for path in &args.files {
        match fingerprint_file(path, &fingerprint_config) {
            Ok((Ok(fingerprint), size)) => {
                writeln!(
                    out,
                    "{}: ok, {} bytes, {} chunks, {} bits set",
                    path.display(),
                    size,
                    fingerprint.chunk_count(),
                    fingerprint.count_ones()
                )?;
                if args.hex {
                    writeln!(out, "{}", fingerprint.to_hex())?;
                }
            }
            Ok((Err(e), size)) => {
                writeln!(out, "{}: {}, {} bytes: {}", path.display(), e.kind(), size, e)?;
            }
            Err(e) => {
                log::warn!("{}", e);
                writeln!(out, "{}: read error", path.display())?;
                read_errors += 1;
            }
        }
    }

    out.flush()?;
    Ok(if read_errors > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}
