//! Output formatters for similarity scan results.
//!
//! - [`text`]: the human-readable report
//! - [`json`]: machine-readable report for scripting
//! - [`csv`]: one row per pair for spreadsheets
//!
//! # Example
//!
//! ```no_run
//! use neardupe::output::csv::CsvOutput;
//! use neardupe::similarity::SimilarityFinder;
//! use std::path::PathBuf;
//!
//! let finder = SimilarityFinder::with_defaults();
//! let (pairs, _) = finder.find_similar(&[PathBuf::from(".")]).unwrap();
//!
//! CsvOutput::new(&pairs).write_to(std::io::stdout()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io::Write;

// Re-export main types
pub use self::csv::{CsvOutput, CsvOutputError};
pub use self::json::{JsonOutput, JsonOutputError};
pub use self::text::TextOutput;

use crate::cli::OutputFormat;
use crate::error::ExitCode;
use crate::similarity::{FinderConfig, ScanSummary, SimilarPair};

/// Errors from writing a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// Writing the text report failed.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the JSON report failed.
    #[error(transparent)]
    Json(#[from] JsonOutputError),

    /// Writing the CSV report failed.
    #[error(transparent)]
    Csv(#[from] CsvOutputError),
}

/// Everything a report needs about one finished scan.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    /// Similar pairs in pipeline order
    pub pairs: &'a [SimilarPair],
    /// Scan statistics
    pub summary: &'a ScanSummary,
    /// Run configuration
    pub config: &'a FinderConfig,
    /// Exit code the run will end with
    pub exit_code: ExitCode,
}

impl Report<'_> {
    /// Write the report in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if serialization or writing fails.
    pub fn write<W: Write>(
        &self,
        format: OutputFormat,
        writer: &mut W,
        color: bool,
    ) -> Result<(), OutputError> {
        match format {
            OutputFormat::Text => TextOutput::new(self.pairs, self.summary, &self.config.fingerprint)
                .with_color(color)
                .write_to(writer)?,
            OutputFormat::Json => {
                JsonOutput::new(self.pairs, self.summary, self.config, self.exit_code)
                    .write_to(writer, true)?;
            }
            OutputFormat::Csv => CsvOutput::new(self.pairs).write_to(&mut *writer)?,
        }
        writer.flush()?;
        Ok(())
    }
}
