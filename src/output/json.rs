//! JSON output formatter for similarity scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2026-01-01T12:00:00+00:00",
//!   "settings": { "bucket_count": 8192, "chunking_threshold": 52, "match_threshold": 0.9 },
//!   "matches": [
//!     {
//!       "score": 0.95,
//!       "path_a": "docs/report-v2.odt",
//!       "path_b": "docs/report-v1.odt",
//!       "size_a": 48213,
//!       "size_b": 47790
//!     }
//!   ],
//!   "skipped": [
//!     { "path": "notes.txt", "kind": "undersized", "reason": "..." }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "fingerprinted": 97,
//!     "pairs_compared": 4656,
//!     "matches": 1,
//!     "exit_code": 0,
//!     "exit_code_name": "ND000"
//!   }
//! }
//! ```
//!
//! Paths are written as discovered. Matches keep the pipeline order.

use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use crate::error::ExitCode;
use crate::similarity::{FinderConfig, ScanSummary, SimilarPair, SkippedFile};

/// A single similar pair in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMatch {
    /// Jaccard similarity in `(0, 1]`
    pub score: f64,
    /// Outer (later discovered) file
    pub path_a: String,
    /// Inner (earlier discovered) file
    pub path_b: String,
    /// Size of `path_a` in bytes
    pub size_a: u64,
    /// Size of `path_b` in bytes
    pub size_b: u64,
}

impl From<&SimilarPair> for JsonMatch {
    fn from(pair: &SimilarPair) -> Self {
        Self {
            score: pair.score,
            path_a: pair.path_a.to_string_lossy().into_owned(),
            path_b: pair.path_b.to_string_lossy().into_owned(),
            size_a: pair.size_a,
            size_b: pair.size_b,
        }
    }
}

/// A file left out of the comparison.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSkipped {
    /// File path
    pub path: String,
    /// `read`, `degenerate`, `oversaturated` or `undersized`
    pub kind: &'static str,
    /// Human-readable reason
    pub reason: String,
}

impl From<&SkippedFile> for JsonSkipped {
    fn from(skipped: &SkippedFile) -> Self {
        Self {
            path: skipped.path.to_string_lossy().into_owned(),
            kind: skipped.kind,
            reason: skipped.reason.clone(),
        }
    }
}

/// Run parameters in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSettings {
    /// Fingerprint size in bytes
    pub bucket_count: usize,
    /// Chunk boundary threshold exponent
    pub chunking_threshold: u8,
    /// Minimum reported similarity
    pub match_threshold: f64,
}

impl From<&FinderConfig> for JsonSettings {
    fn from(config: &FinderConfig) -> Self {
        Self {
            bucket_count: config.fingerprint.bucket_count(),
            chunking_threshold: config.fingerprint.chunking_threshold(),
            match_threshold: config.match_threshold,
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Candidate files found by the walk
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Files fingerprinted into the corpus
    pub fingerprinted: usize,
    /// Files rejected for being exactly eight bytes
    pub skipped_degenerate: usize,
    /// Files rejected for producing too many chunks
    pub skipped_oversaturated: usize,
    /// Files rejected for producing too few chunks
    pub skipped_undersized: usize,
    /// Files that could not be read
    pub read_errors: usize,
    /// Directories or entries that could not be walked
    pub walk_errors: usize,
    /// Pairs scored
    pub pairs_compared: u64,
    /// Pairs without any shared bit
    pub incomparable_pairs: u64,
    /// Pairs reported
    pub matches: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "ND000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            fingerprinted: summary.fingerprinted,
            skipped_degenerate: summary.skipped_degenerate,
            skipped_oversaturated: summary.skipped_oversaturated,
            skipped_undersized: summary.skipped_undersized,
            read_errors: summary.read_errors.len(),
            walk_errors: summary.scan_errors.len(),
            pairs_compared: summary.pairs_compared,
            incomparable_pairs: summary.incomparable_pairs,
            matches: summary.matches,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// RFC 3339 timestamp of the report
    pub generated_at: String,
    /// Run parameters
    pub settings: JsonSettings,
    /// Similar pairs, in pipeline order
    pub matches: Vec<JsonMatch>,
    /// Files left out of the comparison
    pub skipped: Vec<JsonSkipped>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the report.
    ///
    /// # Example
    ///
    /// ```
    /// use neardupe::error::ExitCode;
    /// use neardupe::output::json::JsonOutput;
    /// use neardupe::similarity::{FinderConfig, ScanSummary};
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), &FinderConfig::default(), ExitCode::NoMatches);
    /// assert!(output.matches.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(
        pairs: &[SimilarPair],
        summary: &ScanSummary,
        config: &FinderConfig,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            settings: JsonSettings::from(config),
            matches: pairs.iter().map(JsonMatch::from).collect(),
            skipped: summary.skipped.iter().map(JsonSkipped::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
