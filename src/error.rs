//! Exit codes and structured errors.

use serde::Serialize;

/// Exit codes for the neardupe binary.
///
/// - 0: Scan completed and at least one similar pair was found
/// - 1: General error
/// - 2: Scan completed without any similar pair
/// - 3: Scan completed but some files could not be read
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Similar pairs were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// No pair reached the match threshold.
    NoMatches = 2,
    /// Completed, with per-file read errors.
    PartialSuccess = 3,
    /// Interrupted by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "ND000",
            Self::GeneralError => "ND001",
            Self::NoMatches => "ND002",
            Self::PartialSuccess => "ND003",
            Self::Interrupted => "ND130",
        }
    }

    /// Exit code for a finished scan.
    ///
    /// Read errors take precedence over the match outcome.
    #[must_use]
    pub fn for_scan(matches: usize, had_read_errors: bool) -> Self {
        if had_read_errors {
            Self::PartialSuccess
        } else if matches == 0 {
            Self::NoMatches
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "ND001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
