//! CSV output formatter for similarity scan results.
//!
//! One row per similar pair, in pipeline order.
//!
//! # Columns
//!
//! - `score`: Jaccard similarity, six decimal places
//! - `path_a`: Outer (later discovered) file
//! - `path_b`: Inner (earlier discovered) file
//! - `size_a`: Size of `path_a` in bytes
//! - `size_b`: Size of `path_b` in bytes

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::similarity::SimilarPair;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    score: String,
    path_a: std::borrow::Cow<'a, str>,
    path_b: std::borrow::Cow<'a, str>,
    size_a: u64,
    size_b: u64,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    pairs: &'a [SimilarPair],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(pairs: &'a [SimilarPair]) -> Self {
        Self { pairs }
    }

    /// Write the CSV output to the given writer.
    ///
    /// The header row is written even when there are no pairs.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(["score", "path_a", "path_b", "size_a", "size_b"])?;

        for pair in self.pairs {
            csv_writer.serialize(CsvRow {
                score: format!("{:.6}", pair.score),
                path_a: pair.path_a.to_string_lossy(),
                path_b: pair.path_b.to_string_lossy(),
                size_a: pair.size_a,
                size_b: pair.size_b,
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    ///
    /// # Example
    ///
    /// ```
    /// use neardupe::output::csv::CsvOutput;
    /// let csv = CsvOutput::new(&[]).to_string().unwrap();
    /// assert_eq!(csv, "score,path_a,path_b,size_a,size_b\n");
    /// ```
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
