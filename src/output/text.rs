//! Plain text report.
//!
//! ```text
//! Read and processed 4 files.
//! B=8192 T=52
//! 0.962264
//!   docs/report-v2.odt
//!   docs/report-v1.odt
//! 48213,47790
//!
//! 1 similar pair among 4 files (186.4 KiB), 6 pairs compared, 0 skipped
//! ```
//!
//! Each match is a score line with six decimals, the outer and inner paths
//! indented by two spaces, their sizes separated by a comma, and a blank
//! line. The final summary line is optional.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use crate::similarity::{FingerprintConfig, ScanSummary, SimilarPair};

/// Text report writer.
pub struct TextOutput<'a> {
    pairs: &'a [SimilarPair],
    summary: &'a ScanSummary,
    config: &'a FingerprintConfig,
    color: bool,
    show_summary: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a report without color and with the summary line.
    #[must_use]
    pub fn new(
        pairs: &'a [SimilarPair],
        summary: &'a ScanSummary,
        config: &'a FingerprintConfig,
    ) -> Self {
        Self {
            pairs,
            summary,
            config,
            color: false,
            show_summary: true,
        }
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Include or omit the trailing summary line.
    #[must_use]
    pub fn with_summary(mut self, show: bool) -> Self {
        self.show_summary = show;
        self
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(
            writer,
            "Read and processed {} files.",
            self.summary.fingerprinted
        )?;
        writeln!(
            writer,
            "B={} T={}",
            self.config.bucket_count(),
            self.config.chunking_threshold()
        )?;

        for pair in self.pairs {
            let score = format!("{:.6}", pair.score);
            if self.color {
                writeln!(writer, "{}", score.green().bold())?;
            } else {
                writeln!(writer, "{score}")?;
            }
            writeln!(writer, "  {}", pair.path_a.display())?;
            writeln!(writer, "  {}", pair.path_b.display())?;
            writeln!(writer, "{},{}", pair.size_a, pair.size_b)?;
            writeln!(writer)?;
        }

        if self.show_summary {
            let noun = if self.pairs.len() == 1 { "pair" } else { "pairs" };
            let line = format!(
                "{} similar {} among {} files ({}), {} pairs compared, {} skipped",
                self.pairs.len(),
                noun,
                self.summary.total_files,
                ByteSize::b(self.summary.total_size),
                self.summary.pairs_compared,
                self.summary.skipped_count()
            );
            if self.color {
                writeln!(writer, "{}", line.dim())?;
            } else {
                writeln!(writer, "{line}")?;
            }
        }

        Ok(())
    }

    /// Render the report to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
