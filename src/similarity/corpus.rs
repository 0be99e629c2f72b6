//! Corpus storage and all-pairs comparison.
//!
//! # Overview
//!
//! A [`Corpus`] is the ordered set of successfully fingerprinted files of a
//! run. Records are appended in discovery order and never change afterwards.
//! [`compare_corpus`] scores every unordered pair exactly once and keeps the
//! pairs at or above the match threshold.
//!
//! Pair order is fixed: outer index ascending, then inner index ascending,
//! with `inner < outer`. Rows are scored in parallel but collected in row
//! order, so the result is reproducible across runs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::fingerprint::{Fingerprint, FingerprintConfig};
use super::jaccard::jaccard_similarity;

/// A fingerprinted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path as discovered
    pub path: PathBuf,
    /// Length of the file in bytes when fingerprinted
    pub size: u64,
    /// The file's fingerprint
    pub fingerprint: Fingerprint,
}

impl FileRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, fingerprint: Fingerprint) -> Self {
        Self {
            path,
            size,
            fingerprint,
        }
    }
}

/// Corpus storage could not grow.
#[derive(thiserror::Error, Debug)]
#[error("Out of memory while growing the corpus to {requested} records")]
pub struct CorpusAllocError {
    /// Record count that could not be reserved
    pub requested: usize,
}

/// Rejected record: built under a different configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Fingerprint for {path} has {actual} bits, corpus expects {expected}")]
pub struct MismatchedFingerprint {
    /// File whose fingerprint was rejected
    pub path: PathBuf,
    /// Bit length required by the corpus
    pub expected: usize,
    /// Bit length of the rejected fingerprint
    pub actual: usize,
}

/// Errors from adding a record to a corpus.
#[derive(thiserror::Error, Debug)]
pub enum CorpusError {
    /// Storage could not grow.
    #[error(transparent)]
    Alloc(#[from] CorpusAllocError),

    /// Fingerprint length does not match the corpus configuration.
    #[error(transparent)]
    Mismatched(#[from] MismatchedFingerprint),
}

/// Ordered, append-only collection of fingerprinted files.
#[derive(Debug, Clone)]
pub struct Corpus {
    config: FingerprintConfig,
    records: Vec<FileRecord>,
}

impl Corpus {
    /// Create an empty corpus for fingerprints built with `config`.
    #[must_use]
    pub fn new(config: FingerprintConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
        }
    }

    /// Configuration every record was built with.
    #[must_use]
    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Reserve room for `additional` more records.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusAllocError`] if the allocator refuses.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CorpusAllocError> {
        self.records
            .try_reserve(additional)
            .map_err(|_| CorpusAllocError {
                requested: self.records.len().saturating_add(additional),
            })
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::Mismatched`] if the fingerprint length differs
    /// from the corpus configuration, or [`CorpusError::Alloc`] if storage
    /// cannot grow.
    pub fn push(&mut self, record: FileRecord) -> Result<(), CorpusError> {
        let expected = self.config.bloom_bits();
        if record.fingerprint.bit_len() != expected {
            return Err(MismatchedFingerprint {
                path: record.path,
                expected,
                actual: record.fingerprint.bit_len(),
            }
            .into());
        }
        self.try_reserve(1)?;
        self.records.push(record);
        Ok(())
    }

    /// Records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FileRecord> {
        self.records.get(index)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of unordered pairs, `n * (n - 1) / 2`.
    #[must_use]
    pub fn pair_count(&self) -> u64 {
        let n = self.records.len() as u64;
        n * n.saturating_sub(1) / 2
    }
}

/// A scored pair of corpus records.
///
/// `a` is the outer (later) index and `b` the inner (earlier) one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Jaccard similarity in `(0, 1]`
    pub score: f64,
    /// Outer record index
    pub a: usize,
    /// Inner record index, always less than `a`
    pub b: usize,
}

/// Counters from one comparison pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareStats {
    /// Pairs scored
    pub pairs_compared: u64,
    /// Pairs whose fingerprints shared no bits
    pub incomparable_pairs: u64,
    /// Pairs at or above the threshold
    pub matches: usize,
    /// Whether the pass stopped early on shutdown
    pub interrupted: bool,
}

/// Callback invoked after each finished comparison row.
pub type RowCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Options for [`compare_corpus`].
#[derive(Clone, Default)]
pub struct CompareOptions {
    /// Optional shutdown flag, polled once per row.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional callback invoked after each finished row with the row index.
    pub on_row: Option<RowCallback>,
}

impl std::fmt::Debug for CompareOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompareOptions")
            .field("shutdown_flag", &self.shutdown_flag)
            .field("on_row", &self.on_row.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl CompareOptions {
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

struct RowOutcome {
    matches: Vec<MatchResult>,
    compared: u64,
    incomparable: u64,
}

/// Score every unordered pair of `corpus` and keep those with
/// `score >= threshold`.
///
/// Runs on the current rayon pool. Results are ordered by outer index, then
/// inner index.
#[must_use]
pub fn compare_corpus(
    corpus: &Corpus,
    threshold: f64,
    options: &CompareOptions,
) -> (Vec<MatchResult>, CompareStats) {
    let records = corpus.records();

    let rows: Vec<RowOutcome> = (0..records.len())
        .into_par_iter()
        .map(|a| {
            if options.is_shutdown_requested() {
                return RowOutcome {
                    matches: Vec::new(),
                    compared: 0,
                    incomparable: 0,
                };
            }
            let outcome = compare_row(records, a, threshold);
            if let Some(ref on_row) = options.on_row {
                on_row(a);
            }
            outcome
        })
        .collect();

    let mut stats = CompareStats {
        interrupted: options.is_shutdown_requested(),
        ..Default::default()
    };
    let mut matches = Vec::new();
    for row in rows {
        stats.pairs_compared += row.compared;
        stats.incomparable_pairs += row.incomparable;
        matches.extend(row.matches);
    }
    stats.matches = matches.len();

    log::debug!(
        "Compared {} pairs: {} matches, {} incomparable",
        stats.pairs_compared,
        stats.matches,
        stats.incomparable_pairs
    );

    (matches, stats)
}

fn compare_row(records: &[FileRecord], a: usize, threshold: f64) -> RowOutcome {
    let outer = &records[a].fingerprint;
    let mut outcome = RowOutcome {
        matches: Vec::new(),
        compared: 0,
        incomparable: 0,
    };

    for (b, inner) in records[..a].iter().enumerate() {
        outcome.compared += 1;
        match jaccard_similarity(outer, &inner.fingerprint) {
            Some(score) if score >= threshold => {
                log::trace!(
                    "Match {:.6}: {} ~ {}",
                    score,
                    records[a].path.display(),
                    inner.path.display()
                );
                outcome.matches.push(MatchResult { score, a, b });
            }
            Some(_) => {}
            None => outcome.incomparable += 1,
        }
    }
    outcome
}

/// A match resolved to paths and sizes for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarPair {
    /// Jaccard similarity
    pub score: f64,
    /// Path of the outer record
    pub path_a: PathBuf,
    /// Path of the inner record
    pub path_b: PathBuf,
    /// Size of the outer record in bytes
    pub size_a: u64,
    /// Size of the inner record in bytes
    pub size_b: u64,
}

impl SimilarPair {
    /// Resolve a match against its corpus.
    ///
    /// Returns `None` if either index is out of range.
    #[must_use]
    pub fn resolve(corpus: &Corpus, result: &MatchResult) -> Option<Self> {
        let a = corpus.get(result.a)?;
        let b = corpus.get(result.b)?;
        Some(Self {
            score: result.score,
            path_a: a.path.clone(),
            path_b: b.path.clone(),
            size_a: a.size,
            size_b: b.size,
        })
    }
}
