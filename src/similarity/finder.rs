//! Similarity finder: the walk, fingerprint and compare pipeline.
//!
//! # Overview
//!
//! [`SimilarityFinder`] runs one detection pass over a set of roots:
//! 1. **Walk** - Collect candidate files from every root, in order
//! 2. **Fingerprint** - Map each candidate read-only and build its
//!    fingerprint on a pool of `io_threads` workers
//! 3. **Compare** - Score every unordered pair of the finished corpus
//!
//! Files that cannot be read or fingerprinted are reported and left out of
//! the corpus; they never stop the run.
//!
//! # Example
//!
//! ```no_run
//! use neardupe::similarity::{FinderConfig, SimilarityFinder};
//! use std::path::PathBuf;
//!
//! let finder = SimilarityFinder::new(FinderConfig::default().with_match_threshold(0.8));
//! let (pairs, summary) = finder.find_similar(&[PathBuf::from(".")]).unwrap();
//!
//! println!("{} files, {} similar pairs", summary.fingerprinted, pairs.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::corpus::{
    compare_corpus, CompareOptions, CompareStats, Corpus, CorpusAllocError, CorpusError,
    FileRecord, MismatchedFingerprint, SimilarPair,
};
use super::fingerprint::{build_fingerprint, Fingerprint, FingerprintConfig, FingerprintError};
use crate::progress::ProgressCallback;
use crate::scanner::{
    dedupe_roots, with_mapped, FileEntry, ReadError, ScanError, Walker, WalkerConfig,
};

/// Default match threshold (90% similarity).
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.9;

/// Default number of fingerprinting threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the similarity finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Fingerprint parameters shared by every file of the run.
    pub fingerprint: FingerprintConfig,
    /// Minimum similarity for a pair to be reported, in `(0, 1]`.
    pub match_threshold: f64,
    /// Number of threads for parallel fingerprinting and comparison.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("fingerprint", &self.fingerprint)
            .field("match_threshold", &self.match_threshold)
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            fingerprint: FingerprintConfig::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            io_threads: DEFAULT_IO_THREADS,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the fingerprint parameters.
    #[must_use]
    pub fn with_fingerprint_config(mut self, config: FingerprintConfig) -> Self {
        self.fingerprint = config;
        self
    }

    /// Set the match threshold.
    #[must_use]
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A candidate that did not make it into the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path of the candidate
    pub path: PathBuf,
    /// Short category: `read`, `degenerate`, `oversaturated` or `undersized`
    pub kind: &'static str,
    /// Human-readable reason
    pub reason: String,
}

/// Summary statistics from a similarity scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Candidate files found by the walk
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Files fingerprinted into the corpus
    pub fingerprinted: usize,
    /// Files rejected because they are exactly eight bytes
    pub skipped_degenerate: usize,
    /// Files rejected because they produced too many chunks
    pub skipped_oversaturated: usize,
    /// Files rejected because they produced too few chunks
    pub skipped_undersized: usize,
    /// Every candidate left out of the corpus, in discovery order
    pub skipped: Vec<SkippedFile>,
    /// Candidates that could not be opened or mapped
    pub read_errors: Vec<ReadError>,
    /// Errors encountered while walking
    pub scan_errors: Vec<ScanError>,
    /// Pairs scored
    pub pairs_compared: u64,
    /// Pairs whose fingerprints shared no bits
    pub incomparable_pairs: u64,
    /// Pairs at or above the match threshold
    pub matches: usize,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl ScanSummary {
    /// Number of candidates left out of the corpus for any reason.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Whether any file or directory could not be read.
    #[must_use]
    pub fn has_read_errors(&self) -> bool {
        !self.read_errors.is_empty() || !self.scan_errors.is_empty()
    }

    /// Format total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    fn record_compare(&mut self, stats: &CompareStats) {
        self.pairs_compared = stats.pairs_compared;
        self.incomparable_pairs = stats.incomparable_pairs;
        self.matches = stats.matches;
    }
}

/// Errors that can occur during similarity finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The match threshold is outside `(0, 1]`.
    #[error("Invalid match threshold {0}: must be greater than 0 and at most 1")]
    InvalidMatchThreshold(f64),

    /// Corpus storage could not grow.
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] CorpusAllocError),

    /// A fingerprint did not match the run configuration.
    #[error(transparent)]
    Mismatched(#[from] MismatchedFingerprint),

    /// The worker pool could not be created.
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<CorpusError> for FinderError {
    fn from(error: CorpusError) -> Self {
        match error {
            CorpusError::Alloc(e) => Self::OutOfMemory(e),
            CorpusError::Mismatched(e) => Self::Mismatched(e),
        }
    }
}

/// Result of fingerprinting one candidate.
enum Outcome {
    Fingerprinted(FileRecord),
    Rejected {
        path: PathBuf,
        error: FingerprintError,
    },
    ReadFailed(ReadError),
    Cancelled,
}

/// Map `path` and build its fingerprint.
///
/// The mapping is released before this returns. The outer error is an I/O
/// failure; the inner one is a fingerprint status for a readable file.
///
/// # Errors
///
/// Returns [`ReadError`] if the file cannot be opened, stat-ed or mapped.
pub fn fingerprint_file(
    path: &Path,
    config: &FingerprintConfig,
) -> Result<(Result<Fingerprint, FingerprintError>, u64), ReadError> {
    with_mapped(path, |bytes| build_fingerprint(bytes, config))
}

/// Near-duplicate finder that orchestrates the detection pipeline.
#[derive(Debug)]
pub struct SimilarityFinder {
    config: FinderConfig,
}

impl SimilarityFinder {
    /// Create a new finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find similar file pairs under the given roots.
    ///
    /// Roots may be files or directories and are walked in the order
    /// given. Repeated and nested roots are walked once. A root that cannot
    /// be stat-ed is recorded in [`ScanSummary::scan_errors`] and the
    /// remaining roots are still scanned.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The match threshold is invalid
    /// - The scan is interrupted by shutdown signal
    /// - Corpus storage cannot grow
    pub fn find_similar(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<SimilarPair>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        self.validate()?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let mut files = Vec::new();
        let mut scan_errors = Vec::new();

        for root in dedupe_roots(roots.to_vec()) {
            log::info!("Walking {}", root.display());
            let mut walker = Walker::new(&root, self.config.walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(Arc::clone(flag));
            }

            for result in walker.walk() {
                match result {
                    Ok(file) => {
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_progress(
                                files.len() + 1,
                                file.path.to_string_lossy().as_ref(),
                            );
                        }
                        files.push(file);
                    }
                    Err(e) => scan_errors.push(e),
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (pairs, mut summary) = self.find_similar_in_files(files)?;
        summary.scan_errors = scan_errors;
        summary.scan_duration = start_time.elapsed();
        Ok((pairs, summary))
    }

    /// Find similar pairs among an already collected candidate list.
    ///
    /// The corpus order equals the order of `files`.
    ///
    /// # Errors
    ///
    /// Same as [`find_similar`](Self::find_similar), minus path validation.
    pub fn find_similar_in_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<SimilarPair>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        self.validate()?;

        let mut summary = ScanSummary {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            ..Default::default()
        };

        log::info!(
            "Found {} files ({})",
            summary.total_files,
            summary.total_size_display()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;

        let corpus = self.build_corpus(&pool, files, &mut summary)?;

        log::info!(
            "Fingerprinted {} of {} files, comparing {} pairs",
            corpus.len(),
            summary.total_files,
            corpus.pair_count()
        );

        let pairs = self.compare(&pool, &corpus, &mut summary)?;

        summary.scan_duration = start_time.elapsed();
        log::info!(
            "Found {} similar pairs in {:.2?}",
            pairs.len(),
            summary.scan_duration
        );

        Ok((pairs, summary))
    }

    fn validate(&self) -> Result<(), FinderError> {
        let t = self.config.match_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(FinderError::InvalidMatchThreshold(t));
        }
        Ok(())
    }

    /// Fingerprint every candidate and collect the successes, in order.
    fn build_corpus(
        &self,
        pool: &rayon::ThreadPool,
        files: Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) -> Result<Corpus, FinderError> {
        let fingerprint_config = self.config.fingerprint;

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("fingerprint", files.len());
        }

        let done = AtomicUsize::new(0);
        let outcomes: Vec<Outcome> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    if self.config.is_shutdown_requested() {
                        return Outcome::Cancelled;
                    }

                    let outcome = match fingerprint_file(&file.path, &fingerprint_config) {
                        Ok((Ok(fingerprint), size)) => {
                            Outcome::Fingerprinted(FileRecord::new(file.path, size, fingerprint))
                        }
                        Ok((Err(error), _)) => Outcome::Rejected {
                            path: file.path,
                            error,
                        },
                        Err(e) => Outcome::ReadFailed(e),
                    };

                    if let Some(ref callback) = self.config.progress_callback {
                        let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(current, "");
                        callback.on_item_completed(file.size);
                    }
                    outcome
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("fingerprint");
        }

        if self.config.is_shutdown_requested() {
            summary.interrupted = true;
            return Err(FinderError::Interrupted);
        }

        let mut corpus = Corpus::new(fingerprint_config);
        let accepted = outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Fingerprinted(_)))
            .count();
        corpus.try_reserve(accepted)?;

        for outcome in outcomes {
            match outcome {
                Outcome::Fingerprinted(record) => {
                    corpus.push(record)?;
                    summary.fingerprinted += 1;
                }
                Outcome::Rejected { path, error } => {
                    match error {
                        FingerprintError::DegenerateSize => {
                            log::debug!("Skipping {}: {}", path.display(), error);
                            summary.skipped_degenerate += 1;
                        }
                        FingerprintError::Oversaturated { .. } => {
                            log::warn!("{}: {}", path.display(), error);
                            summary.skipped_oversaturated += 1;
                        }
                        FingerprintError::Undersized { .. } => {
                            log::warn!("{}: {}", path.display(), error);
                            summary.skipped_undersized += 1;
                        }
                    }
                    summary.skipped.push(SkippedFile {
                        path,
                        kind: error.kind(),
                        reason: error.to_string(),
                    });
                }
                Outcome::ReadFailed(error) => {
                    log::warn!("{}", error);
                    summary.skipped.push(SkippedFile {
                        path: error.path().to_path_buf(),
                        kind: "read",
                        reason: error.to_string(),
                    });
                    summary.read_errors.push(error);
                }
                Outcome::Cancelled => {
                    summary.interrupted = true;
                    return Err(FinderError::Interrupted);
                }
            }
        }

        Ok(corpus)
    }

    /// Score all pairs of the finished corpus.
    fn compare(
        &self,
        pool: &rayon::ThreadPool,
        corpus: &Corpus,
        summary: &mut ScanSummary,
    ) -> Result<Vec<SimilarPair>, FinderError> {
        let mut options = CompareOptions {
            shutdown_flag: self.config.shutdown_flag.clone(),
            on_row: None,
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("compare", corpus.len());
            let callback = Arc::clone(callback);
            let rows_done = Arc::new(AtomicUsize::new(0));
            options.on_row = Some(Arc::new(move |_row: usize| {
                let current = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
                callback.on_progress(current, "");
            }));
        }

        let (matches, stats) =
            pool.install(|| compare_corpus(corpus, self.config.match_threshold, &options));

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("compare");
        }

        if stats.interrupted {
            summary.interrupted = true;
            return Err(FinderError::Interrupted);
        }
        summary.record_compare(&stats);

        Ok(matches
            .iter()
            .filter_map(|m| SimilarPair::resolve(corpus, m))
            .collect())
    }
}
