//! Near-duplicate detection: chunking, fingerprints and pairwise scoring.
//!
//! # Pipeline
//!
//! 1. [`chunker`] splits a byte buffer at content-defined boundaries
//! 2. [`fnv`] hashes each chunk with 64-bit FNV-1a
//! 3. [`fingerprint`] sets one bit per chunk hash in a fixed-size bit vector
//! 4. [`jaccard`] scores two fingerprints by their shared set bits
//! 5. [`corpus`] holds every fingerprint of a run and scores all pairs
//! 6. [`finder`] drives the whole pass over files on disk
//!
//! Because boundaries depend only on nearby content, an edit moves at most
//! a few chunk hashes; files that share long runs of data share most bits.
//!
//! # Example
//!
//! ```
//! use neardupe::similarity::{build_fingerprint, jaccard_similarity, FingerprintConfig};
//!
//! let config = FingerprintConfig::new(1024, 60).unwrap();
//! let data: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
//!
//! let a = build_fingerprint(&data, &config).unwrap();
//! let b = build_fingerprint(&data, &config).unwrap();
//! assert_eq!(jaccard_similarity(&a, &b), Some(1.0));
//! ```

pub mod chunker;
pub mod corpus;
pub mod fingerprint;
pub mod finder;
pub mod fnv;
pub mod jaccard;

// Re-export main types
pub use chunker::{chunk_len, Chunk, Chunker};
pub use corpus::{
    compare_corpus, CompareOptions, CompareStats, Corpus, CorpusAllocError, CorpusError,
    FileRecord, MatchResult, SimilarPair,
};
pub use fingerprint::{
    build_fingerprint, Fingerprint, FingerprintConfig, FingerprintError, InvalidFingerprintConfig,
};
pub use finder::{
    fingerprint_file, FinderConfig, FinderError, ScanSummary, SimilarityFinder, SkippedFile,
};
pub use fnv::fnv1a_64;
pub use jaccard::jaccard_similarity;
