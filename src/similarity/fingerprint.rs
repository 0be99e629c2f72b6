//! Fixed-size Bloom-style fingerprints built from content-defined chunks.
//!
//! # Overview
//!
//! Every chunk of a file is hashed with FNV-1a and the hash, reduced modulo
//! the fingerprint's bit length, selects one bit to set. Two files that share
//! long byte runs share chunks, hence bits, and their Jaccard index over set
//! bits approximates how much content they have in common.
//!
//! A fingerprint is only useful in a narrow band of chunk counts:
//!
//! - more chunks than half the available bits and collisions dominate, so
//!   the file is rejected as [`FingerprintError::Oversaturated`];
//! - fewer than [`MIN_CHUNKS`] chunks and there are too few samples, so the
//!   file is rejected as [`FingerprintError::Undersized`].
//!
//! Inputs of exactly [`DEGENERATE_SIZE`] bytes are rejected outright.
//!
//! # Example
//!
//! ```
//! use neardupe::similarity::fingerprint::{build_fingerprint, FingerprintConfig};
//!
//! let config = FingerprintConfig::new(1024, 58).unwrap();
//! let data: Vec<u8> = (0..20_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
//! let fingerprint = build_fingerprint(&data, &config).unwrap();
//! assert_eq!(fingerprint.bit_len(), 1024 * 8);
//! ```

use std::fmt::Write as _;

use super::chunker::Chunker;
use super::fnv::fnv1a_64;

/// Default fingerprint size in bytes.
pub const DEFAULT_BUCKET_COUNT: usize = 8192;

/// Default chunking threshold exponent.
pub const DEFAULT_CHUNKING_THRESHOLD: u8 = 52;

/// Smallest accepted chunking threshold exponent.
pub const MIN_CHUNKING_THRESHOLD: u8 = 1;

/// Largest accepted chunking threshold exponent.
pub const MAX_CHUNKING_THRESHOLD: u8 = 63;

/// Chunking thresholds outside this range are accepted but rarely useful.
pub const RECOMMENDED_CHUNKING_THRESHOLDS: std::ops::RangeInclusive<u8> = 45..=60;

/// Fewer chunks than this and a fingerprint carries too little signal.
pub const MIN_CHUNKS: usize = 10;

/// Inputs of exactly this many bytes are skipped.
pub const DEGENERATE_SIZE: usize = 8;

const WORD_BITS: usize = u64::BITS as usize;

/// Run-wide fingerprinting parameters.
///
/// Built once before any file is fingerprinted; every fingerprint compared
/// in a run must come from the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintConfig {
    bucket_count: usize,
    chunking_threshold: u8,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            chunking_threshold: DEFAULT_CHUNKING_THRESHOLD,
        }
    }
}

impl FingerprintConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFingerprintConfig`] if `bucket_count` is zero, the
    /// bit length overflows, or `chunking_threshold` is outside `1..=63`.
    pub fn new(
        bucket_count: usize,
        chunking_threshold: u8,
    ) -> Result<Self, InvalidFingerprintConfig> {
        if bucket_count == 0 || bucket_count.checked_mul(8).is_none() {
            return Err(InvalidFingerprintConfig::BucketCount(bucket_count));
        }
        if !(MIN_CHUNKING_THRESHOLD..=MAX_CHUNKING_THRESHOLD).contains(&chunking_threshold) {
            return Err(InvalidFingerprintConfig::ChunkingThreshold(
                chunking_threshold,
            ));
        }
        if !RECOMMENDED_CHUNKING_THRESHOLDS.contains(&chunking_threshold) {
            log::warn!(
                "Chunking threshold {} is outside the recommended range {}-{}; each step doubles or halves the average chunk size",
                chunking_threshold,
                RECOMMENDED_CHUNKING_THRESHOLDS.start(),
                RECOMMENDED_CHUNKING_THRESHOLDS.end()
            );
        }
        Ok(Self {
            bucket_count,
            chunking_threshold,
        })
    }

    /// Fingerprint size in bytes.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Chunk boundary threshold exponent.
    #[must_use]
    pub fn chunking_threshold(&self) -> u8 {
        self.chunking_threshold
    }

    /// Number of addressable bits in each fingerprint.
    #[must_use]
    pub fn bloom_bits(&self) -> usize {
        self.bucket_count * 8
    }

    /// Chunk count above which a file is rejected as oversaturated.
    #[must_use]
    pub fn saturation_limit(&self) -> usize {
        self.bloom_bits() / 2
    }
}

/// Rejected fingerprint parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidFingerprintConfig {
    /// Bucket count must be a positive byte count.
    #[error("Invalid bucket count {0}: must be at least 1")]
    BucketCount(usize),

    /// Threshold exponent must be within `1..=63`.
    #[error("Invalid chunking threshold {0}: must be between 1 and 63")]
    ChunkingThreshold(u8),
}

/// Reasons a file cannot be fingerprinted.
///
/// None of these abort a run; the file is left out of the corpus.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    /// Exactly eight bytes of input.
    #[error("Degenerate input of exactly 8 bytes")]
    DegenerateSize,

    /// More chunks than the fingerprint can usefully hold.
    #[error("Too large to process at current settings ({chunks} chunks exceed the limit of {limit}); increase the bucket count")]
    Oversaturated {
        /// Chunks processed when the limit was crossed
        chunks: usize,
        /// Saturation limit for the configured bucket count
        limit: usize,
    },

    /// Too few chunks for a meaningful fingerprint.
    #[error("Too small to process at current settings (only {chunks} chunks, need {}); increase the chunking threshold", MIN_CHUNKS)]
    Undersized {
        /// Chunks processed over the whole input
        chunks: usize,
    },
}

impl FingerprintError {
    /// Short machine-friendly label for reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DegenerateSize => "degenerate",
            Self::Oversaturated { .. } => "oversaturated",
            Self::Undersized { .. } => "undersized",
        }
    }
}

/// A fixed-length bit vector summarising a file's chunks.
///
/// Immutable once built. Stored as 64-bit words so intersection and union
/// sizes reduce to population counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    words: Box<[u64]>,
    bits: usize,
    chunks: usize,
}

impl Fingerprint {
    /// Create an all-zero fingerprint with `bits` addressable bits.
    #[must_use]
    pub fn zeroed(bits: usize) -> Self {
        Self {
            words: vec![0u64; bits.div_ceil(WORD_BITS)].into_boxed_slice(),
            bits,
            chunks: 0,
        }
    }

    /// Set bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.bit_len()`.
    pub fn set(&mut self, index: usize) {
        assert!(index < self.bits, "bit {index} out of range {}", self.bits);
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    /// Number of addressable bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bits
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Number of chunks folded into this fingerprint.
    ///
    /// Counts chunks, not distinct bits: two chunks landing on the same bit
    /// both count.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Population count of `self AND other`.
    #[must_use]
    pub fn intersection_count(&self, other: &Self) -> u32 {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a & b).count_ones())
            .sum()
    }

    /// Population count of `self OR other`.
    #[must_use]
    pub fn union_count(&self, other: &Self) -> u32 {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a | b).count_ones())
            .sum()
    }

    /// Render as upper-case hex, byte by byte in little-endian word order.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let byte_len = self.bits.div_ceil(8);
        let mut out = String::with_capacity(byte_len * 2);
        for byte in self
            .words
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .take(byte_len)
        {
            let _ = write!(out, "{byte:02X}");
        }
        out
    }
}

/// Build the fingerprint of `data`.
///
/// # Errors
///
/// - [`FingerprintError::DegenerateSize`] if `data` is exactly eight bytes
/// - [`FingerprintError::Oversaturated`] as soon as the chunk count passes
///   half the bit length
/// - [`FingerprintError::Undersized`] if fewer than [`MIN_CHUNKS`] chunks
///   were produced
pub fn build_fingerprint(
    data: &[u8],
    config: &FingerprintConfig,
) -> Result<Fingerprint, FingerprintError> {
    if data.len() == DEGENERATE_SIZE {
        return Err(FingerprintError::DegenerateSize);
    }

    let bits = config.bloom_bits();
    let limit = config.saturation_limit();
    let mut fingerprint = Fingerprint::zeroed(bits);
    let mut chunks = 0usize;

    for chunk in Chunker::new(data, config.chunking_threshold()) {
        let hash = fnv1a_64(chunk.bytes(data));
        let bucket = (hash % bits as u64) as usize;
        log::trace!(
            "Chunk {:08X} {:08X} -> bucket {}",
            chunk.offset,
            chunk.length,
            bucket
        );
        fingerprint.set(bucket);

        chunks += 1;
        if chunks > limit {
            return Err(FingerprintError::Oversaturated { chunks, limit });
        }
    }

    if chunks < MIN_CHUNKS {
        return Err(FingerprintError::Undersized { chunks });
    }

    fingerprint.chunks = chunks;
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::chunker::Chunker;

    fn noise(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = FingerprintConfig::default();
        assert_eq!(config.bucket_count(), 8192);
        assert_eq!(config.chunking_threshold(), 52);
        assert_eq!(config.bloom_bits(), 65_536);
        assert_eq!(config.saturation_limit(), 32_768);
    }

    #[test]
    fn test_config_rejects_zero_buckets() {
        assert_eq!(
            FingerprintConfig::new(0, 52),
            Err(InvalidFingerprintConfig::BucketCount(0))
        );
    }

    #[test]
    fn test_config_rejects_bad_thresholds() {
        assert!(FingerprintConfig::new(16, 0).is_err());
        assert!(FingerprintConfig::new(16, 64).is_err());
        assert!(FingerprintConfig::new(16, 1).is_ok());
        assert!(FingerprintConfig::new(16, 63).is_ok());
    }

    #[test]
    fn test_saturation_limit_is_four_per_bucket() {
        let config = FingerprintConfig::new(100, 52).unwrap();
        assert_eq!(config.saturation_limit(), 400);
    }

    #[test]
    fn test_bit_vector_operations() {
        let mut a = Fingerprint::zeroed(130);
        let mut b = Fingerprint::zeroed(130);
        assert_eq!(a.words.len(), 3);

        a.set(0);
        a.set(64);
        a.set(129);
        b.set(64);
        b.set(100);

        assert_ne!(a.words[2] & 0b10, 0);
        assert_eq!(a.words[2] & 0b01, 0);
        assert_eq!(a.count_ones(), 3);
        assert_eq!(a.intersection_count(&b), 1);
        assert_eq!(a.union_count(&b), 4);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_set_out_of_range_panics() {
        let mut fp = Fingerprint::zeroed(8);
        fp.set(8);
    }

    #[test]
    fn test_to_hex_byte_layout() {
        let mut fp = Fingerprint::zeroed(16);
        fp.set(0);
        fp.set(9);
        assert_eq!(fp.to_hex(), "0102");
    }

    #[test]
    fn test_eight_bytes_is_degenerate() {
        let config = FingerprintConfig::new(64, 60).unwrap();
        assert_eq!(
            build_fingerprint(&[1, 2, 3, 4, 5, 6, 7, 8], &config),
            Err(FingerprintError::DegenerateSize)
        );
    }

    #[test]
    fn test_small_input_is_undersized() {
        let config = FingerprintConfig::new(64, 52).unwrap();
        match build_fingerprint(b"hello world", &config) {
            Err(FingerprintError::Undersized { chunks }) => assert!(chunks < MIN_CHUNKS),
            other => panic!("Expected Undersized, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_undersized() {
        let config = FingerprintConfig::default();
        assert_eq!(
            build_fingerprint(&[], &config),
            Err(FingerprintError::Undersized { chunks: 0 })
        );
    }

    #[test]
    fn test_many_chunks_oversaturate_small_fingerprint() {
        // Threshold 63 passes about half of all windows, so chunks are ~10 bytes
        let config = FingerprintConfig::new(4, 63).unwrap();
        let data = noise(10_000, 17);
        assert_eq!(
            build_fingerprint(&data, &config),
            Err(FingerprintError::Oversaturated {
                chunks: 17,
                limit: 16
            })
        );
    }

    #[test]
    fn test_successful_fingerprint() {
        let config = FingerprintConfig::new(1024, 58).unwrap();
        let data = noise(20_000, 23);
        let fp = build_fingerprint(&data, &config).unwrap();

        let expected_chunks = Chunker::new(&data, 58).count();
        assert_eq!(fp.chunk_count(), expected_chunks);
        assert!(fp.count_ones() as usize <= expected_chunks);
        assert!(fp.count_ones() > 0);
        assert_eq!(fp.bit_len(), 8192);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let config = FingerprintConfig::new(512, 58).unwrap();
        let data = noise(8_000, 31);
        assert_eq!(
            build_fingerprint(&data, &config),
            build_fingerprint(&data, &config)
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(FingerprintError::DegenerateSize.kind(), "degenerate");
        assert_eq!(
            FingerprintError::Oversaturated { chunks: 2, limit: 1 }.kind(),
            "oversaturated"
        );
        assert_eq!(FingerprintError::Undersized { chunks: 1 }.kind(), "undersized");
    }

    #[test]
    fn test_error_messages_give_advice() {
        let err = FingerprintError::Oversaturated {
            chunks: 10,
            limit: 9,
        };
        assert!(err.to_string().contains("increase the bucket count"));
        let err = FingerprintError::Undersized { chunks: 3 };
        assert!(err.to_string().contains("increase the chunking threshold"));
    }
}
