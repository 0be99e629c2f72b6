//! Content-defined chunk boundary detection.
//!
//! # Overview
//!
//! A chunk ends at the first position `n >= 8` where the FNV-1a hash of the
//! eight bytes `[n - 8, n)` is below `2^threshold`. Because the decision only
//! looks at the bytes immediately before the candidate boundary, identical
//! byte runs produce identical boundaries wherever they sit in a file. The
//! average chunk length is roughly `2^64 / 2^threshold` bytes; lowering the
//! threshold lengthens chunks.
//!
//! Every candidate window is hashed independently. FNV-1a cannot be rolled,
//! so scanning costs about `8 * len` byte operations.
//!
//! # Example
//!
//! ```
//! use neardupe::similarity::chunker::Chunker;
//!
//! let data: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
//! let total: usize = Chunker::new(&data, 58).map(|c| c.length).sum();
//! assert_eq!(total, data.len());
//! ```

use super::fnv::fnv1a_64;

/// Width of the window hashed at each candidate boundary.
pub const WINDOW_SIZE: usize = 8;

/// Return the length of the next chunk at the start of `data`.
///
/// The result lies in `[1, data.len()]` for non-empty input; buffers of
/// `WINDOW_SIZE` bytes or fewer are returned whole. Empty input yields 0.
///
/// `threshold` is an exponent in `1..=63`.
#[must_use]
pub fn chunk_len(data: &[u8], threshold: u8) -> usize {
    debug_assert!((1..=63).contains(&threshold));
    let limit = 1u64 << threshold;
    let max = data.len();

    // Window `i` covers `[i, i + 8)`, i.e. the boundary candidate `n = i + 8`.
    // Candidates stop before `n == max`.
    data.windows(WINDOW_SIZE)
        .take(max.saturating_sub(WINDOW_SIZE))
        .position(|window| fnv1a_64(window) < limit)
        .map_or(max, |i| i + WINDOW_SIZE)
}

/// A single content-defined chunk within a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Starting byte position within the source.
    pub offset: usize,
    /// Length of the chunk in bytes.
    pub length: usize,
}

impl Chunk {
    /// Slice the chunk's bytes out of its source buffer.
    #[must_use]
    pub fn bytes<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        &source[self.offset..self.offset + self.length]
    }
}

/// Iterator over the content-defined chunks of a buffer.
///
/// Yields chunks in order; their lengths sum to the buffer length. An empty
/// buffer yields nothing.
#[derive(Debug, Clone)]
pub struct Chunker<'a> {
    source: &'a [u8],
    processed: usize,
    threshold: u8,
}

impl<'a> Chunker<'a> {
    /// Create a chunker over `source` using the given threshold exponent.
    #[must_use]
    pub fn new(source: &'a [u8], threshold: u8) -> Self {
        Self {
            source,
            processed: 0,
            threshold,
        }
    }

    /// Bytes not yet consumed by a yielded chunk.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.source.len() - self.processed
    }
}

impl Iterator for Chunker<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining() == 0 {
            return None;
        }

        let length = chunk_len(&self.source[self.processed..], self.threshold);
        let chunk = Chunk {
            offset: self.processed,
            length,
        };
        self.processed += length;
        Some(chunk)
    }
}
