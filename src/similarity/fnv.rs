//! 64-bit FNV-1a hashing of byte slices.
//!
//! Used twice by the fingerprinting pipeline: over sliding 8-byte windows to
//! locate chunk boundaries, and over whole chunks to pick a fingerprint bit.

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Compute the FNV-1a 64-bit hash of `bytes`.
///
/// # Example
///
/// ```
/// use neardupe::similarity::fnv::{fnv1a_64, FNV_OFFSET_BASIS};
///
/// assert_eq!(fnv1a_64(b""), FNV_OFFSET_BASIS);
/// assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
/// ```
#[inline]
#[must_use]
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
