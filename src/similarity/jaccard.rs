//! Jaccard similarity between fingerprints.

use super::fingerprint::Fingerprint;

/// Jaccard index of the set bits of two fingerprints.
///
/// Returns `None` when the fingerprints share no set bits or neither has any,
/// i.e. when the pair carries no evidence of similarity either way.
/// Otherwise returns `intersection / union` in `(0, 1]`.
///
/// Both fingerprints must come from the same [`FingerprintConfig`]; the
/// corpus guarantees this by building every fingerprint from one config.
///
/// [`FingerprintConfig`]: super::fingerprint::FingerprintConfig
///
/// # Example
///
/// ```
/// use neardupe::similarity::fingerprint::Fingerprint;
/// use neardupe::similarity::jaccard::jaccard_similarity;
///
/// let mut a = Fingerprint::zeroed(128);
/// let mut b = Fingerprint::zeroed(128);
/// a.set(1);
/// a.set(70);
/// b.set(70);
///
/// assert_eq!(jaccard_similarity(&a, &b), Some(0.5));
/// assert_eq!(jaccard_similarity(&a, &a), Some(1.0));
/// ```
#[must_use]
pub fn jaccard_similarity(a: &Fingerprint, b: &Fingerprint) -> Option<f64> {
    debug_assert_eq!(
        a.bit_len(),
        b.bit_len(),
        "fingerprints built under different configurations"
    );

    let union = a.union_count(b);
    let intersection = a.intersection_count(b);

    if union == 0 || intersection == 0 {
        return None;
    }
    Some(f64::from(intersection) / f64::from(union))
}
