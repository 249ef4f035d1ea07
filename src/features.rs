//! Plate prefix extraction and encoding.
//!
//! A plate is reduced to its leading run of one or two ASCII letters. The run
//! is right-justified into two slots, and each letter slot becomes
//! `letter - 'A'`. A single-letter prefix such as `B` therefore encodes as
//! `[PADDING_SLOT, 1]`.

use rand::Rng;

use crate::labels::LabelTable;

/// Two-slot encoding of a plate prefix.
pub type FeatureVector = [i32; 2];

/// Marks a slot for which no prefix letter could be extracted.
pub const INVALID_SLOT: i32 = -1;

/// Encoding returned when a plate has no leading letters.
pub const INVALID_FEATURES: FeatureVector = [INVALID_SLOT, INVALID_SLOT];

/// Value of the first slot for single-letter prefixes (a right-justify space, `' ' - 'A'`).
pub const PADDING_SLOT: i32 = b' ' as i32 - b'A' as i32;

/// Extract the leading one-or-two letter run of `plate`, uppercased.
///
/// Leading and trailing whitespace is ignored. Returns `None` when the plate
/// does not start with an ASCII letter.
pub fn extract_prefix(plate: &str) -> Option<String> {
    let prefix: String = plate
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

/// Encode a plate without noise.
pub fn extract_features(plate: &str) -> FeatureVector {
    let Some(prefix) = extract_prefix(plate) else {
        return INVALID_FEATURES;
    };
    let slot = |b: u8| i32::from(b) - i32::from(b'A');
    match prefix.as_bytes() {
        [only] => [PADDING_SLOT, slot(*only)],
        [first, second] => [slot(*first), slot(*second)],
        _ => INVALID_FEATURES,
    }
}

/// Encode a plate and perturb each slot by a value drawn from {-1, 0, +1}.
///
/// Invalid encodings are returned untouched so they can still be recognised.
pub fn extract_features_with_noise<R: Rng + ?Sized>(plate: &str, rng: &mut R) -> FeatureVector {
    let features = extract_features(plate);
    if !is_valid_features(&features) {
        return features;
    }
    perturb(features, rng)
}

fn perturb<R: Rng + ?Sized>(features: FeatureVector, rng: &mut R) -> FeatureVector {
    features.map(|v| v + rng.gen_range(-1..=1))
}

/// Whether an unperturbed encoding came from a real prefix.
pub fn is_valid_features(features: &FeatureVector) -> bool {
    !features.contains(&INVALID_SLOT)
}

/// Whether the exact prefix of `plate` is one of the configured codes.
pub fn is_valid_prefix(plate: &str, labels: &LabelTable) -> bool {
    extract_prefix(plate).is_some_and(|p| labels.index_of(&p).is_some())
}

// ---------------------------------------------------------------------------
// FeatureEncoder – noise policy
// ---------------------------------------------------------------------------

/// How dataset rows are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureEncoder {
    /// Plain prefix encoding.
    Exact,
    /// Prefix encoding with per-slot noise, which keeps identical prefixes
    /// from collapsing onto a single point.
    #[default]
    Noisy,
}

impl FeatureEncoder {
    /// `None` when the plate has no usable prefix. Validity is decided on the
    /// exact encoding; a noisy slot may legitimately come out as `-1`.
    pub fn encode<R: Rng + ?Sized>(self, plate: &str, rng: &mut R) -> Option<FeatureVector> {
        let features = extract_features(plate);
        if !is_valid_features(&features) {
            return None;
        }
        Some(match self {
            FeatureEncoder::Exact => features,
            FeatureEncoder::Noisy => perturb(features, rng),
        })
    }
}
