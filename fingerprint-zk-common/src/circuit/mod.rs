//! Input document for the match-verification circuit.
//!
//! Key names are the circuit's declared input signals and must not change.
//! In particular `normalized_qualit` is spelled exactly as the circuit
//! declares it.

use crate::{
    config::MatcherConfig,
    error::MatchError,
    helpers::canonical::{sha256_hex, to_canonical_json},
    matcher::MatchResult,
    CIRCUIT_DISTANCES_LENGTH, MAX_PAIRS,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Circuit signal name of the normalized quality input.
pub const NORMALIZED_QUALITY_KEY: &str = "normalized_qualit";

/// Every top-level key of the circuit input, in canonical (sorted) order.
pub const CIRCUIT_INPUT_KEYS: [&str; 8] = [
    "count_score",
    "count_weight",
    "distance_weight",
    "distances",
    "lowes_ratio",
    "min_matches",
    NORMALIZED_QUALITY_KEY,
    "threshold",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitInputPayload {
    #[serde(rename = "normalized_qualit")]
    pub normalized_quality: u32,
    pub count_score: u32,
    pub distance_weight: u32,
    pub count_weight: u32,
    /// Lowe's ratio scaled by 100.
    pub threshold: u32,
    /// Lowe's ratio scaled by 10000.
    pub lowes_ratio: u32,
    pub min_matches: u64,
    /// Flattened `(best, second_best)` pairs, exactly
    /// [`CIRCUIT_DISTANCES_LENGTH`] long.
    pub distances: Vec<u32>,
}

impl CircuitInputPayload {
    pub fn from_match_result(result: &MatchResult, config: &MatcherConfig) -> Self {
        Self {
            normalized_quality: result.normalized_quality,
            count_score: result.count_score,
            distance_weight: config.distance_weight,
            count_weight: config.count_weight,
            threshold: config.threshold_scaled(),
            lowes_ratio: config.lowes_ratio_scaled(),
            min_matches: config.min_matches as u64,
            distances: flatten_distances(&result.all_distance_pairs, result.max_distance),
        }
    }

    /// Sorted keys, two-space indentation, trailing newline.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, MatchError> {
        Ok(to_canonical_json(self)?)
    }

    /// Hex SHA-256 of the canonical encoding.
    pub fn digest(&self) -> Result<String, MatchError> {
        Ok(sha256_hex(self.to_canonical_json()?))
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), MatchError> {
        let path = path.as_ref();
        fs::write(path, self.to_canonical_json()?)?;
        tracing::info!(path = %path.display(), "Saved circuit input");
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, MatchError> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

/// Flattens pairs in order and right-pads with `(max_distance, max_distance)`
/// to [`CIRCUIT_DISTANCES_LENGTH`] values. Pairs beyond [`MAX_PAIRS`] are
/// dropped; the output length never changes.
pub fn flatten_distances(pairs: &[(u32, u32)], max_distance: u32) -> Vec<u32> {
    if pairs.len() > MAX_PAIRS {
        tracing::warn!(
            total_pairs = pairs.len(),
            dropped_pairs = pairs.len() - MAX_PAIRS,
            "Truncating distance pairs to the circuit capacity of {}",
            MAX_PAIRS
        );
        metrics::counter!("circuit_input.truncated_pairs")
            .increment((pairs.len() - MAX_PAIRS) as u64);
    }

    let mut distances = Vec::with_capacity(CIRCUIT_DISTANCES_LENGTH);
    for &(best, second_best) in pairs.iter().take(MAX_PAIRS) {
        distances.push(best);
        distances.push(second_best);
    }
    distances.resize(CIRCUIT_DISTANCES_LENGTH, max_distance);
    distances
}
