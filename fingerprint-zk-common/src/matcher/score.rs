//! Integer-only scoring.
//!
//! Every "round" step uses [`round_div`] (half away from zero) and every other
//! division is a floor division, so the circuit can re-derive the same values
//! without floating point.

use super::CandidatePair;
use crate::config::MatcherConfig;

/// `numerator / denominator` rounded half away from zero, for non-negative
/// operands. `denominator` must be non-zero.
#[inline]
pub fn round_div(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Intermediate and final values of one scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub avg_distance: u32,
    pub normalized_quality: u32,
    pub count_score: u32,
    pub final_score: u32,
}

impl Score {
    /// Score of a comparison without any accepted match.
    pub fn zero(max_distance: u32) -> Self {
        Self {
            avg_distance: max_distance,
            normalized_quality: 0,
            count_score: 0,
            final_score: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPointScorer {
    distance_weight: u64,
    count_weight: u64,
    count_saturation: u64,
}

impl FixedPointScorer {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            distance_weight: config.distance_weight as u64,
            count_weight: config.count_weight as u64,
            count_saturation: config.count_saturation as u64,
        }
    }

    pub fn score(&self, accepted: &[CandidatePair], max_distance: u32) -> Score {
        if accepted.is_empty() || max_distance == 0 {
            return Score::zero(max_distance);
        }
        let count = accepted.len() as u64;
        let max = max_distance as u64;

        let total: u64 = accepted.iter().map(|p| p.best_distance as u64).sum();
        let avg_distance = round_div(total, count).min(max);

        let normalized_quality = round_div((max - avg_distance) * 100, max).min(100);
        let count_score = round_div(count * 100, self.count_saturation).min(100);

        let final_score = (self.distance_weight * normalized_quality
            + self.count_weight * count_score)
            / 100;

        Score {
            avg_distance: avg_distance as u32,
            normalized_quality: normalized_quality as u32,
            count_score: count_score as u32,
            final_score: final_score.min(100) as u32,
        }
    }
}
