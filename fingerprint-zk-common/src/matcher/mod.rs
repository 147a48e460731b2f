use crate::MAX_DISTANCE;
use serde::{Deserialize, Serialize};

pub mod knn;
pub mod pipeline;
pub mod ratio;
pub mod score;

pub use knn::KnnMatcher;
pub use pipeline::Matcher;
pub use ratio::RatioTest;
pub use score::{FixedPointScorer, Score};

/// The two nearest reference descriptors of one query descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub query_index: usize,
    pub best_index: usize,
    pub second_best_index: usize,
    pub best_distance: u32,
    pub second_best_distance: u32,
}

impl CandidatePair {
    pub fn distances(&self) -> (u32, u32) {
        (self.best_distance, self.second_best_distance)
    }
}

/// Outcome of matching a query feature set against a reference feature set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_match: bool,
    pub final_score: u32,
    pub good_match_count: usize,
    /// Pairs that passed the ratio test, in query order.
    pub accepted_pairs: Vec<CandidatePair>,
    /// `(best, second_best)` for every query descriptor, in query order.
    pub all_distance_pairs: Vec<(u32, u32)>,
    pub avg_distance: u32,
    pub normalized_quality: u32,
    pub count_score: u32,
    pub max_distance: u32,
}

impl MatchResult {
    /// Zero-score no-match, used for degenerate inputs and downgraded failures.
    pub fn no_match(max_distance: u32) -> Self {
        let score = Score::zero(max_distance);
        Self {
            is_match: false,
            final_score: score.final_score,
            good_match_count: 0,
            accepted_pairs: vec![],
            all_distance_pairs: vec![],
            avg_distance: score.avg_distance,
            normalized_quality: score.normalized_quality,
            count_score: score.count_score,
            max_distance,
        }
    }

    /// Unrounded mean of the accepted best distances, for diagnostics only.
    pub fn mean_accepted_distance(&self) -> f64 {
        if self.accepted_pairs.is_empty() {
            return self.max_distance as f64;
        }
        let total: u64 = self
            .accepted_pairs
            .iter()
            .map(|p| p.best_distance as u64)
            .sum();
        total as f64 / self.accepted_pairs.len() as f64
    }

    pub fn total_pairs(&self) -> usize {
        self.all_distance_pairs.len()
    }
}

impl Default for MatchResult {
    fn default() -> Self {
        Self::no_match(MAX_DISTANCE)
    }
}
