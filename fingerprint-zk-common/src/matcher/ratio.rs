use super::CandidatePair;
use crate::config::MatcherConfig;

/// Lowe's ratio test evaluated in fixed point:
/// `best * denominator < second_best * numerator`.
///
/// The comparison is strict, and a pair whose second-best distance is zero is
/// never accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioTest {
    numerator: u64,
    denominator: u64,
}

impl RatioTest {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            numerator: config.lowes_ratio_numerator as u64,
            denominator: config.lowes_ratio_denominator as u64,
        }
    }

    #[inline]
    pub fn accepts(&self, pair: &CandidatePair) -> bool {
        (pair.best_distance as u64) * self.denominator
            < (pair.second_best_distance as u64) * self.numerator
    }

    /// Accepted pairs, in their original relative order.
    pub fn filter(&self, pairs: &[CandidatePair]) -> Vec<CandidatePair> {
        pairs.iter().filter(|p| self.accepts(p)).copied().collect()
    }
}
