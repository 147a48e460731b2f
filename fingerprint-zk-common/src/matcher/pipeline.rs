use super::{FixedPointScorer, KnnMatcher, MatchResult, RatioTest};
use crate::{
    config::{FailurePolicy, MatcherConfig},
    error::MatchError,
    features::{FeatureSet, FeatureSetLoader},
    MAX_DISTANCE,
};
use std::path::Path;

/// Runs matcher, ratio test and scorer for one (query, reference) pair.
///
/// Holds no mutable state; one instance can serve any number of concurrent
/// invocations.
#[derive(Debug, Clone)]
pub struct Matcher {
    config: MatcherConfig,
    loader: FeatureSetLoader,
    knn: KnnMatcher,
    ratio_test: RatioTest,
    scorer: FixedPointScorer,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            loader: FeatureSetLoader::new(&config),
            knn: KnnMatcher::new(&config),
            ratio_test: RatioTest::new(&config),
            scorer: FixedPointScorer::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Loads both feature files and matches them. Load errors are always
    /// returned, as in [`Matcher::match_sets`].
    pub fn match_files(
        &self,
        query: impl AsRef<Path>,
        reference: impl AsRef<Path>,
    ) -> Result<MatchResult, MatchError> {
        let query = self.loader.load(query)?;
        let reference = self.loader.load(reference)?;
        self.match_sets(&query, &reference)
    }

    /// Matches two loaded sets. A descriptor shape mismatch is always
    /// returned; any other matching error follows the configured
    /// [`FailurePolicy`].
    pub fn match_sets(
        &self,
        query: &FeatureSet,
        reference: &FeatureSet,
    ) -> Result<MatchResult, MatchError> {
        let result = self.try_match_sets(query, reference);
        self.apply_failure_policy(result, max_distance_of(query))
    }

    fn apply_failure_policy(
        &self,
        result: Result<MatchResult, MatchError>,
        max_distance: u32,
    ) -> Result<MatchResult, MatchError> {
        match result {
            Ok(result) => Ok(result),
            Err(e @ MatchError::DescriptorShapeMismatch(_)) => Err(e),
            Err(e) => match self.config.failure_policy {
                FailurePolicy::Propagate => Err(e),
                FailurePolicy::DowngradeToNoMatch => {
                    tracing::warn!("Matching failed, reporting no match: {}", e);
                    metrics::counter!("matcher.downgraded_failures").increment(1);
                    Ok(MatchResult::no_match(max_distance))
                }
            },
        }
    }

    /// Matching without the failure policy applied.
    pub fn try_match_sets(
        &self,
        query: &FeatureSet,
        reference: &FeatureSet,
    ) -> Result<MatchResult, MatchError> {
        let max_distance = max_distance_of(query);
        let pairs = self.knn.knn_match(query, reference)?;
        tracing::debug!("Found {} potential matches", pairs.len());

        let accepted_pairs = self.ratio_test.filter(&pairs);
        let good_match_count = accepted_pairs.len();
        tracing::debug!("Good matches after ratio test: {}", good_match_count);

        let score = self.scorer.score(&accepted_pairs, max_distance);
        let is_match = good_match_count >= self.config.min_matches;

        metrics::histogram!("matcher.good_matches").record(good_match_count as f64);
        tracing::info!(
            good_match_count,
            total_pairs = pairs.len(),
            avg_distance = score.avg_distance,
            normalized_quality = score.normalized_quality,
            count_score = score.count_score,
            final_score = score.final_score,
            is_match,
            "Match decision (threshold: {})",
            self.config.min_matches
        );

        Ok(MatchResult {
            is_match,
            final_score: score.final_score,
            good_match_count,
            accepted_pairs,
            all_distance_pairs: pairs.iter().map(|p| p.distances()).collect(),
            avg_distance: score.avg_distance,
            normalized_quality: score.normalized_quality,
            count_score: score.count_score,
            max_distance,
        })
    }
}

fn max_distance_of(set: &FeatureSet) -> u32 {
    set.descriptor_width()
        .map_or(MAX_DISTANCE, |width| (width * 8) as u32)
}
