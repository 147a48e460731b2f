use super::CandidatePair;
use crate::{config::MatcherConfig, error::MatchError, features::FeatureSet, KNN_K};
use rayon::prelude::*;

/// Brute-force 2-nearest-neighbor search under Hamming distance.
///
/// Every query descriptor is compared against every reference descriptor.
/// Ranking uses strict comparisons, so among equally distant neighbors the one
/// with the lowest reference index wins.
#[derive(Debug, Clone)]
pub struct KnnMatcher {
    parallel: bool,
}

impl KnnMatcher {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            parallel: config.parallel_scan,
        }
    }

    /// One [`CandidatePair`] per query descriptor, in query order. Sets with
    /// fewer than two descriptors produce no pairs.
    pub fn knn_match(
        &self,
        query: &FeatureSet,
        reference: &FeatureSet,
    ) -> Result<Vec<CandidatePair>, MatchError> {
        if query.len() < KNN_K || reference.len() < KNN_K {
            tracing::info!(
                query = query.len(),
                reference = reference.len(),
                "Not enough descriptors for {}-NN matching",
                KNN_K
            );
            return Ok(vec![]);
        }

        let (query_width, reference_width) =
            (query.descriptor_width(), reference.descriptor_width());
        if query_width != reference_width {
            return Err(MatchError::DescriptorShapeMismatch(format!(
                "query descriptors are {:?} bytes, reference descriptors are {:?} bytes",
                query_width, reference_width
            )));
        }

        let pairs = if self.parallel {
            query
                .descriptors
                .par_iter()
                .enumerate()
                .map(|(i, _)| two_nearest(query, reference, i))
                .collect()
        } else {
            (0..query.len())
                .map(|i| two_nearest(query, reference, i))
                .collect()
        };
        Ok(pairs)
    }
}

fn two_nearest(query: &FeatureSet, reference: &FeatureSet, query_index: usize) -> CandidatePair {
    let descriptor = &query.descriptors[query_index];
    let mut best = (u32::MAX, 0);
    let mut second = (u32::MAX, 0);

    for (j, candidate) in reference.descriptors.iter().enumerate() {
        let distance = descriptor.hamming_distance(candidate);
        if distance < best.0 {
            second = best;
            best = (distance, j);
        } else if distance < second.0 {
            second = (distance, j);
        }
    }

    CandidatePair {
        query_index,
        best_index: best.1,
        second_best_index: second.1,
        best_distance: best.0,
        second_best_distance: second.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Descriptor;
    use rand::{rngs::SmallRng, SeedableRng};

    fn set(bytes: &[[u8; 2]]) -> FeatureSet {
        FeatureSet::new(bytes.iter().map(|b| Descriptor::from_bytes(b.to_vec())).collect())
    }

    fn sequential() -> KnnMatcher {
        KnnMatcher::new(&MatcherConfig {
            parallel_scan: false,
            ..Default::default()
        })
    }

    #[test]
    fn finds_two_nearest_in_query_order() {
        let query = set(&[[0x00, 0x00], [0xFF, 0xFF]]);
        let reference = set(&[[0xFF, 0xFE], [0x00, 0x01], [0x00, 0x03], [0xFF, 0xFF]]);
        let pairs = sequential().knn_match(&query, &reference).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].query_index, 0);
        assert_eq!((pairs[0].best_index, pairs[0].best_distance), (1, 1));
        assert_eq!(
            (pairs[0].second_best_index, pairs[0].second_best_distance),
            (2, 2)
        );
        assert_eq!((pairs[1].best_index, pairs[1].best_distance), (3, 0));
        assert_eq!(
            (pairs[1].second_best_index, pairs[1].second_best_distance),
            (0, 1)
        );
    }

    #[test]
    fn ties_go_to_lowest_reference_index() {
        let query = set(&[[0x00, 0x00], [0x00, 0x00]]);
        let reference = set(&[[0x0F, 0x00], [0x01, 0x00], [0x02, 0x00], [0x04, 0x00]]);
        let pairs = sequential().knn_match(&query, &reference).unwrap();
        for pair in pairs {
            assert_eq!((pair.best_index, pair.best_distance), (1, 1));
            assert_eq!((pair.second_best_index, pair.second_best_distance), (2, 1));
        }
    }

    #[test]
    fn fewer_than_two_descriptors_yields_no_pairs() {
        let one = set(&[[0x00, 0x00]]);
        let two = set(&[[0x00, 0x00], [0x01, 0x00]]);
        let empty = FeatureSet::new(vec![]);
        let matcher = sequential();
        assert!(matcher.knn_match(&one, &two).unwrap().is_empty());
        assert!(matcher.knn_match(&two, &one).unwrap().is_empty());
        assert!(matcher.knn_match(&empty, &two).unwrap().is_empty());
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let narrow = set(&[[0x00, 0x00], [0x01, 0x00]]);
        let wide = FeatureSet::new(vec![
            Descriptor::from_bytes(vec![0u8; 32]),
            Descriptor::from_bytes(vec![1u8; 32]),
        ]);
        assert!(matches!(
            sequential().knn_match(&narrow, &wide),
            Err(MatchError::DescriptorShapeMismatch(_))
        ));
    }

    #[test]
    fn parallel_scan_equals_sequential_scan() {
        let mut rng = SmallRng::seed_from_u64(11);
        let query =
            FeatureSet::new((0..200).map(|_| Descriptor::random_rng(&mut rng, 32)).collect());
        let reference =
            FeatureSet::new((0..300).map(|_| Descriptor::random_rng(&mut rng, 32)).collect());
        let parallel = KnnMatcher::new(&MatcherConfig::default());
        assert_eq!(
            parallel.knn_match(&query, &reference).unwrap(),
            sequential().knn_match(&query, &reference).unwrap()
        );
    }
}
