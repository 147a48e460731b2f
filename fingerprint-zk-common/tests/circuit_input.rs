mod tests {
    use fingerprint_zk_common::{
        circuit::{CircuitInputPayload, CIRCUIT_INPUT_KEYS},
        matcher::Matcher,
        FeatureSet, MatcherConfig, CIRCUIT_DISTANCES_LENGTH, MAX_DISTANCE, MAX_PAIRS,
    };
    use rand::{rngs::SmallRng, SeedableRng};
    use serde_json::Value;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fpzk-{}.{ext}", Uuid::new_v4()))
    }

    fn payload_for(query_count: usize, seed: u64) -> (CircuitInputPayload, Vec<(u32, u32)>) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let reference = FeatureSet::random_rng(&mut rng, 200, 32);
        let query = FeatureSet::new(reference.descriptors[..query_count].to_vec())
            .get_similar_set(&mut rng, 0.02);
        let config = MatcherConfig::default();
        let result = Matcher::new(config.clone())
            .unwrap()
            .match_sets(&query, &reference)
            .unwrap();
        (
            CircuitInputPayload::from_match_result(&result, &config),
            result.all_distance_pairs,
        )
    }

    #[test]
    fn keys_match_circuit_signals_exactly() {
        let (payload, _) = payload_for(5, 1);
        let value: Value = serde_json::from_slice(&payload.to_canonical_json().unwrap()).unwrap();
        let keys = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>();
        assert_eq!(keys, CIRCUIT_INPUT_KEYS);
        assert!(value.get("normalized_qualit").is_some());
        assert!(value.get("normalized_quality").is_none());
        for key in CIRCUIT_INPUT_KEYS.iter().filter(|k| **k != "distances") {
            assert!(value[key].is_u64(), "{key} must be an integer");
        }
        assert!(value["distances"]
            .as_array()
            .unwrap()
            .iter()
            .all(Value::is_u64));
    }

    #[test]
    fn reference_constants_are_serialized() {
        let (payload, _) = payload_for(5, 2);
        let value: Value = serde_json::from_slice(&payload.to_canonical_json().unwrap()).unwrap();
        assert_eq!(value["distance_weight"], 40);
        assert_eq!(value["count_weight"], 60);
        assert_eq!(value["threshold"], 70);
        assert_eq!(value["lowes_ratio"], 7000);
        assert_eq!(value["min_matches"], 10);
    }

    #[test]
    fn five_pairs_are_padded_to_fixed_length() {
        let (payload, pairs) = payload_for(5, 3);
        assert_eq!(pairs.len(), 5);
        assert_eq!(payload.distances.len(), CIRCUIT_DISTANCES_LENGTH);

        let flattened = pairs.iter().flat_map(|&(b, s)| [b, s]).collect::<Vec<_>>();
        assert_eq!(&payload.distances[..10], flattened.as_slice());
        assert_eq!(payload.distances[10..], vec![MAX_DISTANCE; 190]);
    }

    #[test]
    fn excess_pairs_are_truncated() {
        let (payload, pairs) = payload_for(150, 4);
        assert_eq!(pairs.len(), 150);
        assert_eq!(payload.distances.len(), 2 * MAX_PAIRS);

        let flattened = pairs[..MAX_PAIRS]
            .iter()
            .flat_map(|&(b, s)| [b, s])
            .collect::<Vec<_>>();
        assert_eq!(payload.distances, flattened);
    }

    #[test]
    fn canonical_encoding_is_byte_stable() {
        let (first, _) = payload_for(40, 5);
        let (second, _) = payload_for(40, 5);
        let bytes = first.to_canonical_json().unwrap();
        assert_eq!(bytes, second.to_canonical_json().unwrap());
        assert!(bytes.starts_with(b"{\n  \"count_score\": "));
        assert!(bytes.ends_with(b"}\n"));
        assert_eq!(first.digest().unwrap().len(), 64);
    }

    #[test]
    fn written_payload_reads_back() {
        let (payload, _) = payload_for(12, 6);
        let path = temp_path("json");
        payload.write_to(&path).unwrap();
        assert_eq!(
            std::fs::read(&path).unwrap(),
            payload.to_canonical_json().unwrap()
        );
        assert_eq!(CircuitInputPayload::read_from(&path).unwrap(), payload);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn write_failure_is_returned() {
        let (payload, _) = payload_for(5, 7);
        let path = temp_path("missing-dir").join("circuit_input.json");
        assert!(payload.write_to(path).is_err());
    }
}
