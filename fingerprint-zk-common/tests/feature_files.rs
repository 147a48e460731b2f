mod tests {
    use fingerprint_zk_common::{
        features::{FeatureSet, FeatureSetLoader},
        matcher::Matcher,
        Descriptor, MatchError, MatcherConfig,
    };
    use rand::{rngs::SmallRng, SeedableRng};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fpzk-{}.{ext}", Uuid::new_v4()))
    }

    fn loader() -> FeatureSetLoader {
        FeatureSetLoader::new(&MatcherConfig::default())
    }

    #[test]
    fn loads_extractor_style_json() {
        let path = temp_path("json");
        std::fs::write(
            &path,
            r#"{
                "keypoints": [[[1.0, 2.0], 31.0, 12.5, 0.0004, 0, -1],
                              [[3.0, 4.0], 31.0, 80.0, 0.0003, 2, -1]],
                "descriptors": [[0, 1, 2, 3], [4, 5, 6, 7]],
                "image_shape": [256, 256]
            }"#,
        )
        .unwrap();
        let set = loader().load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.descriptors[1], Descriptor::from_bytes(vec![4, 5, 6, 7]));
        assert_eq!(set.keypoints.as_ref().map(Vec::len), Some(2));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn written_sets_load_back_in_both_encodings() {
        let mut rng = SmallRng::seed_from_u64(1);
        let set = FeatureSet::random_rng(&mut rng, 25, 32);
        for ext in ["json", "bin"] {
            let path = temp_path(ext);
            set.write_to(&path).unwrap();
            assert_eq!(loader().load(&path).unwrap(), set, "{ext}");
            std::fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn missing_file_is_corrupt() {
        assert!(matches!(
            loader().load(temp_path("json")),
            Err(MatchError::CorruptFeatureFile { .. })
        ));
    }

    #[test]
    fn truncated_bincode_is_corrupt() {
        let mut rng = SmallRng::seed_from_u64(2);
        let bytes = FeatureSet::random_rng(&mut rng, 10, 32)
            .to_bincode_vec()
            .unwrap();
        let path = temp_path("bin");
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(
            loader().load(&path),
            Err(MatchError::CorruptFeatureFile { .. })
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn load_errors_are_not_downgraded() {
        let matcher = Matcher::new(MatcherConfig::default()).unwrap();
        let path = temp_path("json");
        std::fs::write(&path, r#"{"keypoints": []}"#).unwrap();
        assert!(matches!(
            matcher.match_files(&path, &path),
            Err(MatchError::CorruptFeatureFile { .. })
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn match_files_equals_match_sets() {
        let mut rng = SmallRng::seed_from_u64(3);
        let a = FeatureSet::random_rng(&mut rng, 60, 32);
        let b = a.get_similar_set(&mut rng, 0.05);
        let (path_a, path_b) = (temp_path("json"), temp_path("bin"));
        a.write_to(&path_a).unwrap();
        b.write_to(&path_b).unwrap();

        let matcher = Matcher::new(MatcherConfig::default()).unwrap();
        assert_eq!(
            matcher.match_files(&path_a, &path_b).unwrap(),
            matcher.match_sets(&a, &b).unwrap()
        );
        std::fs::remove_file(path_a).unwrap();
        std::fs::remove_file(path_b).unwrap();
    }
}
