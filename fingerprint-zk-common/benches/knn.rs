use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fingerprint_zk_common::{
    circuit::CircuitInputPayload, matcher::Matcher, FeatureSet, MatcherConfig,
    DESCRIPTOR_SIZE_BYTES,
};
use rand::{rngs::StdRng, SeedableRng};

const RNG_SEED: u64 = 42;
const SET_SIZES: [usize; 3] = [500, 1000, 2000];

fn bench_match_sets(c: &mut Criterion) {
    let mut group = c.benchmark_group("bench_match_sets");
    group.sample_size(10);

    for size in SET_SIZES {
        let mut rng = StdRng::seed_from_u64(RNG_SEED);
        let query = FeatureSet::random_rng(&mut rng, size, DESCRIPTOR_SIZE_BYTES);
        let reference = query.get_similar_set(&mut rng, 0.05);

        group.throughput(Throughput::Elements((size * size) as u64));
        for parallel_scan in [false, true] {
            let config = MatcherConfig {
                parallel_scan,
                ..Default::default()
            };
            let matcher = Matcher::new(config.clone()).unwrap();
            let label = if parallel_scan { "parallel" } else { "sequential" };

            group.bench_function(format!("{label} {size} x {size}"), |b| {
                b.iter(|| {
                    let result = matcher
                        .match_sets(black_box(&query), black_box(&reference))
                        .unwrap();
                    CircuitInputPayload::from_match_result(&result, &config)
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_match_sets);
criterion_main!(benches);
