//! Entry points shared by the binaries in `bin/`.

use clap::Parser;
use eyre::{bail, Result, WrapErr};
use fingerprint_zk_common::{
    batch::{load_manifest, verify_batch, BatchOutcome},
    circuit::CircuitInputPayload,
    config::{Opt, ENV_PREFIX},
    features::FeatureSetLoader,
    matcher::Matcher,
    report::DecisionReport,
    FeatureSet, MatchResult, MatcherConfig, DESCRIPTOR_SIZE_BYTES,
};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

const RNG_SEED: u64 = 42;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Match two feature files and write the circuit input",
    long_about = None
)]
pub struct GenerateCircuitInputArgs {
    /// Query feature file.
    pub query: PathBuf,

    /// Reference feature file.
    pub reference: PathBuf,

    #[arg(short, long, default_value = "circuit_input.json")]
    pub output: PathBuf,

    #[command(flatten)]
    pub matcher: Opt,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Match two feature files and print the verdict",
    long_about = None
)]
pub struct VerifyMatchArgs {
    pub query: PathBuf,

    pub reference: PathBuf,

    #[command(flatten)]
    pub matcher: Opt,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Match every pair listed in a manifest", long_about = None)]
pub struct BatchVerifyArgs {
    /// JSON array of `{ "query", "reference", "output"? }` jobs.
    pub manifest: PathBuf,

    #[command(flatten)]
    pub matcher: Opt,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Write a synthetic feature file", long_about = None)]
pub struct GenerateFeaturesArgs {
    /// Output path; `.bin` writes bincode, anything else JSON.
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 500)]
    pub count: usize,

    #[arg(long, default_value_t = DESCRIPTOR_SIZE_BYTES)]
    pub width: usize,

    /// Derive a noisy recapture of this feature file instead of random
    /// descriptors.
    #[arg(long)]
    pub similar_to: Option<PathBuf>,

    #[arg(long, default_value_t = 0.05)]
    pub flip_probability: f64,

    #[arg(short, long, env)]
    pub rng_seed: Option<u64>,
}

/// Environment config with command line overrides on top.
pub fn load_matcher_config(opt: Opt) -> Result<MatcherConfig> {
    let mut config = MatcherConfig::load_config(ENV_PREFIX)?;
    config.overwrite_defaults_with_cli_args(opt);
    config.validate().wrap_err("invalid matcher configuration")?;
    Ok(config)
}

#[derive(Debug)]
pub struct CircuitInputOutcome {
    pub result: MatchResult,
    pub payload: CircuitInputPayload,
    pub digest: String,
}

pub fn run_generate_circuit_input(
    args: &GenerateCircuitInputArgs,
    config: MatcherConfig,
) -> Result<CircuitInputOutcome> {
    let matcher = Matcher::new(config)?;
    let result = matcher.match_files(&args.query, &args.reference)?;
    let payload = CircuitInputPayload::from_match_result(&result, matcher.config());
    payload
        .write_to(&args.output)
        .wrap_err_with(|| format!("failed to write {}", args.output.display()))?;
    let digest = payload.digest()?;
    tracing::info!(output = %args.output.display(), digest, "Circuit input written");
    Ok(CircuitInputOutcome {
        result,
        payload,
        digest,
    })
}

pub fn run_verify_match(args: &VerifyMatchArgs, config: MatcherConfig) -> Result<MatchResult> {
    let matcher = Matcher::new(config)?;
    Ok(matcher.match_files(&args.query, &args.reference)?)
}

pub fn run_batch_verify(
    args: &BatchVerifyArgs,
    config: MatcherConfig,
) -> Result<Vec<BatchOutcome>> {
    let matcher = Matcher::new(config)?;
    let jobs = load_manifest(&args.manifest)?;
    tracing::info!("Verifying {} pairs from {}", jobs.len(), args.manifest.display());
    Ok(verify_batch(&matcher, &jobs))
}

pub fn run_generate_features(args: &GenerateFeaturesArgs) -> Result<FeatureSet> {
    let mut rng = StdRng::seed_from_u64(args.rng_seed.unwrap_or(RNG_SEED));
    let set = match &args.similar_to {
        Some(base) => {
            let loader = FeatureSetLoader::new(&MatcherConfig::default());
            loader
                .load(base)?
                .get_similar_set(&mut rng, args.flip_probability)
        }
        None => {
            if args.width == 0 {
                bail!("descriptor width must be positive");
            }
            FeatureSet::random_rng(&mut rng, args.count, args.width)
        }
    };
    set.write_to(&args.output)?;
    tracing::info!(
        output = %args.output.display(),
        descriptors = set.len(),
        "Feature file written"
    );
    Ok(set)
}

/// One line per batch job.
pub fn format_batch_outcome(outcome: &BatchOutcome) -> String {
    let pair = format!(
        "{} vs {}",
        outcome.job.query.display(),
        outcome.job.reference.display()
    );
    match &outcome.result {
        Ok(success) => format!(
            "{pair}: {} ({}/{} good matches, digest {})",
            DecisionReport::new(&success.result).verdict(),
            success.result.good_match_count,
            success.result.total_pairs(),
            success.payload_digest
        ),
        Err(e) => format!("{pair}: FAILED: {e}"),
    }
}
