use clap::Parser;
use eyre::{bail, Result};
use fingerprint_zk::cli::{
    format_batch_outcome, load_matcher_config, run_batch_verify, BatchVerifyArgs,
};
use fingerprint_zk_common::tracing::initialize_tracing;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = BatchVerifyArgs::parse();
    let config = load_matcher_config(args.matcher.clone())?;
    initialize_tracing(config.metrics.as_ref())?;

    let outcomes = run_batch_verify(&args, config)?;
    for outcome in &outcomes {
        println!("{}", format_batch_outcome(outcome));
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        bail!("{failed} of {} jobs failed", outcomes.len());
    }
    Ok(())
}
