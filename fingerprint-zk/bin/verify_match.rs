use clap::Parser;
use eyre::Result;
use fingerprint_zk::cli::{load_matcher_config, run_verify_match, VerifyMatchArgs};
use fingerprint_zk_common::{report::DecisionReport, tracing::initialize_tracing};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = VerifyMatchArgs::parse();
    let config = load_matcher_config(args.matcher.clone())?;
    initialize_tracing(config.metrics.as_ref())?;

    let result = run_verify_match(&args, config)?;
    println!("{}", DecisionReport::new(&result).verdict());
    Ok(())
}
