use clap::Parser;
use eyre::Result;
use fingerprint_zk::cli::{
    load_matcher_config, run_generate_circuit_input, GenerateCircuitInputArgs,
};
use fingerprint_zk_common::{report::DecisionReport, tracing::initialize_tracing};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = GenerateCircuitInputArgs::parse();
    let config = load_matcher_config(args.matcher.clone())?;
    initialize_tracing(config.metrics.as_ref())?;

    let outcome = run_generate_circuit_input(&args, config)?;
    let json = outcome.payload.to_canonical_json()?;

    println!("Circuit input written to {}", args.output.display());
    print!("{}", String::from_utf8_lossy(&json));
    println!("SHA-256: {}", outcome.digest);
    println!();
    println!("{}", DecisionReport::new(&outcome.result));
    Ok(())
}
