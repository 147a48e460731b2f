use clap::Parser;
use eyre::Result;
use fingerprint_zk::cli::{run_generate_features, GenerateFeaturesArgs};
use fingerprint_zk_common::tracing::initialize_tracing;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    initialize_tracing(None)?;

    let args = GenerateFeaturesArgs::parse();
    let set = run_generate_features(&args)?;
    println!("Wrote {} descriptors to {}", set.len(), args.output.display());
    Ok(())
}
