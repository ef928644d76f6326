use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use nvl_independent_signer::utils::config::{normalize_go_style_flags, Args, Config};
use nvl_independent_signer::utils::logging::init_logging;
use nvl_independent_signer::{IndependentSigner, RunOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    init_logging();

    let args = Args::parse_from(normalize_go_style_flags(std::env::args_os()));

    info!(
        "🚀 Starting NVL Independent Signer v{}",
        env!("CARGO_PKG_VERSION")
    );

    let signer = match Config::from_args(args).and_then(IndependentSigner::new) {
        Ok(signer) => signer,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if signer.config().print_public_key {
        return match signer.public_key() {
            Ok(public_key) => {
                println!("{public_key}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to load signing key: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match signer.run().await {
        Ok(RunOutcome::NoNewBlock) => {
            info!("Done, no new block to sign");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Published { proof_hash }) => {
            info!("Done, published independent block {}", proof_hash);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Independent signer failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
