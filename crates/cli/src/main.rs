//! Bob's Corn CLI - one-shot purchase client commands.
//!
//! # Usage
//!
//! ```bash
//! # Print this device's client identity (created on first use)
//! corn-cli identity
//!
//! # Make one purchase attempt; exits 1 unless it succeeds
//! corn-cli buy
//!
//! # Same, printing the classified outcome as JSON
//! corn-cli buy --json
//! ```
//!
//! Configuration comes from the same environment variables as the
//! interactive `bobs-corn` binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

use bobs_corn_storefront::config::StorefrontConfig;
use bobs_corn_storefront::error::AppError;
use bobs_corn_storefront::telemetry::{init_sentry, init_tracing};
use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

/// Log filter when `RUST_LOG` is unset. Library chatter stays at warn so the
/// command's own output is what the user sees.
const LOG_FILTER: &str = "bobs_corn_storefront=warn,bobs_corn_cli=warn";

#[derive(Parser)]
#[command(name = "corn-cli")]
#[command(author, version, about = "Bob's Corn purchase client tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the client identity, creating it if needed
    Identity,
    /// Make a single purchase attempt
    Buy {
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LOG_FILTER);
            AppError::from(e).report();
            std::process::exit(1);
        }
    };

    let sentry_guard = init_sentry(&config);
    init_tracing(LOG_FILTER);

    let code = match run(cli, &config).await {
        Ok(()) => 0,
        Err(e) => {
            e.report();
            1
        }
    };

    drop(sentry_guard);
    std::process::exit(code);
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CommandError> {
    match cli.command {
        Commands::Identity => commands::identity::show(config)?,
        Commands::Buy { json } => commands::buy::run(config, json).await?,
    }
    Ok(())
}
