//! Main entry point of the `gasfree` CLI.
//!
//! Loads the orchestrator configuration, builds the relay and signer clients
//! and runs one subcommand. Results are printed to stdout as JSON; logs go
//! through `tracing`.

use clap::Parser;
use gasfree_config::Config;
use gasfree_core::OrchestratorBuilder;
use std::path::PathBuf;

mod commands;

use commands::Command;

/// Command-line arguments for the GasFree CLI.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "gasfree.toml", global = true)]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info", global = true)]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!(
		network = %config.gasfree.network,
		account = %config.gasfree.address,
		"Loaded configuration"
	);

	let orchestrator = OrchestratorBuilder::from_config(&config)?.build()?;

	match commands::run(&args.command, &orchestrator).await {
		Ok(output) => {
			println!("{}", serde_json::to_string_pretty(&output)?);
			Ok(())
		},
		Err(e) => {
			tracing::error!(category = ?e.category(), error = %e, "Command failed");
			Err(e.into())
		},
	}
}
