//! Entry point of the `gasfree-signer` process.
//!
//! Loads the gateway configuration, binds the listener and serves `POST /sign`
//! until Ctrl-C.

use clap::Parser;
use gasfree_config::GatewayConfig;
use std::path::PathBuf;
use tokio::net::TcpListener;

/// Command-line arguments for the signing gateway.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "gateway.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
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
		.init();

	let config = GatewayConfig::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!(
		config = %args.config.display(),
		default_network = %config.gateway.default_network,
		"Loaded gateway configuration"
	);

	let listener = TcpListener::bind(config.bind_address()).await?;

	gasfree_gateway::serve(listener, &config, async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for shutdown signal");
		}
		tracing::info!("Shutdown signal received");
	})
	.await?;

	Ok(())
}
