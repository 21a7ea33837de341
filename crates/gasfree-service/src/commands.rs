//! Subcommands of the `gasfree` CLI.

use clap::Subcommand;
use gasfree_core::{TransferError, TransferOrchestrator};
use serde::Serialize;
use serde_json::Value;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Authorize a gasless transfer
	Send {
		/// Receiving TRON address
		#[arg(long)]
		receiver: String,

		/// Amount in whole tokens, e.g. 5.0
		#[arg(long)]
		amount: String,

		/// Validate and report without contacting the relay or the gateway
		#[arg(long)]
		dry_run: bool,
	},
	/// Show the relay's state of a submitted authorization
	Status {
		/// Trace id returned by `send`
		trace_id: String,
	},
	/// List tokens the relay accepts
	Tokens,
	/// List service providers
	Providers,
	/// Show the configured account's GasFree state
	Account,
}

/// Runs `command` and returns its result as JSON.
pub async fn run(command: &Command, orchestrator: &TransferOrchestrator) -> Result<Value, TransferError> {
	match command {
		Command::Send {
			receiver,
			amount,
			dry_run: true,
		} => {
			let report = orchestrator.dry_run(receiver, amount)?;
			tracing::info!(
				receiver = %report.receiver,
				value = %report.value,
				"Dry run: transfer not submitted"
			);
			to_json(&report)
		},
		Command::Send {
			receiver,
			amount,
			dry_run: false,
		} => {
			tracing::info!(%receiver, %amount, "Sending transfer");
			to_json(&orchestrator.authorize_transfer(receiver, amount).await?)
		},
		Command::Status { trace_id } => to_json(&orchestrator.authorization_status(trace_id).await?),
		Command::Tokens => to_json(&orchestrator.supported_tokens().await?),
		Command::Providers => to_json(&orchestrator.service_providers().await?),
		Command::Account => to_json(&orchestrator.account_info().await?),
	}
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, TransferError> {
	serde_json::to_value(value)
		.map_err(|e| TransferError::Validation(format!("result is not serializable: {}", e)))
}
