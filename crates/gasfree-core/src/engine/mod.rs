//! The transfer orchestrator.
//!
//! One call to [`TransferOrchestrator::authorize_transfer`] resolves the token,
//! provider and nonce from the relay, builds the authorization message, has
//! the gateway sign it and submits it once. Nothing is retried internally;
//! every failure comes back as a [`TransferError`].

use crate::policy::{FeePolicy, SelectionPolicy};
use crate::signer::SignerInterface;
use crate::state::{AuthorizationPhase, TransferIntent};
use crate::TransferError;
use gasfree_relay::{RelayError, RelayInterface};
use gasfree_types::{
	current_timestamp, decimal_to_base_units, format_token_amount, AccountInfo, Address,
	AuthorizationMessage, RelayProvider, RelayToken, TransferRecord,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// `version` field of every authorization message.
const PERMIT_VERSION: &str = "1";

/// Fixed parameters of an orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
	/// Network name sent to the gateway.
	pub network: String,
	/// Chain id of the signing domain; the relay of the same network checks it.
	pub chain_id: u64,
	/// GasFreeController address of the signing domain.
	pub verifying_contract: Address,
	/// The GasFree account that authorizes transfers.
	pub account: Address,
	/// Decimal places of the transferred token.
	pub decimals: u32,
	/// Validity window of an authorization.
	pub deadline_seconds: u64,
	/// Upper bound on each resolution lookup.
	pub resolution_timeout: Duration,
}

/// Outcome of a submitted authorization.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationResult {
	pub trace_id: String,
	pub state: AuthorizationPhase,
	/// The message as signed and submitted.
	pub message: AuthorizationMessage,
	/// The relay's record, unmodified.
	pub raw: TransferRecord,
}

/// Current state of a previously submitted authorization.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationStatus {
	pub trace_id: String,
	pub state: AuthorizationPhase,
	pub raw: TransferRecord,
}

/// What `authorize_transfer` would do with the same inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunReport {
	pub network: String,
	pub account: Address,
	pub receiver: Address,
	/// The amount as entered.
	pub amount: String,
	/// The amount in base units, as it would be signed.
	pub value: String,
}

/// Builds, signs and submits transfer authorizations.
pub struct TransferOrchestrator {
	relay: Arc<dyn RelayInterface>,
	signer: Arc<dyn SignerInterface>,
	selection: Box<dyn SelectionPolicy>,
	fees: Box<dyn FeePolicy>,
	settings: OrchestratorSettings,
}

impl TransferOrchestrator {
	pub fn new(
		relay: Arc<dyn RelayInterface>,
		signer: Arc<dyn SignerInterface>,
		selection: Box<dyn SelectionPolicy>,
		fees: Box<dyn FeePolicy>,
		settings: OrchestratorSettings,
	) -> Self {
		Self {
			relay,
			signer,
			selection,
			fees,
			settings,
		}
	}

	pub fn settings(&self) -> &OrchestratorSettings {
		&self.settings
	}

	/// Authorizes a gasless transfer of `amount` tokens to `receiver`.
	///
	/// `amount` is a decimal in whole tokens, e.g. `"5.0"`.
	#[instrument(skip_all, fields(receiver = %receiver, amount = %amount))]
	pub async fn authorize_transfer(
		&self,
		receiver: &str,
		amount: &str,
	) -> Result<AuthorizationResult, TransferError> {
		let (receiver, value) = self.validate_inputs(receiver, amount)?;

		let account = self.settings.account;
		let (tokens, providers, info) = tokio::try_join!(
			self.bounded("token list", self.relay.list_tokens()),
			self.bounded("provider list", self.relay.list_providers()),
			self.bounded("account info", self.relay.get_account_info(&account)),
		)?;

		let selection = self.selection.select(&tokens, &providers)?;
		let nonce = info.nonce.ok_or_else(|| {
			TransferError::Resolution(format!("relay returned no nonce for {}", account))
		})?;

		let message = AuthorizationMessage {
			token: selection.token.to_string(),
			service_provider: selection.provider.to_string(),
			user: account.to_string(),
			receiver: receiver.to_string(),
			value,
			max_fee: self.fees.max_fee(&selection).to_string(),
			deadline: (current_timestamp() + self.settings.deadline_seconds).to_string(),
			version: PERMIT_VERSION.to_string(),
			nonce: nonce.to_string(),
		};
		tracing::debug!(
			token = %message.token,
			provider = %message.service_provider,
			nonce = %message.nonce,
			deadline = %message.deadline,
			"Authorization built"
		);

		let mut intent = TransferIntent::new(message);
		let request = intent.sign_request(
			&self.settings.network,
			self.settings.chain_id,
			&self.settings.verifying_contract,
		);

		let signature = self.signer.sign(&request).await.map_err(|e| {
			let err = TransferError::from(e);
			match &err {
				TransferError::AuthenticationMismatch { derived, received } => tracing::warn!(
					%derived,
					%received,
					"Gateway key does not match the configured account"
				),
				TransferError::AccessDenied(message) => {
					tracing::warn!(%message, "Signing gateway denied access")
				},
				other => tracing::warn!(error = %other, "Signing request failed"),
			}
			err
		})?;

		let payload = intent.into_payload(&signature).map_err(|e| {
			tracing::error!(
				error = %e,
				length = signature.len(),
				"Gateway returned a malformed signature; not submitting"
			);
			e
		})?;

		let message = payload.message.clone();
		let record = self.relay.submit(payload).await?;
		let state = AuthorizationPhase::from(record.status());
		let decimals = u8::try_from(self.settings.decimals).unwrap_or(u8::MAX);
		tracing::info!(
			trace_id = %record.id,
			%state,
			amount = %format_token_amount(&message.value, decimals),
			max_fee = %format_token_amount(&message.max_fee, decimals),
			"Transfer authorization submitted"
		);

		Ok(AuthorizationResult {
			trace_id: record.id.clone(),
			state,
			message,
			raw: record,
		})
	}

	/// Reads the relay's current state of a submitted authorization.
	pub async fn authorization_status(
		&self,
		trace_id: &str,
	) -> Result<AuthorizationStatus, TransferError> {
		let record = self.relay.get_status(trace_id).await?;
		Ok(AuthorizationStatus {
			trace_id: record.id.clone(),
			state: AuthorizationPhase::from(record.status()),
			raw: record,
		})
	}

	/// Validates the inputs of `authorize_transfer` without any network call.
	pub fn dry_run(&self, receiver: &str, amount: &str) -> Result<DryRunReport, TransferError> {
		let (receiver, value) = self.validate_inputs(receiver, amount)?;
		Ok(DryRunReport {
			network: self.settings.network.clone(),
			account: self.settings.account,
			receiver,
			amount: amount.trim().to_string(),
			value,
		})
	}

	pub async fn supported_tokens(&self) -> Result<Vec<RelayToken>, TransferError> {
		Ok(self.relay.list_tokens().await?)
	}

	pub async fn service_providers(&self) -> Result<Vec<RelayProvider>, TransferError> {
		Ok(self.relay.list_providers().await?)
	}

	/// GasFree account state of the configured account.
	pub async fn account_info(&self) -> Result<AccountInfo, TransferError> {
		Ok(self.relay.get_account_info(&self.settings.account).await?)
	}

	/// Parses the receiver and converts the amount to base units.
	fn validate_inputs(
		&self,
		receiver: &str,
		amount: &str,
	) -> Result<(Address, String), TransferError> {
		let receiver = receiver
			.trim()
			.parse::<Address>()
			.map_err(|e| TransferError::Validation(format!("receiver: {}", e)))?;
		let value = decimal_to_base_units(amount, self.settings.decimals)?;
		Ok((receiver, value.to_string()))
	}

	/// Bounds a resolution lookup by the configured timeout.
	async fn bounded<T>(
		&self,
		what: &str,
		lookup: impl Future<Output = Result<T, RelayError>>,
	) -> Result<T, TransferError> {
		match tokio::time::timeout(self.settings.resolution_timeout, lookup).await {
			Ok(result) => result.map_err(|e| {
				tracing::warn!(lookup = what, error = %e, "Resolution lookup failed");
				TransferError::from(e)
			}),
			Err(_) => {
				tracing::warn!(lookup = what, "Resolution lookup timed out");
				Err(TransferError::Transport {
					reachable: false,
					message: format!(
						"{} lookup timed out after {}s",
						what,
						self.settings.resolution_timeout.as_secs()
					),
				})
			},
		}
	}
}
