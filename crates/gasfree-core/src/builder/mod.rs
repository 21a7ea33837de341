//! Assembles a [`TransferOrchestrator`] from configuration or from explicit
//! components.

use crate::engine::{OrchestratorSettings, TransferOrchestrator};
use crate::policy::{FeePolicy, FirstListed, FixedFee, Preferred, SelectionPolicy};
use crate::signer::{HttpSignerClient, SignerInterface};
use crate::TransferError;
use gasfree_config::Config;
use gasfree_relay::{HttpRelayClient, RelayInterface, RequestAuthenticator};
use gasfree_types::Address;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`TransferOrchestrator`].
///
/// The relay and the signer are required; selection defaults to
/// [`FirstListed`] and fees to [`FixedFee::default`].
pub struct OrchestratorBuilder {
	settings: OrchestratorSettings,
	relay: Option<Arc<dyn RelayInterface>>,
	signer: Option<Arc<dyn SignerInterface>>,
	selection: Box<dyn SelectionPolicy>,
	fees: Box<dyn FeePolicy>,
}

impl OrchestratorBuilder {
	pub fn new(settings: OrchestratorSettings) -> Self {
		Self {
			settings,
			relay: None,
			signer: None,
			selection: Box::new(FirstListed),
			fees: Box::new(FixedFee::default()),
		}
	}

	/// Builder with settings, policies and HTTP clients taken from `config`.
	///
	/// Clients are only constructed here; no request is sent.
	pub fn from_config(config: &Config) -> Result<Self, TransferError> {
		let params = config.network_params()?;
		let credentials = config.credentials()?;
		let policy = &config.policy;

		let settings = OrchestratorSettings {
			network: config.gasfree.network.clone(),
			chain_id: params.chain_id,
			verifying_contract: params.verifying_contract,
			account: config.account_address()?,
			decimals: policy.decimals,
			deadline_seconds: policy.deadline_seconds,
			resolution_timeout: Duration::from_secs(policy.resolution_timeout_seconds),
		};

		let auth = RequestAuthenticator::new(&credentials.api_key, &credentials.api_secret)?;
		let relay = HttpRelayClient::new(
			&params.relay_url,
			auth,
			Duration::from_secs(config.relay.timeout_seconds),
		)?;
		let signer = HttpSignerClient::new(
			&config.signer.url,
			Duration::from_secs(config.signer.timeout_seconds),
		)?;

		let builder = Self::new(settings)
			.relay(Arc::new(relay))
			.signer(Arc::new(signer))
			.fee_policy(Box::new(FixedFee {
				base: policy.base_fee,
				headroom: policy.fee_headroom,
			}));

		if policy.token.is_none() && policy.provider.is_none() {
			return Ok(builder);
		}
		Ok(builder.selection_policy(Box::new(Preferred {
			token: parse_optional("policy.token", policy.token.as_deref())?,
			provider: parse_optional("policy.provider", policy.provider.as_deref())?,
		})))
	}

	pub fn relay(mut self, relay: Arc<dyn RelayInterface>) -> Self {
		self.relay = Some(relay);
		self
	}

	pub fn signer(mut self, signer: Arc<dyn SignerInterface>) -> Self {
		self.signer = Some(signer);
		self
	}

	pub fn selection_policy(mut self, selection: Box<dyn SelectionPolicy>) -> Self {
		self.selection = selection;
		self
	}

	pub fn fee_policy(mut self, fees: Box<dyn FeePolicy>) -> Self {
		self.fees = fees;
		self
	}

	pub fn build(self) -> Result<TransferOrchestrator, TransferError> {
		let relay = self
			.relay
			.ok_or_else(|| TransferError::Configuration("no relay client configured".into()))?;
		let signer = self
			.signer
			.ok_or_else(|| TransferError::Configuration("no signer configured".into()))?;

		tracing::debug!(
			network = %self.settings.network,
			account = %self.settings.account,
			"Orchestrator ready"
		);
		Ok(TransferOrchestrator::new(
			relay,
			signer,
			self.selection,
			self.fees,
			self.settings,
		))
	}
}

fn parse_optional(field: &str, value: Option<&str>) -> Result<Option<Address>, TransferError> {
	value
		.map(|v| {
			v.parse::<Address>()
				.map_err(|e| TransferError::Configuration(format!("{}: {}", field, e)))
		})
		.transpose()
}
