//! Configuration module for the GasFree transfer system.
//!
//! This module provides the configuration of the orchestrator CLI ([`Config`])
//! and of the signing gateway ([`GatewayConfig`]). Both are TOML files with
//! `${VAR}` / `${VAR:-default}` environment substitution, validated after
//! parsing. The two files are separate on purpose: the orchestrator config
//! never holds the signing key, and the gateway config never holds the relay
//! credentials.

mod gateway;
mod loader;

pub use gateway::{default_allowed_callers, GatewayConfig, GatewaySection};

use gasfree_types::{
	deserialize_networks, default_networks, resolve_network, Address, NetworkParams,
	NetworksConfig, SecretString, TESTNET,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Only the message, not the input dump. The input may contain secrets.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Orchestrator configuration.
///
/// The single `gasfree.network` value selects both the relay base URL and the
/// signing domain the gateway is asked to use.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Account and network selection.
	pub gasfree: GasFreeConfig,
	/// Relay API access.
	pub relay: RelayConfig,
	/// Signing gateway endpoint.
	pub signer: SignerConfig,
	/// Payload construction policy.
	#[serde(default)]
	pub policy: PolicyConfig,
	/// Network table, layered over the built-in mainnet/testnet entries.
	#[serde(default = "default_networks", deserialize_with = "deserialize_networks")]
	pub networks: NetworksConfig,
}

/// The account transfers are sent from and the network they target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GasFreeConfig {
	/// Network name, a key of `networks`. Defaults to "testnet".
	#[serde(default = "default_network")]
	pub network: String,
	/// The signing account's address. Must match the gateway's key.
	pub address: String,
}

fn default_network() -> String {
	TESTNET.to_string()
}

/// Relay API access settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
	/// Per-request timeout in seconds.
	#[serde(default = "default_request_timeout")]
	pub timeout_seconds: u64,
	/// API credential pairs keyed by network name.
	#[serde(default)]
	pub credentials: HashMap<String, RelayCredentials>,
}

/// One relay API credential pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayCredentials {
	pub api_key: String,
	pub api_secret: SecretString,
}

/// Signing gateway endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignerConfig {
	/// Full URL of the gateway's sign endpoint, e.g. `http://127.0.0.1:3333/sign`.
	pub url: String,
	/// Request timeout in seconds.
	#[serde(default = "default_request_timeout")]
	pub timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
	30
}

/// How the orchestrator fills in the authorization message.
///
/// `token` and `provider` pin a specific relay entry; when unset the first
/// listed one is used.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
	#[serde(default = "default_deadline_seconds")]
	pub deadline_seconds: u64,
	#[serde(default = "default_base_fee")]
	pub base_fee: u64,
	#[serde(default = "default_fee_headroom")]
	pub fee_headroom: u64,
	/// Decimal places of the transferred token.
	#[serde(default = "default_decimals")]
	pub decimals: u32,
	/// Upper bound on each token/provider/account lookup.
	#[serde(default = "default_resolution_timeout")]
	pub resolution_timeout_seconds: u64,
	#[serde(default)]
	pub token: Option<String>,
	#[serde(default)]
	pub provider: Option<String>,
}

impl Default for PolicyConfig {
	fn default() -> Self {
		Self {
			deadline_seconds: default_deadline_seconds(),
			base_fee: default_base_fee(),
			fee_headroom: default_fee_headroom(),
			decimals: default_decimals(),
			resolution_timeout_seconds: default_resolution_timeout(),
			token: None,
			provider: None,
		}
	}
}

fn default_deadline_seconds() -> u64 {
	180
}

fn default_base_fee() -> u64 {
	1_000_000
}

fn default_fee_headroom() -> u64 {
	10_000_000
}

fn default_decimals() -> u32 {
	6
}

fn default_resolution_timeout() -> u64 {
	15
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		loader::load_file(path).await?.parse()
	}

	/// Parameters of the selected network.
	pub fn network_params(&self) -> Result<&NetworkParams, ConfigError> {
		resolve_network(&self.networks, &self.gasfree.network)
			.map_err(|e| ConfigError::Validation(e.to_string()))
	}

	/// Relay credentials for the selected network.
	pub fn credentials(&self) -> Result<&RelayCredentials, ConfigError> {
		self.relay
			.credentials
			.get(&self.gasfree.network)
			.ok_or_else(|| {
				ConfigError::Validation(format!(
					"No relay credentials configured for network '{}'",
					self.gasfree.network
				))
			})
	}

	/// The configured account address.
	pub fn account_address(&self) -> Result<Address, ConfigError> {
		parse_address("gasfree.address", &self.gasfree.address)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// Checks that the selected network exists, that it has a non-blank
	/// credential pair, that every address parses, and that timeouts and
	/// policy values are usable.
	fn validate(&self) -> Result<(), ConfigError> {
		let params = self.network_params()?;
		if !(params.relay_url.starts_with("http://") || params.relay_url.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"networks.{}.relay_url must be an http(s) URL, got '{}'",
				self.gasfree.network, params.relay_url
			)));
		}
		self.account_address()?;

		let credentials = self.credentials()?;
		if credentials.api_key.trim().is_empty() {
			return Err(ConfigError::Validation(format!(
				"Relay api_key for network '{}' cannot be empty",
				self.gasfree.network
			)));
		}
		if credentials.api_secret.is_blank() {
			return Err(ConfigError::Validation(format!(
				"Relay api_secret for network '{}' cannot be empty",
				self.gasfree.network
			)));
		}

		if !(self.signer.url.starts_with("http://") || self.signer.url.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"Signer url must be an http(s) URL, got '{}'",
				self.signer.url
			)));
		}

		if self.relay.timeout_seconds == 0 || self.signer.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Request timeouts must be greater than 0".into(),
			));
		}

		let policy = &self.policy;
		if policy.deadline_seconds == 0 {
			return Err(ConfigError::Validation(
				"policy.deadline_seconds must be greater than 0".into(),
			));
		}
		if policy.resolution_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"policy.resolution_timeout_seconds must be greater than 0".into(),
			));
		}
		if policy.decimals > 18 {
			return Err(ConfigError::Validation(
				"policy.decimals cannot exceed 18".into(),
			));
		}
		if let Some(token) = &policy.token {
			parse_address("policy.token", token)?;
		}
		if let Some(provider) = &policy.provider {
			parse_address("policy.provider", provider)?;
		}

		Ok(())
	}
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
	value
		.parse::<Address>()
		.map_err(|e| ConfigError::Validation(format!("{} is not a valid address: {}", field, e)))
}

/// Parses a TOML string, resolving environment variables first and
/// validating afterwards.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
