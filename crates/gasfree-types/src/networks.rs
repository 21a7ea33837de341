//! Network configuration types.
//!
//! Each GasFree deployment is described by the chain id and controller
//! contract that make up its EIP-712 domain, plus the base URL of the relay
//! serving it. The table is an explicit value passed to whoever needs it, so
//! tests and private deployments can inject their own entries.

use crate::Address;
use alloy_primitives::hex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Name of the TRON mainnet entry.
pub const MAINNET: &str = "mainnet";
/// Name of the Nile testnet entry.
pub const TESTNET: &str = "testnet";

/// Errors raised when looking up a network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
	/// The requested network is not present in the table.
	#[error("Unknown network '{0}'")]
	Unknown(String),
}

/// Parameters of one GasFree deployment.
///
/// # Fields
///
/// * `chain_id` - Chain id bound into the signing domain
/// * `verifying_contract` - GasFreeController address bound into the signing domain
/// * `relay_url` - Base URL of the relay API for this network (includes its path
///   prefix). Only the orchestrator reads it; the gateway needs just the domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkParams {
	pub chain_id: u64,
	pub verifying_contract: Address,
	#[serde(default)]
	pub relay_url: String,
}

/// Mapping of network names ("mainnet", "testnet", ...) to their parameters.
pub type NetworksConfig = HashMap<String, NetworkParams>;

/// Returns the built-in mainnet and testnet parameters.
pub fn default_networks() -> NetworksConfig {
	let mut networks = HashMap::new();
	networks.insert(
		MAINNET.to_string(),
		NetworkParams {
			chain_id: 728_126_428,
			// TFFAMQLZybALaLb4uxHA9RBE7pxhUAjF3U
			verifying_contract: Address(hex!("39dd12a54e2bab7c82aa14a1e158b34263d2d510")),
			relay_url: "https://open.gasfree.io/tron".to_string(),
		},
	);
	networks.insert(
		TESTNET.to_string(),
		NetworkParams {
			chain_id: 3_448_148_188,
			// THQGuFzL87ZqhxkgqYEryRAd7gqFqL5rdc
			verifying_contract: Address(hex!("518688fbb39ccf1253f2b1217679fbe316329288")),
			relay_url: "https://open-test.gasfree.io/nile".to_string(),
		},
	);
	networks
}

/// Looks up a network by name.
pub fn resolve_network<'a>(
	networks: &'a NetworksConfig,
	name: &str,
) -> Result<&'a NetworkParams, NetworkError> {
	networks
		.get(name)
		.ok_or_else(|| NetworkError::Unknown(name.to_string()))
}

/// Deserializes a `[networks.<name>]` table and layers it over the built-in
/// defaults, so a config file only needs to list what it changes.
pub fn deserialize_networks<'de, D>(deserializer: D) -> Result<NetworksConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let overrides: HashMap<String, NetworkParams> = HashMap::deserialize(deserializer)?;
	let mut networks = default_networks();
	networks.extend(overrides);
	Ok(networks)
}
