//! EIP-712 signing domain of the GasFree controller.

use crate::networks::{resolve_network, NetworkError, NetworksConfig};
use crate::utils::compute_domain_hash;
use crate::Address;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Domain name the GasFreeController contract verifies against.
pub const DOMAIN_NAME: &str = "GasFreeController";
/// Domain version the GasFreeController contract verifies against.
pub const DOMAIN_VERSION: &str = "V1.0.0";

/// The signing domain binding a signature to one controller on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningDomain {
	pub name: String,
	pub version: String,
	pub chain_id: u64,
	pub verifying_contract: Address,
}

impl SigningDomain {
	/// Creates the GasFreeController domain for a chain and contract.
	pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
		Self {
			name: DOMAIN_NAME.to_string(),
			version: DOMAIN_VERSION.to_string(),
			chain_id,
			verifying_contract,
		}
	}

	/// Resolves the domain for a named network.
	pub fn for_network(networks: &NetworksConfig, network: &str) -> Result<Self, NetworkError> {
		let params = resolve_network(networks, network)?;
		Ok(Self::new(params.chain_id, params.verifying_contract))
	}

	/// Replaces the contract and/or chain id with explicit values.
	pub fn with_overrides(mut self, contract: Option<Address>, chain_id: Option<u64>) -> Self {
		if let Some(contract) = contract {
			self.verifying_contract = contract;
		}
		if let Some(chain_id) = chain_id {
			self.chain_id = chain_id;
		}
		self
	}

	/// Computes the domain separator hash.
	pub fn separator(&self) -> B256 {
		compute_domain_hash(
			&self.name,
			&self.version,
			self.chain_id,
			&self.verifying_contract.to_alloy(),
		)
	}
}
