//! Signing gateway configuration.

use crate::{loader, resolve_env_vars, ConfigError};
use gasfree_types::{
	deserialize_networks, default_networks, resolve_network, NetworksConfig, SecretString,
	MAINNET,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Configuration of the `gasfree-signer` process.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
	pub gateway: GatewaySection,
	/// Network table used to resolve signing domains.
	#[serde(default = "default_networks", deserialize_with = "deserialize_networks")]
	pub networks: NetworksConfig,
}

/// The `[gateway]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewaySection {
	/// Host address to bind the server to.
	#[serde(default = "default_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_port")]
	pub port: u16,
	/// Hex-encoded secp256k1 private key.
	pub private_key: SecretString,
	/// Network used when a request names none.
	#[serde(default = "default_gateway_network")]
	pub default_network: String,
	/// Caller IPs allowed to reach any endpoint.
	#[serde(default = "default_allowed_callers")]
	pub allowed_callers: Vec<IpAddr>,
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_port() -> u16 {
	3333
}

fn default_gateway_network() -> String {
	MAINNET.to_string()
}

/// Loopback in its IPv4, IPv6 and IPv4-mapped forms.
pub fn default_allowed_callers() -> Vec<IpAddr> {
	vec![
		IpAddr::V4(Ipv4Addr::LOCALHOST),
		IpAddr::V6(Ipv6Addr::LOCALHOST),
		IpAddr::V6(Ipv4Addr::LOCALHOST.to_ipv6_mapped()),
	]
}

impl GatewayConfig {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		loader::load_file(path).await?.parse()
	}

	/// `host:port` the server binds to.
	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.gateway.host, self.gateway.port)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.gateway.private_key.is_blank() {
			return Err(ConfigError::Validation(
				"gateway.private_key cannot be empty".into(),
			));
		}
		resolve_network(&self.networks, &self.gateway.default_network)
			.map_err(|e| ConfigError::Validation(format!("gateway.default_network: {}", e)))?;
		if self.gateway.allowed_callers.is_empty() {
			return Err(ConfigError::Validation(
				"gateway.allowed_callers must list at least one address".into(),
			));
		}
		Ok(())
	}
}

impl FromStr for GatewayConfig {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: GatewayConfig = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
