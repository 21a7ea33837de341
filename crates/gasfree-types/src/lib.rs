//! Common types module for the GasFree transfer-authorization system.
//!
//! This module defines the data types shared by the signing gateway, the relay
//! client and the transfer orchestrator. Keeping them in one place guarantees
//! that the message the orchestrator builds is byte-for-byte the message the
//! gateway hashes.

/// TRON account addresses in base58check and hex form.
pub mod address;
/// Request and response bodies of the signing gateway API.
pub mod api;
/// The `PermitTransfer` authorization message and its struct hash.
pub mod authorization;
/// EIP-712 signing domain resolution.
pub mod domain;
/// Per-network parameters (chain id, verifying contract, relay URL).
pub mod networks;
/// Records returned by the GasFree relay API.
pub mod relay;
/// Secret string wrapper for keys and API secrets.
pub mod secret_string;
/// Fixed-length recoverable ECDSA signatures.
pub mod signature;
/// Utility functions for hashing, conversion and formatting.
pub mod utils;
/// Field validation for untyped JSON payloads.
pub mod validation;

pub use address::{Address, AddressError};
pub use api::*;
pub use authorization::{AuthorizationMessage, PermitTransfer, AUTHORIZATION_FIELDS};
pub use domain::{SigningDomain, DOMAIN_NAME, DOMAIN_VERSION};
pub use networks::{
	default_networks, deserialize_networks, resolve_network, NetworkError, NetworkParams,
	NetworksConfig, MAINNET, TESTNET,
};
pub use relay::*;
pub use secret_string::SecretString;
pub use signature::{Signature, SignatureError, SIGNATURE_HEX_LENGTH, SIGNATURE_LENGTH};
pub use utils::{
	current_timestamp, decimal_to_base_units, format_token_amount, truncate_id,
	without_0x_prefix, AmountError,
};
pub use validation::*;
