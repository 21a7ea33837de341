//! The `PermitTransfer` authorization message.
//!
//! On the wire every field is a string: addresses in base58check or hex form,
//! integers as decimal strings. `PermitTransfer` is the parsed, strictly typed
//! form that feeds the EIP-712 struct hash.

use crate::utils::{compute_final_digest, Eip712AbiEncoder, PERMIT_TRANSFER_TYPE};
use crate::validation::{Field, FieldType, Schema, ValidationError};
use crate::{Address, SigningDomain};
use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};

/// Field names of the authorization message in struct order.
pub const AUTHORIZATION_FIELDS: [&str; 9] = [
	"token",
	"serviceProvider",
	"user",
	"receiver",
	"value",
	"maxFee",
	"deadline",
	"version",
	"nonce",
];

/// Authorization message as exchanged with the gateway and the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationMessage {
	pub token: String,
	pub service_provider: String,
	pub user: String,
	pub receiver: String,
	pub value: String,
	pub max_fee: String,
	pub deadline: String,
	pub version: String,
	pub nonce: String,
}

/// Typed form of [`AuthorizationMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitTransfer {
	pub token: Address,
	pub service_provider: Address,
	pub user: Address,
	pub receiver: Address,
	pub value: U256,
	pub max_fee: U256,
	pub deadline: U256,
	pub version: U256,
	pub nonce: U256,
}

impl AuthorizationMessage {
	/// Schema requiring all nine fields to be present and string-typed.
	pub fn schema() -> Schema {
		Schema::new(
			AUTHORIZATION_FIELDS
				.iter()
				.map(|name| Field::new(*name, FieldType::String))
				.collect(),
			vec![],
		)
	}

	/// Parses every field into its EIP-712 type.
	///
	/// # Errors
	///
	/// Returns `ValidationError::InvalidValue` naming the first field that is
	/// not a valid address or decimal `uint256`.
	pub fn parse(&self) -> Result<PermitTransfer, ValidationError> {
		Ok(PermitTransfer {
			token: parse_address("token", &self.token)?,
			service_provider: parse_address("serviceProvider", &self.service_provider)?,
			user: parse_address("user", &self.user)?,
			receiver: parse_address("receiver", &self.receiver)?,
			value: parse_uint("value", &self.value)?,
			max_fee: parse_uint("maxFee", &self.max_fee)?,
			deadline: parse_uint("deadline", &self.deadline)?,
			version: parse_uint("version", &self.version)?,
			nonce: parse_uint("nonce", &self.nonce)?,
		})
	}

	/// Computes the EIP-712 digest of this message under `domain`.
	pub fn signing_digest(&self, domain: &SigningDomain) -> Result<B256, ValidationError> {
		Ok(self.parse()?.signing_digest(domain))
	}
}

impl PermitTransfer {
	/// keccak256(typeHash ‖ token ‖ serviceProvider ‖ user ‖ receiver ‖ value ‖
	/// maxFee ‖ deadline ‖ version ‖ nonce)
	pub fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&keccak256(PERMIT_TRANSFER_TYPE.as_bytes()));
		enc.push_address(&self.token.to_alloy());
		enc.push_address(&self.service_provider.to_alloy());
		enc.push_address(&self.user.to_alloy());
		enc.push_address(&self.receiver.to_alloy());
		enc.push_u256(self.value);
		enc.push_u256(self.max_fee);
		enc.push_u256(self.deadline);
		enc.push_u256(self.version);
		enc.push_u256(self.nonce);
		keccak256(enc.finish())
	}

	/// keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ structHash)
	pub fn signing_digest(&self, domain: &SigningDomain) -> B256 {
		compute_final_digest(&domain.separator(), &self.struct_hash())
	}
}

fn parse_address(field: &str, value: &str) -> Result<Address, ValidationError> {
	value
		.parse::<Address>()
		.map_err(|e| ValidationError::InvalidValue {
			field: field.to_string(),
			message: e.to_string(),
		})
}

fn parse_uint(field: &str, value: &str) -> Result<U256, ValidationError> {
	let trimmed = value.trim();
	if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
		return Err(ValidationError::InvalidValue {
			field: field.to_string(),
			message: format!("'{}' is not a decimal unsigned integer", value),
		});
	}
	U256::from_str_radix(trimmed, 10).map_err(|e| ValidationError::InvalidValue {
		field: field.to_string(),
		message: e.to_string(),
	})
}
