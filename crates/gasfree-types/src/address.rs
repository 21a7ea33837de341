//! TRON account addresses.
//!
//! A TRON address is a 20-byte account hash (the same bytes an EVM address
//! carries) prefixed with the version byte `0x41`. Users see it in base58check
//! form (`T...`); the EIP-712 encoder only ever sees the 20 bytes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version byte that precedes every mainnet and testnet TRON address.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// Errors that can occur while parsing an address string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
	/// The string is neither valid base58check nor valid hex.
	#[error("Invalid address encoding: {0}")]
	InvalidEncoding(String),
	/// The decoded payload has the wrong number of bytes.
	#[error("Invalid address length: expected 20 bytes, got {0}")]
	InvalidLength(usize),
	/// The decoded payload does not start with the TRON version byte.
	#[error("Invalid address prefix: expected 0x41, got 0x{0:02x}")]
	InvalidPrefix(u8),
}

/// A 20-byte account address.
///
/// Parses from base58check (`TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t`), `0x`-prefixed
/// hex or `41`-prefixed hex. Displays and serializes in base58check form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
	/// Returns the raw 20 address bytes.
	pub fn as_bytes(&self) -> &[u8; 20] {
		&self.0
	}

	/// Returns the base58check representation (`T...`).
	pub fn to_base58(&self) -> String {
		let mut payload = Vec::with_capacity(21);
		payload.push(TRON_ADDRESS_PREFIX);
		payload.extend_from_slice(&self.0);
		bs58::encode(payload).with_check().into_string()
	}

	/// Returns the `0x`-prefixed lowercase hex representation of the 20 bytes.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(self.0))
	}

	/// Converts to the alloy address type used by the EIP-712 encoder.
	pub fn to_alloy(&self) -> alloy_primitives::Address {
		alloy_primitives::Address::from(self.0)
	}

	fn from_payload(payload: &[u8]) -> Result<Self, AddressError> {
		match payload.len() {
			20 => {
				let mut bytes = [0u8; 20];
				bytes.copy_from_slice(payload);
				Ok(Self(bytes))
			},
			21 => {
				if payload[0] != TRON_ADDRESS_PREFIX {
					return Err(AddressError::InvalidPrefix(payload[0]));
				}
				let mut bytes = [0u8; 20];
				bytes.copy_from_slice(&payload[1..]);
				Ok(Self(bytes))
			},
			len => Err(AddressError::InvalidLength(len)),
		}
	}
}

impl From<alloy_primitives::Address> for Address {
	fn from(address: alloy_primitives::Address) -> Self {
		let mut bytes = [0u8; 20];
		bytes.copy_from_slice(address.as_slice());
		Self(bytes)
	}
}

impl FromStr for Address {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();

		if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
			let bytes = hex::decode(hex_str)
				.map_err(|e| AddressError::InvalidEncoding(format!("Invalid hex: {}", e)))?;
			if bytes.len() != 20 {
				return Err(AddressError::InvalidLength(bytes.len()));
			}
			return Self::from_payload(&bytes);
		}

		if s.len() == 42 && s.starts_with("41") && s.chars().all(|c| c.is_ascii_hexdigit()) {
			let bytes = hex::decode(s)
				.map_err(|e| AddressError::InvalidEncoding(format!("Invalid hex: {}", e)))?;
			return Self::from_payload(&bytes);
		}

		let payload = bs58::decode(s)
			.with_check(None)
			.into_vec()
			.map_err(|e| AddressError::InvalidEncoding(format!("Invalid base58check: {}", e)))?;
		if payload.len() != 21 {
			return Err(AddressError::InvalidLength(payload.len().saturating_sub(1)));
		}
		Self::from_payload(&payload)
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_base58())
	}
}

impl fmt::Debug for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Address({})", self.to_base58())
	}
}

impl Serialize for Address {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_base58())
	}
}

impl<'de> Deserialize<'de> for Address {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}
