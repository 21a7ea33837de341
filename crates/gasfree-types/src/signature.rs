//! Recoverable ECDSA signatures in the `r ‖ s ‖ v` layout.

use crate::utils::without_0x_prefix;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Number of bytes in a signature.
pub const SIGNATURE_LENGTH: usize = 65;
/// Number of hex characters in a signature rendered without "0x".
pub const SIGNATURE_HEX_LENGTH: usize = SIGNATURE_LENGTH * 2;

/// Errors raised when a signature does not have the expected shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
	/// Wrong number of bytes (or hex characters, for hex input).
	#[error("Malformed signature: expected {expected} {unit}, got {actual}")]
	InvalidLength {
		expected: usize,
		actual: usize,
		unit: &'static str,
	},
	/// The hex string contains non-hex characters.
	#[error("Malformed signature: {0}")]
	InvalidHex(String),
}

/// A 65-byte signature: `r (32) ‖ s (32) ‖ v (1)`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
	/// Builds a signature from exactly 65 bytes.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
		if bytes.len() != SIGNATURE_LENGTH {
			return Err(SignatureError::InvalidLength {
				expected: SIGNATURE_LENGTH,
				actual: bytes.len(),
				unit: "bytes",
			});
		}
		let mut out = [0u8; SIGNATURE_LENGTH];
		out.copy_from_slice(bytes);
		Ok(Self(out))
	}

	/// Parses exactly 130 hex characters, with or without a "0x" prefix.
	pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
		let s = without_0x_prefix(s.trim());
		if s.len() != SIGNATURE_HEX_LENGTH {
			return Err(SignatureError::InvalidLength {
				expected: SIGNATURE_HEX_LENGTH,
				actual: s.len(),
				unit: "hex characters",
			});
		}
		let bytes = hex::decode(s).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
		Self::from_bytes(&bytes)
	}

	/// Returns the raw bytes.
	pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
		&self.0
	}

	/// Returns the 130-character lowercase hex form without "0x".
	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}

	/// Returns the recovery byte.
	pub fn v(&self) -> u8 {
		self.0[SIGNATURE_LENGTH - 1]
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Signature({})", self.to_hex())
	}
}

impl Serialize for Signature {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_hex())
	}
}

impl<'de> Deserialize<'de> for Signature {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Signature::from_hex(&s).map_err(serde::de::Error::custom)
	}
}
