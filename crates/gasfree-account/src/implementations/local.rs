//! Local private-key signer for `PermitTransfer` authorizations.

use crate::{AccountError, AccountInterface};
use alloy_primitives::{PrimitiveSignature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use gasfree_types::{
	truncate_id, Address, AuthorizationMessage, SecretString, Signature, SigningDomain,
	SIGNATURE_LENGTH,
};

/// Signs EIP-712 `PermitTransfer` messages with an in-memory secp256k1 key.
pub struct TypedDataSigner {
	signer: PrivateKeySigner,
	address: Address,
}

impl TypedDataSigner {
	/// Builds a signer from a hex private key, with or without "0x".
	pub fn from_secret(private_key: &SecretString) -> Result<Self, AccountError> {
		if private_key.is_blank() {
			return Err(AccountError::InvalidKey("private key is empty".into()));
		}
		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.trim()
				.parse()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".into()))
		})?;
		let address = Address::from(signer.address());
		Ok(Self { signer, address })
	}

	/// Address derived from the key.
	pub fn address(&self) -> Address {
		self.address
	}

	/// Validates and signs `message` under `domain`.
	///
	/// # Errors
	///
	/// * `InvalidMessage` if a field does not parse
	/// * `AuthenticationMismatch` if `user` is not this signer's address
	/// * `InvalidSignature` if the result fails the length or recovery check
	pub fn sign(
		&self,
		domain: &SigningDomain,
		message: &AuthorizationMessage,
	) -> Result<Signature, AccountError> {
		let permit = message.parse()?;

		if permit.user != self.address {
			tracing::warn!(
				derived = %self.address,
				received = %permit.user,
				"Authorization user does not match signing key"
			);
			return Err(AccountError::AuthenticationMismatch {
				derived: self.address,
				received: permit.user,
			});
		}

		let digest = permit.signing_digest(domain);
		let signature = self
			.signer
			.sign_hash_sync(&digest)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let signature = verify_signature(&digest, &signature.as_bytes(), &self.address)
			.inspect_err(|e| {
				tracing::error!(
					digest = %digest,
					error = %e,
					"Produced signature failed verification, possible signer bug"
				);
			})?;

		tracing::debug!(
			user = %permit.user,
			chain_id = domain.chain_id,
			digest = %truncate_id(&digest.to_string()),
			"Signed PermitTransfer"
		);
		Ok(signature)
	}
}

#[async_trait]
impl AccountInterface for TypedDataSigner {
	fn address(&self) -> Address {
		self.address
	}

	async fn sign_authorization(
		&self,
		domain: &SigningDomain,
		message: &AuthorizationMessage,
	) -> Result<Signature, AccountError> {
		self.sign(domain, message)
	}
}

/// Checks that `bytes` is a 65-byte `r ‖ s ‖ v` signature with `v` in
/// {27, 28} that recovers to `expected` over `digest`.
pub(crate) fn verify_signature(
	digest: &B256,
	bytes: &[u8],
	expected: &Address,
) -> Result<Signature, AccountError> {
	let signature =
		Signature::from_bytes(bytes).map_err(|e| AccountError::InvalidSignature(e.to_string()))?;
	let raw = signature.as_bytes();

	let y_parity = match raw[SIGNATURE_LENGTH - 1] {
		27 => false,
		28 => true,
		v => {
			return Err(AccountError::InvalidSignature(format!(
				"unexpected recovery byte {}",
				v
			)))
		},
	};
	let recoverable = PrimitiveSignature::new(
		U256::from_be_slice(&raw[..32]),
		U256::from_be_slice(&raw[32..64]),
		y_parity,
	);
	let recovered = recoverable
		.recover_address_from_prehash(digest)
		.map_err(|e| AccountError::InvalidSignature(e.to_string()))?;

	if Address::from(recovered) != *expected {
		return Err(AccountError::InvalidSignature(format!(
			"signature recovers to {} instead of {}",
			Address::from(recovered),
			expected
		)));
	}
	Ok(signature)
}
