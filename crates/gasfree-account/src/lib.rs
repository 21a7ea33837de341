//! Account module for the GasFree signing gateway.
//!
//! This module holds the only code in the workspace that touches the private
//! key. It defines the interface the gateway signs through and the local-key
//! implementation of EIP-712 `PermitTransfer` signing.

use async_trait::async_trait;
use gasfree_types::{Address, AuthorizationMessage, Signature, SigningDomain, ValidationError};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub use implementations::local::TypedDataSigner;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The private key is missing or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// A message field is not a valid address or integer.
	#[error(transparent)]
	InvalidMessage(#[from] ValidationError),
	/// The message `user` is not the address of the signing key.
	#[error("Signer address {derived} does not match message user {received}")]
	AuthenticationMismatch { derived: Address, received: Address },
	/// The produced signature failed its post-signing checks.
	#[error("Signature integrity check failed: {0}")]
	InvalidSignature(String),
	/// The signing primitive itself failed.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
}

/// Trait defining the interface for authorization signers.
///
/// The gateway depends on this trait rather than on a concrete key holder, so
/// alternative key stores can be plugged in without touching the HTTP layer.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the address derived from the signing key.
	fn address(&self) -> Address;

	/// Signs `message` under `domain`.
	///
	/// Implementations must reject a message whose `user` is not
	/// [`AccountInterface::address`] and must never return a signature that
	/// does not recover to that address.
	async fn sign_authorization(
		&self,
		domain: &SigningDomain,
		message: &AuthorizationMessage,
	) -> Result<Signature, AccountError>;
}
