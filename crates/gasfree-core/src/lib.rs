//! Transfer orchestration for the GasFree system.
//!
//! This crate assembles a `PermitTransfer` authorization from relay data,
//! obtains its signature from the signing gateway and submits it to the relay
//! exactly once. It never holds the private key: signing is a remote call
//! through [`SignerInterface`].

use gasfree_config::ConfigError;
use gasfree_relay::RelayError;
use gasfree_types::AmountError;
use thiserror::Error;

pub mod builder;
pub mod engine;
pub mod policy;
pub mod signer;
pub mod state;

pub use builder::OrchestratorBuilder;
pub use engine::{
	AuthorizationResult, AuthorizationStatus, DryRunReport, OrchestratorSettings, TransferOrchestrator,
};
pub use policy::{FeePolicy, FirstListed, FixedFee, Preferred, Selection, SelectionPolicy};
pub use signer::{HttpSignerClient, SignerError, SignerInterface};
pub use state::{AuthorizationPhase, TransferIntent};

/// Coarse classification of a [`TransferError`] for callers choosing a
/// remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
	/// The caller's input or configuration is wrong. Retrying will not help.
	InvalidInput,
	/// A remote system failed or lacked data. The caller may retry later.
	RemoteFailure,
	/// The signing path produced something that must not be trusted.
	Untrusted,
}

/// Errors that can occur while authorizing a transfer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
	/// Missing or unusable configuration.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Malformed receiver, amount or authorization field.
	#[error("Validation error: {0}")]
	Validation(String),
	/// The gateway key does not belong to the configured account.
	#[error("Signer address {derived} does not match message user {received}")]
	AuthenticationMismatch { derived: String, received: String },
	/// The gateway refused this caller.
	#[error("Access denied: {0}")]
	AccessDenied(String),
	/// Token, provider or nonce could not be determined.
	#[error("Resolution failure: {0}")]
	Resolution(String),
	/// The relay or the gateway was unreachable or answered with a failure.
	/// `reachable` is true when the remote answered and refused.
	#[error("Transport failure: {message}")]
	Transport { reachable: bool, message: String },
	/// The returned signature is malformed.
	#[error("Signature integrity error: {0}")]
	SignatureIntegrity(String),
}

impl TransferError {
	pub fn category(&self) -> ErrorCategory {
		match self {
			TransferError::Configuration(_)
			| TransferError::Validation(_)
			| TransferError::AuthenticationMismatch { .. }
			| TransferError::AccessDenied(_) => ErrorCategory::InvalidInput,
			TransferError::Resolution(_) | TransferError::Transport { .. } => {
				ErrorCategory::RemoteFailure
			},
			TransferError::SignatureIntegrity(_) => ErrorCategory::Untrusted,
		}
	}

	/// True when retrying the same call later could succeed.
	pub fn is_retryable(&self) -> bool {
		self.category() == ErrorCategory::RemoteFailure
	}
}

impl From<RelayError> for TransferError {
	fn from(err: RelayError) -> Self {
		match err {
			RelayError::Configuration(message) => TransferError::Configuration(message),
			RelayError::InvalidRequest(message) => TransferError::Validation(message),
			other => TransferError::Transport {
				reachable: other.is_reachable(),
				message: other.to_string(),
			},
		}
	}
}

impl From<SignerError> for TransferError {
	fn from(err: SignerError) -> Self {
		match err {
			SignerError::Configuration(message) => TransferError::Configuration(message),
			SignerError::AccessDenied(message) => TransferError::AccessDenied(message),
			SignerError::Validation { message, .. } => TransferError::Validation(message),
			SignerError::AuthenticationMismatch { expected, received } => {
				TransferError::AuthenticationMismatch {
					derived: expected,
					received,
				}
			},
			SignerError::SignatureIntegrity(message) => TransferError::SignatureIntegrity(message),
			SignerError::Unreachable(message) => TransferError::Transport {
				reachable: false,
				message: format!("Signing gateway unreachable: {}", message),
			},
			err @ (SignerError::Failed { .. } | SignerError::InvalidResponse(_)) => {
				TransferError::Transport {
					reachable: true,
					message: err.to_string(),
				}
			},
		}
	}
}

impl From<ConfigError> for TransferError {
	fn from(err: ConfigError) -> Self {
		TransferError::Configuration(err.to_string())
	}
}

impl From<AmountError> for TransferError {
	fn from(err: AmountError) -> Self {
		TransferError::Validation(err.to_string())
	}
}
