//! Client side of the signing gateway.

use async_trait::async_trait;
use gasfree_types::SignRequest;
use thiserror::Error;

mod http;

pub use http::HttpSignerClient;

/// Errors returned by a signer client.
///
/// Gateway error codes map onto variants one to one, so the orchestrator can
/// propagate them without reinterpretation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Transport failure or timeout.
	#[error("{0}")]
	Unreachable(String),
	/// `ACCESS_DENIED`
	#[error("{0}")]
	AccessDenied(String),
	/// `INVALID_REQUEST` or `VALIDATION_ERROR`
	#[error("{message}")]
	Validation {
		field: Option<String>,
		message: String,
	},
	/// `AUTHENTICATION_MISMATCH`
	#[error("Signer address {expected} does not match message user {received}")]
	AuthenticationMismatch { expected: String, received: String },
	/// `SIGNATURE_INTEGRITY`
	#[error("{0}")]
	SignatureIntegrity(String),
	/// Any other gateway failure.
	#[error("Signing gateway failed ({status} {error}): {message}")]
	Failed {
		status: u16,
		error: String,
		message: String,
	},
	/// The gateway answered with a body that could not be interpreted.
	#[error("Invalid signing gateway response: {0}")]
	InvalidResponse(String),
}

/// Trait defining the interface for remote signers.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	/// Requests a signature over `request.message`.
	///
	/// Returns the signature exactly as the gateway sent it. Callers validate
	/// its shape before use.
	async fn sign(&self, request: &SignRequest) -> Result<String, SignerError>;
}
