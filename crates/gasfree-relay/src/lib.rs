//! Relay client module for the GasFree transfer system.
//!
//! This module provides authenticated access to the GasFree relay API: token
//! and provider discovery, account lookup, submission of signed
//! authorizations and status queries. Failures are returned as values that
//! distinguish an unreachable relay from one that answered and refused.

use async_trait::async_trait;
use gasfree_types::{AccountInfo, Address, RelayProvider, RelayToken, SubmitPayload, TransferRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod auth;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

pub use auth::RequestAuthenticator;
pub use implementations::http::HttpRelayClient;

/// Errors that can occur during relay operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
	/// Client could not be constructed from its configuration.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// A caller-supplied value cannot be placed in a relay request.
	#[error("Invalid request: {0}")]
	InvalidRequest(String),
	/// Transport failure or timeout; the relay never answered.
	#[error("Relay unreachable: {0}")]
	Unreachable(String),
	/// The relay answered with a non-2xx status or a non-success envelope code.
	#[error("Relay rejected request ({status}): {message}")]
	Rejected { status: i64, message: String },
	/// The relay answered with a body that could not be interpreted.
	#[error("Invalid relay response: {0}")]
	InvalidResponse(String),
}

/// Flat failure record handed to callers that expect `{status, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFailure {
	pub status: bool,
	pub message: String,
}

impl RelayError {
	/// Renders the error as `{status: false, message}`.
	pub fn to_failure(&self) -> RelayFailure {
		RelayFailure {
			status: false,
			message: self.to_string(),
		}
	}

	/// True when the relay answered, even if it refused.
	pub fn is_reachable(&self) -> bool {
		matches!(self, RelayError::Rejected { .. } | RelayError::InvalidResponse(_))
	}
}

/// Trait defining the interface for relay clients.
///
/// None of the methods retry. `submit` takes the payload by value; a payload
/// is built for exactly one submission attempt.
#[async_trait]
pub trait RelayInterface: Send + Sync {
	/// Tokens the relay accepts, in relay order.
	async fn list_tokens(&self) -> Result<Vec<RelayToken>, RelayError>;

	/// Service providers, in relay order.
	async fn list_providers(&self) -> Result<Vec<RelayProvider>, RelayError>;

	/// GasFree account state of `address`, including its next nonce.
	async fn get_account_info(&self, address: &Address) -> Result<AccountInfo, RelayError>;

	/// Submits a signed authorization. Returns the relay's record of it.
	async fn submit(&self, payload: SubmitPayload) -> Result<TransferRecord, RelayError>;

	/// Current record of a previously submitted authorization.
	async fn get_status(&self, trace_id: &str) -> Result<TransferRecord, RelayError>;
}
