//! Lifecycle of a single transfer authorization.
//!
//! A [`TransferIntent`] moves `Building -> AwaitingSignature -> Submitted`.
//! Turning it into a submit payload consumes it, so a built message can be
//! submitted at most once. After submission the relay's state takes over.

use crate::TransferError;
use gasfree_types::{
	Address, AuthorizationMessage, SignRequest, Signature, SubmitPayload, TransferState,
};
use serde::Serialize;
use std::fmt;

/// Where an authorization is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AuthorizationPhase {
	Building,
	AwaitingSignature,
	Submitted,
	/// Accepted by the relay, not final yet. Holds the raw relay state.
	Pending(String),
	Confirmed,
	Failed,
}

impl AuthorizationPhase {
	/// True once the relay reported a final outcome.
	pub fn is_terminal(&self) -> bool {
		matches!(self, AuthorizationPhase::Confirmed | AuthorizationPhase::Failed)
	}
}

impl From<TransferState> for AuthorizationPhase {
	fn from(state: TransferState) -> Self {
		match state {
			TransferState::Pending(raw) => AuthorizationPhase::Pending(raw),
			TransferState::Confirmed => AuthorizationPhase::Confirmed,
			TransferState::Failed => AuthorizationPhase::Failed,
		}
	}
}

impl fmt::Display for AuthorizationPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AuthorizationPhase::Building => write!(f, "Building"),
			AuthorizationPhase::AwaitingSignature => write!(f, "AwaitingSignature"),
			AuthorizationPhase::Submitted => write!(f, "Submitted"),
			AuthorizationPhase::Pending(raw) if raw.is_empty() => write!(f, "Pending"),
			AuthorizationPhase::Pending(raw) => write!(f, "Pending ({})", raw),
			AuthorizationPhase::Confirmed => write!(f, "Confirmed"),
			AuthorizationPhase::Failed => write!(f, "Failed"),
		}
	}
}

/// A fully built authorization message on its way to submission.
#[derive(Debug)]
pub struct TransferIntent {
	message: AuthorizationMessage,
	phase: AuthorizationPhase,
}

impl TransferIntent {
	pub fn new(message: AuthorizationMessage) -> Self {
		Self {
			message,
			phase: AuthorizationPhase::Building,
		}
	}

	pub fn message(&self) -> &AuthorizationMessage {
		&self.message
	}

	pub fn phase(&self) -> &AuthorizationPhase {
		&self.phase
	}

	/// Builds the gateway request and moves to `AwaitingSignature`.
	///
	/// The domain is always sent explicitly so the gateway signs for the
	/// same chain and controller the relay will verify against.
	pub fn sign_request(
		&mut self,
		network: &str,
		chain_id: u64,
		verifying_contract: &Address,
	) -> SignRequest {
		self.phase = AuthorizationPhase::AwaitingSignature;
		SignRequest {
			message: self.message.clone(),
			network: Some(network.to_string()),
			contract: Some(verifying_contract.to_string()),
			chain_id: Some(chain_id),
		}
	}

	/// Attaches the gateway's signature and yields the one submit payload
	/// this intent will ever produce.
	///
	/// # Errors
	///
	/// Returns `TransferError::SignatureIntegrity` unless `signature` is
	/// exactly 130 hex characters. The intent is dropped either way.
	pub fn into_payload(self, signature: &str) -> Result<SubmitPayload, TransferError> {
		if self.phase != AuthorizationPhase::AwaitingSignature {
			return Err(TransferError::SignatureIntegrity(format!(
				"signature attached in phase {}",
				self.phase
			)));
		}
		let signature = Signature::from_hex(signature)
			.map_err(|e| TransferError::SignatureIntegrity(e.to_string()))?;

		Ok(SubmitPayload {
			message: self.message,
			sig: signature.to_hex(),
		})
	}
}
