//! API types for the signing gateway.
//!
//! This module defines the request/response bodies of `POST /sign` and the
//! error envelope shared by every gateway endpoint. The orchestrator's signer
//! client deserializes the same types, so both ends agree on the error codes.

use crate::AuthorizationMessage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller address is not on the allow-list.
pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
/// Body is not JSON or is missing the `message` object.
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
/// A message field is missing, wrong-typed or unparseable.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// The message `user` is not the signing key's address.
pub const AUTHENTICATION_MISMATCH: &str = "AUTHENTICATION_MISMATCH";
/// The produced signature failed the post-signing checks.
pub const SIGNATURE_INTEGRITY: &str = "SIGNATURE_INTEGRITY";
/// Any other signing failure.
pub const SIGNING_FAILED: &str = "SIGNING_FAILED";

/// Body of `POST /sign`.
///
/// `network` selects the signing domain; `contract` and `chainId` replace the
/// table values when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
	pub message: AuthorizationMessage,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub network: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contract: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<u64>,
}

/// Successful `POST /sign` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
	/// 130 lowercase hex characters, no "0x".
	pub signature: String,
}

/// API error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error code, one of the constants in this module
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Caller rejected by the allow-list (403)
	Forbidden { message: String },
	/// Bad request with validation errors (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Shorthand for a 400 without details.
	pub fn bad_request(error_type: &str, message: impl Into<String>) -> Self {
		APIError::BadRequest {
			error_type: error_type.to_string(),
			message: message.into(),
			details: None,
		}
	}

	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::Forbidden { .. } => 403,
			APIError::BadRequest { .. } => 400,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::Forbidden { message } => ErrorResponse {
				error: ACCESS_DENIED.to_string(),
				message: message.clone(),
				details: None,
			},
			APIError::BadRequest { error_type, message, details } => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::InternalServerError { error_type, message } => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::Forbidden { message } => write!(f, "Forbidden: {}", message),
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = match self.status_code() {
			400 => StatusCode::BAD_REQUEST,
			403 => StatusCode::FORBIDDEN,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		(status, Json(self.to_error_response())).into_response()
	}
}
