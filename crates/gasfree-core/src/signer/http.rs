//! HTTP client of the signing gateway's `POST /sign`.

use super::{SignerError, SignerInterface};
use async_trait::async_trait;
use gasfree_types::{
	ErrorResponse, SignRequest, SignResponse, ACCESS_DENIED, AUTHENTICATION_MISMATCH,
	INVALID_REQUEST, SIGNATURE_INTEGRITY, VALIDATION_ERROR,
};
use reqwest::Url;
use std::time::Duration;

/// Signer that forwards requests to a remote gateway process.
pub struct HttpSignerClient {
	client: reqwest::Client,
	url: Url,
}

impl HttpSignerClient {
	/// Creates a client posting to `url`, the full sign endpoint.
	pub fn new(url: &str, timeout: Duration) -> Result<Self, SignerError> {
		let url = Url::parse(url).map_err(|e| {
			SignerError::Configuration(format!("invalid signer url '{}': {}", url, e))
		})?;

		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| {
				SignerError::Configuration(format!("failed to build HTTP client: {}", e))
			})?;

		Ok(Self { client, url })
	}
}

#[async_trait]
impl SignerInterface for HttpSignerClient {
	async fn sign(&self, request: &SignRequest) -> Result<String, SignerError> {
		let response = self
			.client
			.post(self.url.clone())
			.json(request)
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					SignerError::Unreachable("request timed out".to_string())
				} else {
					SignerError::Unreachable(e.to_string())
				}
			})?;

		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|e| SignerError::Unreachable(format!("failed to read response: {}", e)))?;

		if status.is_success() {
			let parsed: SignResponse = serde_json::from_slice(&body)
				.map_err(|e| SignerError::InvalidResponse(e.to_string()))?;
			return Ok(parsed.signature);
		}

		let error: ErrorResponse = serde_json::from_slice(&body).map_err(|_| {
			SignerError::InvalidResponse(format!("HTTP {} without error body", status.as_u16()))
		})?;
		Err(classify(status.as_u16(), error))
	}
}

fn classify(status: u16, error: ErrorResponse) -> SignerError {
	let detail = |key: &str| {
		error
			.details
			.as_ref()
			.and_then(|d| d.get(key))
			.and_then(|v| v.as_str())
			.map(str::to_string)
	};

	match error.error.as_str() {
		ACCESS_DENIED => SignerError::AccessDenied(error.message),
		INVALID_REQUEST | VALIDATION_ERROR => SignerError::Validation {
			field: detail("field"),
			message: error.message,
		},
		AUTHENTICATION_MISMATCH => SignerError::AuthenticationMismatch {
			expected: detail("expected").unwrap_or_default(),
			received: detail("received").unwrap_or_default(),
		},
		SIGNATURE_INTEGRITY => SignerError::SignatureIntegrity(error.message),
		_ => SignerError::Failed {
			status,
			error: error.error,
			message: error.message,
		},
	}
}
