//! Request handlers of the signing gateway.

use crate::GatewayState;
use axum::{body::Bytes, extract::State, response::Json};
use gasfree_account::AccountError;
use gasfree_types::{
	APIError, Address, AuthorizationMessage, Field, FieldType, Schema, SignRequest, SignResponse,
	SigningDomain, ValidationError, AUTHENTICATION_MISMATCH, INVALID_REQUEST,
	SIGNATURE_INTEGRITY, SIGNING_FAILED, VALIDATION_ERROR,
};
use serde_json::{json, Value};

/// Shape of the `POST /sign` body. `message` fields are checked in struct
/// order before anything is parsed.
fn sign_request_schema() -> Schema {
	Schema::new(
		vec![Field::new(
			"message",
			FieldType::Object(AuthorizationMessage::schema()),
		)],
		vec![
			Field::new("network", FieldType::String),
			Field::new("contract", FieldType::String),
			Field::new(
				"chainId",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			),
		],
	)
}

fn validation_error(err: &ValidationError) -> APIError {
	APIError::BadRequest {
		error_type: VALIDATION_ERROR.to_string(),
		message: err.to_string(),
		details: err.field().map(|field| json!({ "field": field })),
	}
}

/// Handles `POST /sign`.
///
/// Validates the body, resolves the signing domain and returns the 130-hex
/// signature of the authorization message.
pub async fn handle_sign(
	State(state): State<GatewayState>,
	body: Bytes,
) -> Result<Json<SignResponse>, APIError> {
	let payload: Value = serde_json::from_slice(&body).map_err(|e| {
		APIError::bad_request(INVALID_REQUEST, format!("Request body is not valid JSON: {}", e))
	})?;

	sign_request_schema()
		.validate(&payload)
		.map_err(|e| validation_error(&e))?;

	let request: SignRequest = serde_json::from_value(payload).map_err(|e| {
		validation_error(&ValidationError::DeserializationError(e.to_string()))
	})?;

	let domain = resolve_domain(&state, &request)?;

	match state.signer.sign_authorization(&domain, &request.message).await {
		Ok(signature) => {
			tracing::info!(
				user = %request.message.user,
				receiver = %request.message.receiver,
				nonce = %request.message.nonce,
				chain_id = domain.chain_id,
				"Authorization signed"
			);
			Ok(Json(SignResponse {
				signature: signature.to_hex(),
			}))
		},
		Err(e) => Err(account_error(e)),
	}
}

/// Handles `GET /health`.
pub async fn handle_health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

/// Table lookup by network name, then explicit `contract` / `chainId`
/// overrides.
fn resolve_domain(state: &GatewayState, request: &SignRequest) -> Result<SigningDomain, APIError> {
	let network = request
		.network
		.as_deref()
		.unwrap_or(state.default_network.as_str());

	let domain = SigningDomain::for_network(&state.networks, network).map_err(|e| {
		validation_error(&ValidationError::InvalidValue {
			field: "network".to_string(),
			message: e.to_string(),
		})
	})?;

	let contract = request
		.contract
		.as_deref()
		.map(|c| {
			c.parse::<Address>().map_err(|e| {
				validation_error(&ValidationError::InvalidValue {
					field: "contract".to_string(),
					message: e.to_string(),
				})
			})
		})
		.transpose()?;

	Ok(domain.with_overrides(contract, request.chain_id))
}

fn account_error(err: AccountError) -> APIError {
	match err {
		AccountError::InvalidMessage(e) => validation_error(&e),
		AccountError::AuthenticationMismatch { derived, received } => APIError::BadRequest {
			error_type: AUTHENTICATION_MISMATCH.to_string(),
			message: "Message user does not match the signing key".to_string(),
			details: Some(json!({
				"expected": derived.to_string(),
				"received": received.to_string(),
			})),
		},
		AccountError::InvalidSignature(message) => APIError::InternalServerError {
			error_type: SIGNATURE_INTEGRITY.to_string(),
			message,
		},
		other @ (AccountError::InvalidKey(_) | AccountError::SigningFailed(_)) => {
			tracing::error!(error = %other, "Signing failed");
			APIError::InternalServerError {
				error_type: SIGNING_FAILED.to_string(),
				message: "Signing failed".to_string(),
			}
		},
	}
}
