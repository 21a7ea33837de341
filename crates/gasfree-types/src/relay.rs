//! Records returned by the GasFree relay API.
//!
//! Every relay response is wrapped in a [`RelayEnvelope`]. The payload types
//! only name the fields this system reads; everything else the relay sends is
//! kept in a flattened `extra` map so callers can still display it.

use crate::AuthorizationMessage;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Envelope code the relay uses for success.
pub const RELAY_SUCCESS_CODE: i64 = 200;

/// Common wrapper of every relay response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEnvelope<T> {
	pub code: i64,
	#[serde(default)]
	pub reason: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
	pub data: Option<T>,
}

impl<T> RelayEnvelope<T> {
	/// True when the relay reported success.
	pub fn is_success(&self) -> bool {
		self.code == RELAY_SUCCESS_CODE
	}

	/// Best available description of a rejection.
	pub fn describe(&self) -> String {
		match (&self.reason, &self.message) {
			(Some(reason), Some(message)) => format!("{}: {}", reason, message),
			(Some(text), None) | (None, Some(text)) => text.clone(),
			(None, None) => format!("relay returned code {}", self.code),
		}
	}
}

/// `data` of `GET /api/v1/config/token/all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenList {
	#[serde(default)]
	pub tokens: Vec<RelayToken>,
}

/// A token the relay accepts for gasless transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayToken {
	pub token_address: String,
	#[serde(default)]
	pub symbol: Option<String>,
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub decimal: Option<u64>,
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub activate_fee: Option<u64>,
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub transfer_fee: Option<u64>,
	#[serde(default)]
	pub supported: Option<bool>,
}

/// `data` of `GET /api/v1/config/provider/all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderList {
	#[serde(default)]
	pub providers: Vec<RelayProvider>,
}

/// A service provider that submits transfers on the user's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayProvider {
	pub address: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub website: Option<String>,
	#[serde(default)]
	pub config: Option<ProviderConfig>,
}

/// Limits a provider advertises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub max_pending_transfer: Option<u64>,
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub min_deadline_duration: Option<u64>,
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub max_deadline_duration: Option<u64>,
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub default_deadline_duration: Option<u64>,
}

/// `data` of `GET /api/v1/address/{address}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
	#[serde(default)]
	pub account_address: Option<String>,
	#[serde(default)]
	pub gas_free_address: Option<String>,
	#[serde(default)]
	pub active: Option<bool>,
	#[serde(default, deserialize_with = "lenient_u64::deserialize")]
	pub nonce: Option<u64>,
	#[serde(default)]
	pub allow_submit: Option<bool>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Body of `POST /api/v1/gasfree/submit`: the nine message fields plus `sig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPayload {
	#[serde(flatten)]
	pub message: AuthorizationMessage,
	pub sig: String,
}

/// A transfer authorization as the relay tracks it.
///
/// Returned both by submit and by `GET /api/v1/gasfree/{traceId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
	pub id: String,
	#[serde(default)]
	pub state: String,
	#[serde(default)]
	pub txn_hash: Option<String>,
	#[serde(default)]
	pub txn_state: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl TransferRecord {
	/// Maps the relay's state string onto [`TransferState`].
	pub fn status(&self) -> TransferState {
		TransferState::from_relay(&self.state)
	}
}

/// Relay-reported lifecycle of a submitted authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
	/// Accepted and not yet final. Holds the raw relay state.
	Pending(String),
	/// Executed on chain.
	Confirmed,
	/// Rejected or reverted.
	Failed,
}

impl TransferState {
	/// `WAITING`, `INPROGRESS` and `CONFIRMING` are pending; `SUCCEED` is
	/// confirmed; `FAILED` is failed. Anything else stays pending.
	pub fn from_relay(state: &str) -> Self {
		match state.trim().to_ascii_uppercase().as_str() {
			"SUCCEED" => TransferState::Confirmed,
			"FAILED" => TransferState::Failed,
			_ => TransferState::Pending(state.to_string()),
		}
	}

	/// True for `Confirmed` and `Failed`.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, TransferState::Pending(_))
	}
}

impl fmt::Display for TransferState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransferState::Pending(raw) if raw.is_empty() => write!(f, "Pending"),
			TransferState::Pending(raw) => write!(f, "Pending ({})", raw),
			TransferState::Confirmed => write!(f, "Confirmed"),
			TransferState::Failed => write!(f, "Failed"),
		}
	}
}

/// Accepts an unsigned integer given either as a JSON number or a decimal
/// string. `null` and absent fields become `None`.
pub mod lenient_u64 {
	use super::*;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Option::<Value>::deserialize(deserializer)? {
			None | Some(Value::Null) => Ok(None),
			Some(Value::Number(n)) => n
				.as_u64()
				.map(Some)
				.ok_or_else(|| serde::de::Error::custom(format!("{} is not a u64", n))),
			Some(Value::String(s)) => s
				.trim()
				.parse::<u64>()
				.map(Some)
				.map_err(serde::de::Error::custom),
			Some(other) => Err(serde::de::Error::custom(format!(
				"expected integer, got {}",
				other
			))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_token_list_envelope() {
		let envelope: RelayEnvelope<TokenList> = serde_json::from_value(json!({
			"code": 200,
			"reason": null,
			"message": null,
			"data": { "tokens": [{
				"tokenAddress": "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t",
				"symbol": "USDT",
				"decimal": 6,
				"activateFee": "1000000",
				"transferFee": 1000000,
				"supported": true,
				"createdAt": "2024-01-01T00:00:00Z"
			}] }
		}))
		.unwrap();

		assert!(envelope.is_success());
		let token = &envelope.data.unwrap().tokens[0];
		assert_eq!(token.decimal, Some(6));
		assert_eq!(token.activate_fee, Some(1_000_000));
		assert_eq!(token.transfer_fee, Some(1_000_000));
	}

	#[test]
	fn test_rejection_without_data() {
		let envelope: RelayEnvelope<TransferRecord> = serde_json::from_value(json!({
			"code": 400,
			"reason": "BadRequest",
			"message": "deadline too short"
		}))
		.unwrap();

		assert!(!envelope.is_success());
		assert!(envelope.data.is_none());
		assert_eq!(envelope.describe(), "BadRequest: deadline too short");
	}

	fn decode<T: serde::de::DeserializeOwned>(body: Value) -> RelayEnvelope<T> {
		serde_json::from_value(body).unwrap()
	}

	#[test]
	fn test_envelope_decodes_for_any_payload_type() {
		let envelope: RelayEnvelope<AccountInfo> = decode(json!({ "code": 500 }));
		assert!(envelope.data.is_none());
		assert_eq!(envelope.describe(), "relay returned code 500");

		let envelope: RelayEnvelope<TokenList> = decode(json!({
			"code": 200,
			"data": { "tokens": [] }
		}));
		assert!(envelope.data.unwrap().tokens.is_empty());
	}

	#[test]
	fn test_account_info_nonce_zero_is_present() {
		let info: AccountInfo = serde_json::from_value(json!({
			"accountAddress": "TYBNgWfhGuNzdLtjKtxXTfskAhTbMcqbaG",
			"active": false,
			"nonce": 0,
			"allowSubmit": true,
			"assets": []
		}))
		.unwrap();

		assert_eq!(info.nonce, Some(0));
		assert!(info.extra.contains_key("assets"));
	}

	#[test]
	fn test_relay_state_mapping() {
		for pending in ["WAITING", "INPROGRESS", "CONFIRMING"] {
			assert_eq!(
				TransferState::from_relay(pending),
				TransferState::Pending(pending.to_string())
			);
		}
		assert_eq!(TransferState::from_relay("SUCCEED"), TransferState::Confirmed);
		assert_eq!(TransferState::from_relay("FAILED"), TransferState::Failed);

		let unknown = TransferState::from_relay("REORGED");
		assert_eq!(unknown, TransferState::Pending("REORGED".to_string()));
		assert!(!unknown.is_terminal());
	}

	#[test]
	fn test_submit_payload_flattens_message() {
		let payload = SubmitPayload {
			message: AuthorizationMessage {
				token: "t".into(),
				service_provider: "p".into(),
				user: "u".into(),
				receiver: "r".into(),
				value: "1".into(),
				max_fee: "2".into(),
				deadline: "3".into(),
				version: "1".into(),
				nonce: "0".into(),
			},
			sig: "ab".repeat(65),
		};

		let value = serde_json::to_value(&payload).unwrap();
		let object = value.as_object().unwrap();
		assert_eq!(object.len(), 10);
		assert_eq!(object["serviceProvider"], "p");
		assert_eq!(object["sig"].as_str().unwrap().len(), 130);
	}
}
