//! HTTP implementation of the relay interface.

use crate::{RelayError, RelayInterface, RequestAuthenticator};
use async_trait::async_trait;
use gasfree_types::{
	current_timestamp, AccountInfo, Address, ProviderList, RelayEnvelope, RelayProvider,
	RelayToken, SubmitPayload, TokenList, TransferRecord,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

const TOKENS_ENDPOINT: &str = "/api/v1/config/token/all";
const PROVIDERS_ENDPOINT: &str = "/api/v1/config/provider/all";
const SUBMIT_ENDPOINT: &str = "/api/v1/gasfree/submit";

/// Longest slice of an unparseable error body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Relay client speaking the GasFree REST API over HTTP.
pub struct HttpRelayClient {
	client: reqwest::Client,
	/// Network base URL without trailing slash, e.g. `https://open-test.gasfree.io/nile`.
	base_url: String,
	auth: RequestAuthenticator,
}

impl HttpRelayClient {
	/// Creates a client for the relay at `base_url`.
	///
	/// `timeout` bounds every request end to end.
	pub fn new(
		base_url: &str,
		auth: RequestAuthenticator,
		timeout: Duration,
	) -> Result<Self, RelayError> {
		let base_url = base_url.trim_end_matches('/').to_string();
		Url::parse(&base_url).map_err(|e| {
			RelayError::Configuration(format!("invalid relay url '{}': {}", base_url, e))
		})?;

		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(10)
			.timeout(timeout)
			.build()
			.map_err(|e| RelayError::Configuration(format!("failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url,
			auth,
		})
	}

	fn url(&self, endpoint: &str) -> Result<Url, RelayError> {
		Url::parse(&format!("{}{}", self.base_url, endpoint))
			.map_err(|e| RelayError::InvalidRequest(format!("{}: {}", endpoint, e)))
	}

	/// Builds a request carrying the authentication headers. The signed path
	/// is the full URL path, base prefix included.
	fn prepare(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, RelayError> {
		let url = self.url(endpoint)?;
		let timestamp = current_timestamp();
		let signature = self.auth.sign(method.as_str(), url.path(), timestamp);

		Ok(self
			.client
			.request(method, url)
			.header("Timestamp", timestamp.to_string())
			.header(AUTHORIZATION, self.auth.authorization_header(&signature))
			.header(CONTENT_TYPE, "application/json"))
	}

	/// Sends the request and unwraps the relay envelope.
	async fn execute<T: DeserializeOwned>(
		&self,
		endpoint: &str,
		request: RequestBuilder,
	) -> Result<T, RelayError> {
		tracing::debug!(endpoint, "Relay request");

		let response = request.send().await.map_err(|e| {
			let reason = if e.is_timeout() {
				"request timed out".to_string()
			} else {
				e.to_string()
			};
			tracing::warn!(endpoint, error = %reason, "Relay request failed");
			RelayError::Unreachable(reason)
		})?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| RelayError::Unreachable(format!("failed to read response: {}", e)))?;

		if !status.is_success() {
			let message = serde_json::from_str::<RelayEnvelope<serde_json::Value>>(&body)
				.map(|envelope| envelope.describe())
				.unwrap_or_else(|_| body.chars().take(MAX_ERROR_BODY).collect());
			tracing::warn!(endpoint, status = status.as_u16(), %message, "Relay rejected request");
			return Err(RelayError::Rejected {
				status: i64::from(status.as_u16()),
				message,
			});
		}

		let envelope: RelayEnvelope<T> = serde_json::from_str(&body)
			.map_err(|e| RelayError::InvalidResponse(format!("{}: {}", endpoint, e)))?;

		if !envelope.is_success() {
			let message = envelope.describe();
			tracing::warn!(endpoint, code = envelope.code, %message, "Relay returned error code");
			return Err(RelayError::Rejected {
				status: envelope.code,
				message,
			});
		}

		envelope
			.data
			.ok_or_else(|| RelayError::InvalidResponse(format!("{} returned no data", endpoint)))
	}

	async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RelayError> {
		let request = self.prepare(Method::GET, endpoint)?;
		self.execute(endpoint, request).await
	}
}

#[async_trait]
impl RelayInterface for HttpRelayClient {
	async fn list_tokens(&self) -> Result<Vec<RelayToken>, RelayError> {
		let list: TokenList = self.get(TOKENS_ENDPOINT).await?;
		Ok(list.tokens)
	}

	async fn list_providers(&self) -> Result<Vec<RelayProvider>, RelayError> {
		let list: ProviderList = self.get(PROVIDERS_ENDPOINT).await?;
		Ok(list.providers)
	}

	async fn get_account_info(&self, address: &Address) -> Result<AccountInfo, RelayError> {
		self.get(&format!("/api/v1/address/{}", address)).await
	}

	async fn submit(&self, payload: SubmitPayload) -> Result<TransferRecord, RelayError> {
		let request = self.prepare(Method::POST, SUBMIT_ENDPOINT)?.json(&payload);
		let record: TransferRecord = self.execute(SUBMIT_ENDPOINT, request).await?;
		tracing::info!(trace_id = %record.id, state = %record.state, "Authorization submitted");
		Ok(record)
	}

	async fn get_status(&self, trace_id: &str) -> Result<TransferRecord, RelayError> {
		if trace_id.is_empty()
			|| !trace_id
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		{
			return Err(RelayError::InvalidRequest(format!(
				"'{}' is not a valid trace id",
				trace_id
			)));
		}
		self.get(&format!("/api/v1/gasfree/{}", trace_id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{
		extract::{Path, Request},
		http::{HeaderMap, StatusCode},
		middleware::{self, Next},
		response::{IntoResponse, Response},
		routing::{get, post},
		Json, Router,
	};
	use gasfree_types::{AuthorizationMessage, SecretString, TransferState};
	use serde_json::{json, Value};

	fn authenticator() -> RequestAuthenticator {
		RequestAuthenticator::new("key-1", &SecretString::from("test-secret")).unwrap()
	}

	/// Rejects requests whose Authorization header does not match the HMAC
	/// of method, full path and the Timestamp header.
	async fn check_auth(request: Request, next: Next) -> Response {
		let headers = request.headers();
		let timestamp = headers
			.get("Timestamp")
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.parse::<u64>().ok());
		let content_type_ok = headers
			.get(CONTENT_TYPE)
			.is_some_and(|v| v.as_bytes() == b"application/json");

		let expected = timestamp.map(|ts| {
			let auth = authenticator();
			auth.authorization_header(&auth.sign(request.method().as_str(), request.uri().path(), ts))
		});
		let received = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

		if !content_type_ok || expected.is_none() || expected.as_deref() != received {
			return (
				StatusCode::UNAUTHORIZED,
				Json(json!({ "code": 401, "reason": "Unauthorized", "message": "bad signature" })),
			)
				.into_response();
		}
		next.run(request).await
	}

	fn envelope(data: Value) -> Json<Value> {
		Json(json!({ "code": 200, "reason": null, "message": null, "data": data }))
	}

	fn relay_app() -> Router {
		Router::new()
			.route(
				"/nile/api/v1/config/token/all",
				get(|| async {
					envelope(json!({ "tokens": [
						{ "tokenAddress": "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", "symbol": "USDT", "decimal": 6 },
						{ "tokenAddress": "TEdvoHEatmDKvTh3o9vBRB9Vdtbhn4QFhy", "symbol": "OTHER", "decimal": 18 }
					] }))
				}),
			)
			.route(
				"/nile/api/v1/config/provider/all",
				get(|| async {
					envelope(json!({ "providers": [
						{ "address": "TBXSw8fM4jpQkGc6zZjsVABFpVN7UvXPdV", "name": "Provider-1",
						  "config": { "defaultDeadlineDuration": 180 } }
					] }))
				}),
			)
			.route(
				"/nile/api/v1/address/{address}",
				get(|Path(address): Path<String>| async move {
					envelope(json!({ "accountAddress": address, "active": true, "nonce": 7, "allowSubmit": true }))
				}),
			)
			.route(
				"/nile/api/v1/gasfree/submit",
				post(|Json(body): Json<Value>| async move {
					let object = body.as_object().cloned().unwrap_or_default();
					if object.len() != 10 || !object.contains_key("sig") {
						return Json(json!({ "code": 400, "reason": "BadRequest", "message": "malformed payload" }));
					}
					envelope(json!({ "id": "trace-123", "state": "WAITING", "amount": object["value"] }))
				}),
			)
			.route(
				"/nile/api/v1/gasfree/{trace_id}",
				get(|Path(trace_id): Path<String>| async move {
					envelope(json!({ "id": trace_id, "state": "SUCCEED", "txnHash": "abc" }))
				}),
			)
			.layer(middleware::from_fn(check_auth))
	}

	async fn spawn(app: Router) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		format!("http://{}/nile", addr)
	}

	fn client(base_url: &str, timeout: Duration) -> HttpRelayClient {
		HttpRelayClient::new(base_url, authenticator(), timeout).unwrap()
	}

	fn payload() -> SubmitPayload {
		SubmitPayload {
			message: AuthorizationMessage {
				token: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".into(),
				service_provider: "TBXSw8fM4jpQkGc6zZjsVABFpVN7UvXPdV".into(),
				user: "TYBNgWfhGuNzdLtjKtxXTfskAhTbMcqbaG".into(),
				receiver: "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E".into(),
				value: "5000000".into(),
				max_fee: "11000000".into(),
				deadline: "1700000180".into(),
				version: "1".into(),
				nonce: "7".into(),
			},
			sig: "ab".repeat(65),
		}
	}

	#[tokio::test]
	async fn test_authenticated_reads() {
		let base = spawn(relay_app()).await;
		let relay = client(&format!("{}/", base), Duration::from_secs(5));

		let tokens = relay.list_tokens().await.unwrap();
		assert_eq!(tokens.len(), 2);
		assert_eq!(tokens[0].token_address, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t");

		let providers = relay.list_providers().await.unwrap();
		assert_eq!(providers[0].address, "TBXSw8fM4jpQkGc6zZjsVABFpVN7UvXPdV");

		let user: Address = "TYBNgWfhGuNzdLtjKtxXTfskAhTbMcqbaG".parse().unwrap();
		let info = relay.get_account_info(&user).await.unwrap();
		assert_eq!(info.nonce, Some(7));
		assert_eq!(info.account_address.as_deref(), Some("TYBNgWfhGuNzdLtjKtxXTfskAhTbMcqbaG"));
	}

	#[tokio::test]
	async fn test_submit_and_status() {
		let relay = client(&spawn(relay_app()).await, Duration::from_secs(5));

		let record = relay.submit(payload()).await.unwrap();
		assert_eq!(record.id, "trace-123");
		assert_eq!(record.status(), TransferState::Pending("WAITING".into()));
		assert_eq!(record.extra["amount"], "5000000");

		let status = relay.get_status(&record.id).await.unwrap();
		assert_eq!(status.status(), TransferState::Confirmed);
		assert_eq!(status.txn_hash.as_deref(), Some("abc"));
	}

	#[tokio::test]
	async fn test_wrong_secret_is_rejected_not_unreachable() {
		let base = spawn(relay_app()).await;
		let wrong = RequestAuthenticator::new("key-1", &SecretString::from("wrong")).unwrap();
		let relay = HttpRelayClient::new(&base, wrong, Duration::from_secs(5)).unwrap();

		match relay.list_tokens().await {
			Err(RelayError::Rejected { status, message }) => {
				assert_eq!(status, 401);
				assert_eq!(message, "Unauthorized: bad signature");
			},
			other => panic!("expected rejection, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_envelope_error_code_is_rejection() {
		let app = Router::new().route(
			"/nile/api/v1/gasfree/submit",
			post(|| async {
				Json(json!({ "code": 500, "reason": "InternalError", "message": "nonce expired" }))
			}),
		);
		let relay = client(&spawn(app).await, Duration::from_secs(5));

		let err = relay.submit(payload()).await.unwrap_err();
		assert_eq!(
			err,
			RelayError::Rejected {
				status: 500,
				message: "InternalError: nonce expired".into()
			}
		);
		assert!(err.is_reachable());
	}

	#[tokio::test]
	async fn test_unparseable_bodies() {
		let app = Router::new()
			.route("/nile/api/v1/config/token/all", get(|| async { "<html>oops</html>" }))
			.route(
				"/nile/api/v1/config/provider/all",
				get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
			)
			.route(
				"/nile/api/v1/gasfree/{id}",
				get(|| async { Json(json!({ "code": 200 })) }),
			);
		let relay = client(&spawn(app).await, Duration::from_secs(5));

		assert!(matches!(
			relay.list_tokens().await,
			Err(RelayError::InvalidResponse(_))
		));
		assert_eq!(
			relay.list_providers().await.unwrap_err(),
			RelayError::Rejected {
				status: 502,
				message: "upstream down".into()
			}
		);
		assert!(matches!(
			relay.get_status("trace-1").await,
			Err(RelayError::InvalidResponse(_))
		));
	}

	#[tokio::test]
	async fn test_unreachable_relay() {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);

		let relay = client(&format!("http://{}/nile", addr), Duration::from_secs(5));
		let err = relay.list_tokens().await.unwrap_err();
		assert!(matches!(err, RelayError::Unreachable(_)));
		assert!(!err.is_reachable());
		assert!(!err.to_failure().status);
	}

	#[tokio::test]
	async fn test_timeout_is_unreachable() {
		let app = Router::new().route(
			"/nile/api/v1/config/token/all",
			get(|| async {
				tokio::time::sleep(Duration::from_secs(5)).await;
				envelope(json!({ "tokens": [] }))
			}),
		);
		let relay = client(&spawn(app).await, Duration::from_millis(200));

		assert_eq!(
			relay.list_tokens().await.unwrap_err(),
			RelayError::Unreachable("request timed out".into())
		);
	}

	#[tokio::test]
	async fn test_trace_id_must_be_a_path_segment() {
		let relay = client("http://127.0.0.1:1/nile", Duration::from_secs(1));
		for bad in ["", "../submit", "a?b=c", "a/b"] {
			assert!(matches!(
				relay.get_status(bad).await,
				Err(RelayError::InvalidRequest(_))
			));
		}
	}

	#[tokio::test]
	async fn test_signed_path_excludes_host_and_keeps_prefix() {
		let app = Router::new().route(
			"/nile/api/v1/config/token/all",
			get(|headers: HeaderMap| async move {
				let ts: u64 = headers["Timestamp"].to_str().unwrap().parse().unwrap();
				let auth = authenticator();
				let expected =
					auth.authorization_header(&auth.sign("GET", "/nile/api/v1/config/token/all", ts));
				assert_eq!(headers[AUTHORIZATION].to_str().unwrap(), expected);
				envelope(json!({ "tokens": [] }))
			}),
		);
		let relay = client(&spawn(app).await, Duration::from_secs(5));
		assert!(relay.list_tokens().await.unwrap().is_empty());
	}

	#[test]
	fn test_invalid_base_url() {
		assert!(matches!(
			HttpRelayClient::new("not a url", authenticator(), Duration::from_secs(1)),
			Err(RelayError::Configuration(_))
		));
	}
}
