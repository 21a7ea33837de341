//! Signing gateway for GasFree transfer authorizations.
//!
//! The gateway is the only process that holds the private key. It exposes
//! `POST /sign`, which validates an authorization message, resolves the
//! EIP-712 domain and returns the signature, and `GET /health`. Every route
//! sits behind a caller IP allow-list that runs before the body is read.

use axum::{
	middleware,
	routing::{get, post},
	Router,
};
use gasfree_account::{AccountError, AccountInterface, TypedDataSigner};
use gasfree_config::GatewayConfig;
use gasfree_types::NetworksConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod allowlist;
pub mod handlers;

pub use allowlist::AllowList;

/// Errors that stop the gateway from starting or serving.
#[derive(Debug, Error)]
pub enum GatewayError {
	/// The signing key could not be loaded.
	#[error("Signer error: {0}")]
	Signer(#[from] AccountError),
	/// Binding or serving failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Shared state of the request handlers.
#[derive(Clone)]
pub struct GatewayState {
	pub signer: Arc<dyn AccountInterface>,
	pub networks: Arc<NetworksConfig>,
	/// Network used when a request names none.
	pub default_network: String,
}

impl GatewayState {
	/// Builds the state from a validated gateway configuration, loading the
	/// signing key.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
		let signer = TypedDataSigner::from_secret(&config.gateway.private_key)?;
		tracing::info!(address = %signer.address(), "Loaded signing key");
		Ok(Self {
			signer: Arc::new(signer),
			networks: Arc::new(config.networks.clone()),
			default_network: config.gateway.default_network.clone(),
		})
	}
}

/// Builds the gateway router.
///
/// Requires `ConnectInfo<SocketAddr>`; serve it with
/// `into_make_service_with_connect_info`.
pub fn router(state: GatewayState, allow_list: AllowList) -> Router {
	Router::new()
		.route("/sign", post(handlers::handle_sign))
		.route("/health", get(handlers::handle_health))
		.with_state(state)
		.layer(middleware::from_fn_with_state(
			Arc::new(allow_list),
			allowlist::enforce_allowlist,
		))
		.layer(TraceLayer::new_for_http())
}

/// Serves the gateway on `listener` until `shutdown` resolves.
pub async fn serve<F>(
	listener: TcpListener,
	config: &GatewayConfig,
	shutdown: F,
) -> Result<(), GatewayError>
where
	F: Future<Output = ()> + Send + 'static,
{
	let state = GatewayState::from_config(config)?;
	let allow_list = AllowList::new(config.gateway.allowed_callers.iter().copied());
	let app = router(state, allow_list);

	tracing::info!(
		address = %listener.local_addr()?,
		allowed = ?config.gateway.allowed_callers,
		"Signing gateway listening"
	);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown)
	.await?;

	tracing::info!("Signing gateway stopped");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use axum::{
		body::{to_bytes, Body},
		extract::connect_info::MockConnectInfo,
		http::{Request, StatusCode},
	};
	use gasfree_types::{
		default_networks, Address, AuthorizationMessage, Signature, SigningDomain, MAINNET,
		SIGNATURE_HEX_LENGTH,
	};
	use serde_json::{json, Value};
	use std::net::{IpAddr, Ipv4Addr};
	use tower::ServiceExt;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const KEY_ADDRESS: &str = "TYBNgWfhGuNzdLtjKtxXTfskAhTbMcqbaG";

	fn config() -> GatewayConfig {
		format!("[gateway]\nprivate_key = \"{}\"\n", KEY).parse().unwrap()
	}

	fn message() -> Value {
		json!({
			"token": "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t",
			"serviceProvider": "TBXSw8fM4jpQkGc6zZjsVABFpVN7UvXPdV",
			"user": KEY_ADDRESS,
			"receiver": "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E",
			"value": "5000000",
			"maxFee": "11000000",
			"deadline": "1700000180",
			"version": "1",
			"nonce": "0"
		})
	}

	fn app_with(state: GatewayState, caller: [u8; 4]) -> Router {
		router(state, AllowList::new([IpAddr::V4(Ipv4Addr::LOCALHOST)]))
			.layer(MockConnectInfo(SocketAddr::from((caller, 40000))))
	}

	fn app(caller: [u8; 4]) -> Router {
		app_with(GatewayState::from_config(&config()).unwrap(), caller)
	}

	async fn post_sign(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
		let response = app
			.oneshot(
				Request::builder()
					.method("POST")
					.uri("/sign")
					.header("content-type", "application/json")
					.body(body.into())
					.unwrap(),
			)
			.await
			.unwrap();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		(status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
	}

	fn sign_body(extra: Value) -> String {
		let mut body = json!({ "message": message(), "network": "mainnet" });
		if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
			for (k, v) in extra {
				body.insert(k.clone(), v.clone());
			}
		}
		body.to_string()
	}

	#[tokio::test]
	async fn test_sign_success() {
		let (status, body) = post_sign(app([127, 0, 0, 1]), sign_body(json!({}))).await;
		assert_eq!(status, StatusCode::OK);

		let signature = body["signature"].as_str().unwrap();
		assert_eq!(signature.len(), SIGNATURE_HEX_LENGTH);
		assert!(!signature.starts_with("0x"));
		assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
	}

	#[tokio::test]
	async fn test_signature_matches_direct_signing() {
		let (_, body) = post_sign(app([127, 0, 0, 1]), sign_body(json!({}))).await;

		let signer =
			TypedDataSigner::from_secret(&gasfree_types::SecretString::from(KEY)).unwrap();
		let domain = SigningDomain::for_network(&default_networks(), MAINNET).unwrap();
		let message: AuthorizationMessage = serde_json::from_value(message()).unwrap();
		let expected = signer.sign(&domain, &message).unwrap();

		assert_eq!(body["signature"], expected.to_hex());
	}

	#[tokio::test]
	async fn test_default_network_used_when_absent() {
		let explicit = post_sign(app([127, 0, 0, 1]), sign_body(json!({}))).await.1;
		let implicit = post_sign(
			app([127, 0, 0, 1]),
			json!({ "message": message() }).to_string(),
		)
		.await
		.1;
		assert_eq!(explicit["signature"], implicit["signature"]);

		let testnet = post_sign(app([127, 0, 0, 1]), sign_body(json!({ "network": "testnet" })))
			.await
			.1;
		assert_ne!(explicit["signature"], testnet["signature"]);
	}

	#[tokio::test]
	async fn test_overrides_change_domain() {
		let base = post_sign(app([127, 0, 0, 1]), sign_body(json!({}))).await.1;
		let chain = post_sign(app([127, 0, 0, 1]), sign_body(json!({ "chainId": 1 }))).await;
		let contract = post_sign(
			app([127, 0, 0, 1]),
			sign_body(json!({ "contract": "TEdvoHEatmDKvTh3o9vBRB9Vdtbhn4QFhy" })),
		)
		.await;

		assert_eq!(chain.0, StatusCode::OK);
		assert_eq!(contract.0, StatusCode::OK);
		assert_ne!(base["signature"], chain.1["signature"]);
		assert_ne!(base["signature"], contract.1["signature"]);
		assert_ne!(chain.1["signature"], contract.1["signature"]);
	}

	#[tokio::test]
	async fn test_access_denied_before_validation() {
		let (status, body) = post_sign(app([10, 0, 0, 1]), "definitely not json").await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "ACCESS_DENIED");

		let response = app([10, 0, 0, 1])
			.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn test_health() {
		let response = app([127, 0, 0, 1])
			.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap()["status"], "ok");
	}

	#[tokio::test]
	async fn test_invalid_json() {
		let (status, body) = post_sign(app([127, 0, 0, 1]), "{ nope").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "INVALID_REQUEST");
	}

	#[tokio::test]
	async fn test_missing_message() {
		let (status, body) =
			post_sign(app([127, 0, 0, 1]), json!({ "network": "mainnet" }).to_string()).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "VALIDATION_ERROR");
		assert_eq!(body["details"]["field"], "message");
	}

	#[tokio::test]
	async fn test_first_invalid_field_reported_in_order() {
		let mut partial = message();
		let fields = partial.as_object_mut().unwrap();
		fields.remove("receiver");
		fields.insert("maxFee".into(), json!(11000000));
		fields.remove("nonce");

		let (status, body) = post_sign(
			app([127, 0, 0, 1]),
			json!({ "message": partial }).to_string(),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["details"]["field"], "receiver");

		let mut wrong_type = message();
		wrong_type["maxFee"] = json!(11000000);
		let (_, body) = post_sign(
			app([127, 0, 0, 1]),
			json!({ "message": wrong_type }).to_string(),
		)
		.await;
		assert_eq!(body["details"]["field"], "maxFee");
		assert!(body["message"].as_str().unwrap().contains("must be a string"));
	}

	#[tokio::test]
	async fn test_unknown_network_rejected() {
		let (status, body) =
			post_sign(app([127, 0, 0, 1]), sign_body(json!({ "network": "shasta" }))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["details"]["field"], "network");
	}

	#[tokio::test]
	async fn test_bad_contract_override_rejected() {
		let (status, body) =
			post_sign(app([127, 0, 0, 1]), sign_body(json!({ "contract": "0x1234" }))).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["details"]["field"], "contract");
	}

	#[tokio::test]
	async fn test_unparseable_field_value() {
		let mut message = message();
		message["value"] = json!("5.5");
		let (status, body) =
			post_sign(app([127, 0, 0, 1]), json!({ "message": message }).to_string()).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "VALIDATION_ERROR");
		assert_eq!(body["details"]["field"], "value");
	}

	#[tokio::test]
	async fn test_user_mismatch() {
		let mut message = message();
		message["user"] = json!("TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E");
		let (status, body) =
			post_sign(app([127, 0, 0, 1]), json!({ "message": message }).to_string()).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "AUTHENTICATION_MISMATCH");
		assert_eq!(body["details"]["expected"], KEY_ADDRESS);
		assert_eq!(body["details"]["received"], "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E");
		assert!(body.get("signature").is_none());
	}

	struct FailingSigner(fn() -> AccountError);

	#[async_trait]
	impl AccountInterface for FailingSigner {
		fn address(&self) -> Address {
			KEY_ADDRESS.parse().unwrap()
		}

		async fn sign_authorization(
			&self,
			_domain: &SigningDomain,
			_message: &AuthorizationMessage,
		) -> Result<Signature, AccountError> {
			Err((self.0)())
		}
	}

	fn failing_state(make: fn() -> AccountError) -> GatewayState {
		GatewayState {
			signer: Arc::new(FailingSigner(make)),
			networks: Arc::new(default_networks()),
			default_network: MAINNET.to_string(),
		}
	}

	#[tokio::test]
	async fn test_integrity_and_signing_failures_are_500() {
		let integrity = app_with(
			failing_state(|| AccountError::InvalidSignature("recovers to wrong address".into())),
			[127, 0, 0, 1],
		);
		let (status, body) = post_sign(integrity, sign_body(json!({}))).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body["error"], "SIGNATURE_INTEGRITY");

		let failed = app_with(
			failing_state(|| AccountError::SigningFailed("hsm offline".into())),
			[127, 0, 0, 1],
		);
		let (status, body) = post_sign(failed, sign_body(json!({}))).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body["error"], "SIGNING_FAILED");
	}

	#[tokio::test]
	async fn test_serve_over_tcp_with_graceful_shutdown() {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let (tx, rx) = tokio::sync::oneshot::channel::<()>();
		let config = config();

		let server = tokio::spawn(async move {
			serve(listener, &config, async move {
				let _ = rx.await;
			})
			.await
		});

		let response = reqwest::Client::new()
			.post(format!("http://{}/sign", addr))
			.json(&json!({ "message": message() }))
			.send()
			.await
			.unwrap();
		assert_eq!(response.status().as_u16(), 200);
		let body: Value = response.json().await.unwrap();
		assert_eq!(body["signature"].as_str().unwrap().len(), SIGNATURE_HEX_LENGTH);

		tx.send(()).unwrap();
		server.await.unwrap().unwrap();
	}
}
