//! Request authentication for the GasFree relay API.
//!
//! Every request carries `Timestamp: <unix seconds>` and
//! `Authorization: ApiKey <key>:<sig>`, where `sig` is the standard base64 of
//! HMAC-SHA256 over `METHOD ‖ path ‖ timestamp`. The path is the URL path
//! including the network prefix (`/nile/api/v1/...`) and never the query.

use crate::RelayError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gasfree_types::SecretString;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

pub type HmacSha256 = Hmac<Sha256>;

/// Computes relay request signatures for one API credential.
///
/// The secret is only used to key the MAC at construction; the keyed state
/// is cloned for each signature.
#[derive(Clone)]
pub struct RequestAuthenticator {
	key_id: String,
	mac: HmacSha256,
}

impl RequestAuthenticator {
	/// Creates an authenticator for the `key_id` / `secret` pair.
	///
	/// # Errors
	///
	/// `RelayError::Configuration` if either value is blank.
	pub fn new(key_id: impl Into<String>, secret: &SecretString) -> Result<Self, RelayError> {
		let key_id = key_id.into();
		if key_id.trim().is_empty() {
			return Err(RelayError::Configuration("relay api_key is empty".into()));
		}
		if secret.is_blank() {
			return Err(RelayError::Configuration("relay api_secret is empty".into()));
		}
		let mac = secret.with_exposed(|s| HmacSha256::new_from_slice(s.as_bytes()))
			.map_err(|e| RelayError::Configuration(format!("invalid api_secret: {}", e)))?;
		Ok(Self { key_id, mac })
	}

	/// The public key identifier.
	pub fn key_id(&self) -> &str {
		&self.key_id
	}

	/// base64(HMAC-SHA256(method ‖ path ‖ timestamp)).
	pub fn sign(&self, method: &str, path: &str, timestamp: u64) -> String {
		let mut mac = self.mac.clone();
		mac.update(method.as_bytes());
		mac.update(path.as_bytes());
		mac.update(timestamp.to_string().as_bytes());
		STANDARD.encode(mac.finalize().into_bytes())
	}

	/// `ApiKey <key>:<signature>`
	pub fn authorization_header(&self, signature: &str) -> String {
		format!("ApiKey {}:{}", self.key_id, signature)
	}
}

impl fmt::Debug for RequestAuthenticator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RequestAuthenticator")
			.field("key_id", &self.key_id)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn authenticator() -> RequestAuthenticator {
		RequestAuthenticator::new("key-1", &SecretString::from("test-secret")).unwrap()
	}

	#[test]
	fn test_known_signature() {
		let sig = authenticator().sign("GET", "/nile/api/v1/config/token/all", 1_700_000_000);
		assert_eq!(sig, "0nyrTDAIARSlT+WxH69ILaVpOZ7UTkEBwEH8uxR5B2I=");
	}

	#[test]
	fn test_deterministic_and_input_sensitive() {
		let auth = authenticator();
		let base = auth.sign("GET", "/nile/api/v1/config/token/all", 1_700_000_000);

		assert_eq!(base, auth.sign("GET", "/nile/api/v1/config/token/all", 1_700_000_000));
		assert_ne!(base, auth.sign("POST", "/nile/api/v1/config/token/all", 1_700_000_000));
		assert_ne!(base, auth.sign("GET", "/tron/api/v1/config/token/all", 1_700_000_000));
		assert_ne!(base, auth.sign("GET", "/nile/api/v1/config/token/all", 1_700_000_001));

		let other = RequestAuthenticator::new("key-1", &SecretString::from("other")).unwrap();
		assert_ne!(base, other.sign("GET", "/nile/api/v1/config/token/all", 1_700_000_000));
	}

	#[test]
	fn test_signature_is_padded_base64_of_32_bytes() {
		let sig = authenticator().sign("POST", "/tron/api/v1/gasfree/submit", 1);
		assert_eq!(sig.len(), 44);
		assert!(sig.ends_with('='));
		assert_eq!(STANDARD.decode(&sig).unwrap().len(), 32);
	}

	#[test]
	fn test_authorization_header() {
		let auth = authenticator();
		assert_eq!(auth.authorization_header("abc="), "ApiKey key-1:abc=");
	}

	#[test]
	fn test_blank_credentials_rejected() {
		assert!(matches!(
			RequestAuthenticator::new("key-1", &SecretString::from("")),
			Err(RelayError::Configuration(_))
		));
		assert!(matches!(
			RequestAuthenticator::new(" ", &SecretString::from("secret")),
			Err(RelayError::Configuration(_))
		));
	}

	#[test]
	fn test_debug_hides_secret() {
		let debug = format!("{:?}", authenticator());
		assert!(debug.contains("key-1"));
		assert!(!debug.contains("test-secret"));
	}
}
