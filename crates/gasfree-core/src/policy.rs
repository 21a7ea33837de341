//! Injectable choices the orchestrator makes when building a message.
//!
//! [`SelectionPolicy`] picks the token and service provider from the relay's
//! lists; [`FeePolicy`] sets `maxFee`.

use crate::TransferError;
use alloy_primitives::U256;
use gasfree_types::{Address, RelayProvider, RelayToken};

/// Token and provider chosen for one authorization, with the relay entries
/// they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
	pub token: Address,
	pub provider: Address,
	pub token_info: RelayToken,
	pub provider_info: RelayProvider,
}

/// Chooses the token and service provider from the relay's lists.
pub trait SelectionPolicy: Send + Sync {
	/// # Errors
	///
	/// Returns `TransferError::Resolution` when no acceptable entry exists.
	fn select(
		&self,
		tokens: &[RelayToken],
		providers: &[RelayProvider],
	) -> Result<Selection, TransferError>;
}

/// Sets the fee ceiling of an authorization.
pub trait FeePolicy: Send + Sync {
	fn max_fee(&self, selection: &Selection) -> U256;
}

/// Picks the first listed token and provider. Entries the relay marks
/// unsupported are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstListed;

impl SelectionPolicy for FirstListed {
	fn select(
		&self,
		tokens: &[RelayToken],
		providers: &[RelayProvider],
	) -> Result<Selection, TransferError> {
		let (token, token_info) = find_token(tokens, |_| true)
			.ok_or_else(|| TransferError::Resolution("relay lists no usable token".into()))?;
		let (provider, provider_info) = find_provider(providers, |_| true).ok_or_else(|| {
			TransferError::Resolution("relay lists no usable service provider".into())
		})?;

		Ok(Selection {
			token,
			provider,
			token_info: token_info.clone(),
			provider_info: provider_info.clone(),
		})
	}
}

fn find_token(
	tokens: &[RelayToken],
	accept: impl Fn(&Address) -> bool,
) -> Option<(Address, &RelayToken)> {
	tokens
		.iter()
		.filter(|t| t.supported != Some(false))
		.filter_map(|t| t.token_address.parse::<Address>().ok().map(|a| (a, t)))
		.find(|(address, _)| accept(address))
}

fn find_provider(
	providers: &[RelayProvider],
	accept: impl Fn(&Address) -> bool,
) -> Option<(Address, &RelayProvider)> {
	providers
		.iter()
		.filter_map(|p| p.address.parse::<Address>().ok().map(|a| (a, p)))
		.find(|(address, _)| accept(address))
}

/// Requires specific addresses; falls back to [`FirstListed`] for whichever
/// side is unset.
#[derive(Debug, Clone, Default)]
pub struct Preferred {
	pub token: Option<Address>,
	pub provider: Option<Address>,
}

impl SelectionPolicy for Preferred {
	fn select(
		&self,
		tokens: &[RelayToken],
		providers: &[RelayProvider],
	) -> Result<Selection, TransferError> {
		let (token, token_info) = find_token(tokens, |a| self.token.is_none_or(|w| *a == w))
			.ok_or_else(|| match self.token {
				Some(wanted) => {
					TransferError::Resolution(format!("token {} is not offered by the relay", wanted))
				},
				None => TransferError::Resolution("relay lists no usable token".into()),
			})?;

		let (provider, provider_info) =
			find_provider(providers, |a| self.provider.is_none_or(|w| *a == w)).ok_or_else(
				|| match self.provider {
					Some(wanted) => TransferError::Resolution(format!(
						"service provider {} is not listed by the relay",
						wanted
					)),
					None => TransferError::Resolution("relay lists no usable service provider".into()),
				},
			)?;

		Ok(Selection {
			token,
			provider,
			token_info: token_info.clone(),
			provider_info: provider_info.clone(),
		})
	}
}

/// `maxFee = base + headroom`, independent of the relay's quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFee {
	pub base: u64,
	pub headroom: u64,
}

impl Default for FixedFee {
	fn default() -> Self {
		Self {
			base: 1_000_000,
			headroom: 10_000_000,
		}
	}
}

impl FeePolicy for FixedFee {
	fn max_fee(&self, _selection: &Selection) -> U256 {
		U256::from(self.base) + U256::from(self.headroom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const USDT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
	const OTHER_TOKEN: &str = "TEdvoHEatmDKvTh3o9vBRB9Vdtbhn4QFhy";
	const PROVIDER: &str = "TBXSw8fM4jpQkGc6zZjsVABFpVN7UvXPdV";
	const OTHER_PROVIDER: &str = "TGCAjMXComunWZEXCT1LPBdcYbDVuyexBv";

	fn token(address: &str, supported: Option<bool>) -> RelayToken {
		RelayToken {
			token_address: address.into(),
			symbol: None,
			decimal: Some(6),
			activate_fee: None,
			transfer_fee: None,
			supported,
		}
	}

	fn provider(address: &str) -> RelayProvider {
		RelayProvider {
			address: address.into(),
			name: None,
			website: None,
			config: None,
		}
	}

	#[test]
	fn test_first_listed() {
		let selection = FirstListed
			.select(
				&[token(USDT, Some(true)), token(OTHER_TOKEN, None)],
				&[provider(PROVIDER), provider(OTHER_PROVIDER)],
			)
			.unwrap();
		assert_eq!(selection.token.to_string(), USDT);
		assert_eq!(selection.provider.to_string(), PROVIDER);
	}

	#[test]
	fn test_first_listed_skips_unsupported_and_malformed() {
		let selection = FirstListed
			.select(
				&[
					token(USDT, Some(false)),
					token("garbage", None),
					token(OTHER_TOKEN, None),
				],
				&[provider(""), provider(OTHER_PROVIDER)],
			)
			.unwrap();
		assert_eq!(selection.token.to_string(), OTHER_TOKEN);
		assert_eq!(selection.provider.to_string(), OTHER_PROVIDER);
	}

	#[test]
	fn test_empty_lists_are_resolution_failures() {
		assert!(matches!(
			FirstListed.select(&[], &[provider(PROVIDER)]),
			Err(TransferError::Resolution(_))
		));
		assert!(matches!(
			FirstListed.select(&[token(USDT, None)], &[]),
			Err(TransferError::Resolution(_))
		));
	}

	#[test]
	fn test_preferred() {
		let policy = Preferred {
			token: Some(OTHER_TOKEN.parse().unwrap()),
			provider: None,
		};
		let selection = policy
			.select(
				&[token(USDT, None), token(OTHER_TOKEN, None)],
				&[provider(PROVIDER)],
			)
			.unwrap();
		assert_eq!(selection.token.to_string(), OTHER_TOKEN);
		assert_eq!(selection.provider.to_string(), PROVIDER);

		let missing = Preferred {
			token: None,
			provider: Some(OTHER_PROVIDER.parse().unwrap()),
		};
		assert!(matches!(
			missing.select(&[token(USDT, None)], &[provider(PROVIDER)]),
			Err(TransferError::Resolution(_))
		));
	}

	#[test]
	fn test_fixed_fee() {
		let selection = FirstListed
			.select(&[token(USDT, None)], &[provider(PROVIDER)])
			.unwrap();
		let fee = FixedFee::default().max_fee(&selection);
		assert_eq!(fee, U256::from(11_000_000u64));
	}
}
