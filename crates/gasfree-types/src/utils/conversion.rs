//! Decimal amount conversion.
//!
//! Amounts are entered as human-readable decimals ("5.0") and signed as
//! integer base units ("5000000" for a 6-decimal token). Precision beyond the
//! token scale is rejected rather than rounded.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when converting a decimal amount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
	/// The amount is not a decimal number.
	#[error("Invalid amount '{0}'")]
	Invalid(String),
	/// The amount is zero or negative.
	#[error("Amount must be greater than zero")]
	NotPositive,
	/// The amount has more fractional digits than the token supports.
	#[error("Amount has more than {0} decimal places")]
	TooPrecise(u32),
	/// The amount does not fit into base units.
	#[error("Amount is too large")]
	Overflow,
}

/// Converts a decimal amount string into integer base units.
///
/// # Errors
///
/// Returns an error if the string is not a decimal, is not strictly positive,
/// carries more than `decimals` significant fractional digits, or overflows.
pub fn decimal_to_base_units(amount: &str, decimals: u32) -> Result<U256, AmountError> {
	let value =
		Decimal::from_str(amount.trim()).map_err(|_| AmountError::Invalid(amount.to_string()))?;

	if value.is_sign_negative() || value.is_zero() {
		return Err(AmountError::NotPositive);
	}

	let normalized = value.normalize();
	if normalized.scale() > decimals {
		return Err(AmountError::TooPrecise(decimals));
	}

	let factor = 10u64
		.checked_pow(decimals)
		.map(Decimal::from)
		.ok_or(AmountError::Overflow)?;
	let units = normalized
		.checked_mul(factor)
		.and_then(|scaled| scaled.trunc().to_u128())
		.ok_or(AmountError::Overflow)?;

	Ok(U256::from(units))
}
