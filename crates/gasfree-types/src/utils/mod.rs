//! Utility functions for hashing, conversion and formatting.

pub mod conversion;
pub mod eip712;
pub mod formatting;
pub mod helpers;

pub use conversion::{decimal_to_base_units, AmountError};
pub use eip712::{
	compute_domain_hash, compute_final_digest, Eip712AbiEncoder, DOMAIN_TYPE, PERMIT_TRANSFER_TYPE,
};
pub use formatting::{format_token_amount, truncate_id, without_0x_prefix};
pub use helpers::current_timestamp;
