//! # storm-primitives
//!
//! Fixed-width byte types shared by the codec, the crypto layer and the
//! transaction manager.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod fixed;

pub use error::PrimitiveError;
pub use fixed::{Address, H256};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Encode `value` as a `0x`-prefixed quantity with no leading zeros (`0x0` for zero).
pub fn to_quantity_hex(value: &U256) -> String {
    format!("{:#x}", value)
}

/// Parse a `0x`-prefixed (or bare) hex quantity into a U256.
pub fn parse_quantity_hex(s: &str) -> Result<U256, PrimitiveError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| PrimitiveError::InvalidHex(e.to_string()))
}
