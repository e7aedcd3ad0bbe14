//! Common error types for primitives

use thiserror::Error;

/// Primitive parsing error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Input had the wrong number of bytes
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required byte count
        expected: usize,
        /// Supplied byte count
        got: usize,
    },
}
