//! ABI errors

use thiserror::Error;

/// Errors raised by the ABI type model and codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// A type request is unknown or under-specified
    #[error("cannot resolve ABI type: {0}")]
    TypeResolution(String),

    /// A raw value does not fit its target type
    #[error("value out of range for {ty}: {reason}")]
    ValueRange {
        /// Canonical name of the target type
        ty: String,
        /// What was wrong with the value
        reason: String,
    },

    /// Calldata is truncated or malformed
    #[error("ABI decoding failed at byte {offset}: {reason}")]
    Decode {
        /// Position in the buffer where decoding stopped
        offset: usize,
        /// What was wrong with the input
        reason: String,
    },
}

impl AbiError {
    pub(crate) fn range(ty: impl ToString, reason: impl Into<String>) -> Self {
        AbiError::ValueRange { ty: ty.to_string(), reason: reason.into() }
    }

    pub(crate) fn decode(offset: usize, reason: impl Into<String>) -> Self {
        AbiError::Decode { offset, reason: reason.into() }
    }
}
