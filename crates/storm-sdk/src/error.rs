//! SDK error types

use storm_primitives::H256;
use thiserror::Error;

use crate::abi::AbiError;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// ABI type, value or decoding error
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    /// Signing or signature recovery failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Invalid private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The node acknowledged a different hash than the one computed locally
    #[error("Transaction hash mismatch: computed {local}, node returned {remote}")]
    TxHashMismatch {
        /// Hash of the signed bytes we sent
        local: H256,
        /// Hash echoed by the node
        remote: H256,
    },

    /// No receipt appeared within the polling budget
    #[error("Transaction receipt for {hash} not available after {attempts} attempts")]
    ReceiptTimeout {
        /// Submitted transaction
        hash: H256,
        /// Queries issued, including the initial one
        attempts: u32,
    },

    /// Transport/network error
    #[error("Transport error: {0}")]
    Transport(String),

    /// RPC error from node
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Invalid hex string
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The blocking facade could not start its runtime
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Replacing a pending transaction is not allowed by the nonce policy
    #[error("Transaction replacement is disabled by the timeout nonce policy")]
    ReplacementDisabled,

    /// A replacement named a nonce this account has not used yet
    #[error("Nonce {nonce} has not been issued (next is {next})")]
    NonceNotIssued {
        /// Requested nonce
        nonce: u64,
        /// Next nonce the tracker would hand out
        next: u64,
    },
}

impl SdkError {
    /// Errors that must not be retried: the submission itself is suspect.
    ///
    /// A [`SdkError::ReceiptTimeout`] is recoverable; the transaction may
    /// still be mined and the caller can keep polling.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SdkError::TxHashMismatch { .. } | SdkError::Signing(_) | SdkError::InvalidPrivateKey(_)
        )
    }
}

impl From<hex::FromHexError> for SdkError {
    fn from(e: hex::FromHexError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<storm_crypto::CryptoError> for SdkError {
    fn from(e: storm_crypto::CryptoError) -> Self {
        SdkError::Signing(e.to_string())
    }
}

impl From<storm_types::TxCodecError> for SdkError {
    fn from(e: storm_types::TxCodecError) -> Self {
        SdkError::Signing(e.to_string())
    }
}

impl From<storm_primitives::PrimitiveError> for SdkError {
    fn from(e: storm_primitives::PrimitiveError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<toml::de::Error> for SdkError {
    fn from(e: toml::de::Error) -> Self {
        SdkError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let mismatch = SdkError::TxHashMismatch { local: H256::ZERO, remote: H256::from_bytes([1; 32]) };
        assert!(mismatch.is_fatal());
        assert!(SdkError::Signing("bad".into()).is_fatal());

        let timeout = SdkError::ReceiptTimeout { hash: H256::ZERO, attempts: 41 };
        assert!(!timeout.is_fatal());
        assert!(!SdkError::Transport("refused".into()).is_fatal());
    }

    #[test]
    fn test_abi_error_converts() {
        let err: SdkError = AbiError::TypeResolution("uint7".into()).into();
        assert!(matches!(err, SdkError::Abi(AbiError::TypeResolution(_))));
    }

    #[test]
    fn test_display_names_both_hashes() {
        let err = SdkError::TxHashMismatch { local: H256::ZERO, remote: H256::from_bytes([0xab; 32]) };
        let msg = err.to_string();
        assert!(msg.contains(&H256::ZERO.to_hex()));
        assert!(msg.contains("abab"));
    }
}
