//! Cryptographic errors

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Signing failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// r/s do not form a valid signature
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Recovery id outside {0, 1}
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Recovery failed
    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),

    /// Chain id too large to encode in `v`
    #[error("chain id {0} does not fit in an EIP-155 v value")]
    InvalidChainId(u64),

    /// Key bytes are not a valid secp256k1 scalar
    #[error("invalid private key")]
    InvalidPrivateKey,
}
