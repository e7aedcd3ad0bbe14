//! Transaction codec errors

use storm_crypto::CryptoError;
use thiserror::Error;

/// Failure while decoding, signing or recovering a transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxCodecError {
    /// Malformed RLP
    #[error("rlp decoding failed: {0}")]
    Rlp(#[from] rlp::DecoderError),

    /// List had the wrong number of fields
    #[error("expected {expected} transaction fields, got {got}")]
    FieldCount {
        /// Fields required
        expected: usize,
        /// Fields present
        got: usize,
    },

    /// Bytes left over after the transaction list
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    /// Signing or recovery failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
