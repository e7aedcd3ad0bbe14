//! # storm-crypto
//!
//! Cryptographic primitives used to sign and identify transactions.
//!
//! - Keccak-256 hashing
//! - Recoverable ECDSA signing over secp256k1 (low-s normalized)
//! - Public key recovery and address derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::keccak256;
pub use signature::{
    public_key_to_address, recover_address, recover_public_key, sign, PrivateKey, PublicKey,
    Signature,
};
