//! Recoverable ECDSA signatures over secp256k1

use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use storm_primitives::{Address, H256};

use crate::{keccak256, CryptoError};

/// Public key
pub type PublicKey = VerifyingKey;

/// Private key (32-byte scalar)
pub type PrivateKey = SigningKey;

/// ECDSA signature with its recovery id.
///
/// `s` is always in the lower half of the curve order, so a given key and
/// message hash produce exactly one accepted encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component
    pub r: [u8; 32],
    /// s component (low-s)
    pub s: [u8; 32],
    /// Recovery id, 0 or 1
    pub recovery_id: u8,
}

impl Signature {
    /// `v` as used by pre-EIP-155 transactions and personal messages (27/28)
    pub fn v_legacy(&self) -> u64 {
        27 + self.recovery_id as u64
    }

    /// `v` for an EIP-155 replay-protected transaction
    pub fn v_eip155(&self, chain_id: u64) -> Result<u64, CryptoError> {
        chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + self.recovery_id as u64))
            .ok_or(CryptoError::InvalidChainId(chain_id))
    }

    /// Rebuild from wire components; `v` may be 0/1, 27/28 or EIP-155 encoded.
    pub fn from_rsv(r: [u8; 32], s: [u8; 32], v: u64) -> Result<Self, CryptoError> {
        let recovery_id = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            v if v >= 35 => (v - 35) % 2,
            other => return Err(CryptoError::InvalidRecoveryId(other.min(u8::MAX as u64) as u8)),
        } as u8;
        Ok(Self { r, s, recovery_id })
    }

    fn to_k256(&self) -> Result<K256Signature, CryptoError> {
        K256Signature::from_scalars(self.r, self.s)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

/// Sign a 32-byte prehash, normalizing to low-s (EIP-2)
pub fn sign(message_hash: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (mut signature, mut recovery_id) = private_key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    // Flipping s to n - s flips the parity of the recovered point.
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::from_byte(recovery_id.to_byte() ^ 1)
            .ok_or_else(|| CryptoError::SigningFailed("recovery id out of range".to_string()))?;
    }

    Ok(Signature {
        r: signature.r().to_bytes().into(),
        s: signature.s().to_bytes().into(),
        recovery_id: recovery_id.to_byte(),
    })
}

/// Recover the public key that produced `signature` over `message_hash`
pub fn recover_public_key(
    message_hash: &H256,
    signature: &Signature,
) -> Result<PublicKey, CryptoError> {
    let k256_sig = signature.to_k256()?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id)
        .ok_or(CryptoError::InvalidRecoveryId(signature.recovery_id))?;

    VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &k256_sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Recover the signer's address
pub fn recover_address(message_hash: &H256, signature: &Signature) -> Result<Address, CryptoError> {
    recover_public_key(message_hash, signature).map(|key| public_key_to_address(&key))
}

/// Derive the account address: last 20 bytes of keccak256(uncompressed pubkey without 0x04)
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut addr_bytes = [0u8; 20];
    addr_bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(addr_bytes)
}
