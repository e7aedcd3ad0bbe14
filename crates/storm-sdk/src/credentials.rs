//! Signing credentials

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use storm_crypto::{public_key_to_address, PrivateKey};
use storm_primitives::Address;
use storm_types::{RawTransaction, SignedTransaction};
use zeroize::Zeroize;

use crate::SdkError;

/// Private key and the address it controls.
///
/// Clone is intentionally not implemented to prevent accidental key duplication;
/// share one instance behind an `Arc`.
pub struct Credentials {
    private_key: PrivateKey,
    address: Address,
}

impl Credentials {
    /// Create credentials for a fresh random key
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Create credentials from a 32-byte private key
    pub fn from_private_key(key: &[u8; 32]) -> Result<Self, SdkError> {
        let private_key =
            SigningKey::from_slice(key).map_err(|e| SdkError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_signing_key(private_key))
    }

    /// Create credentials from a hex-encoded private key
    ///
    /// Accepts both with and without "0x" prefix.
    pub fn from_hex(hex: &str) -> Result<Self, SdkError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut bytes = hex::decode(hex).map_err(|e| SdkError::InvalidPrivateKey(e.to_string()))?;
        if bytes.len() != 32 {
            let len = bytes.len();
            bytes.zeroize();
            return Err(SdkError::InvalidPrivateKey(format!("Expected 32 bytes, got {}", len)));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        bytes.zeroize();

        let result = Self::from_private_key(&key);
        key.zeroize();
        result
    }

    /// Read a hex private key from the environment variable `var`
    pub fn from_env(var: &str) -> Result<Self, SdkError> {
        let mut value = std::env::var(var)
            .map_err(|e| SdkError::Config(format!("cannot read private key from ${}: {}", var, e)))?;
        let result = Self::from_hex(&value);
        value.zeroize();
        result
    }

    fn from_signing_key(private_key: SigningKey) -> Self {
        let address = public_key_to_address(private_key.verifying_key());
        Self { private_key, address }
    }

    /// Address controlled by this key
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Sign `tx`; `chain_id` selects EIP-155 replay protection
    pub fn sign_transaction(
        &self,
        tx: RawTransaction,
        chain_id: Option<u64>,
    ) -> Result<SignedTransaction, SdkError> {
        Ok(tx.sign(&self.private_key, chain_id)?)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("address", &self.address).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storm_primitives::U256;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_credentials_from_hex() {
        let credentials = Credentials::from_hex(TEST_KEY).unwrap();
        assert_eq!(credentials.address().to_hex(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

        let bare = Credentials::from_hex(&TEST_KEY[2..]).unwrap();
        assert_eq!(bare.address(), credentials.address());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(Credentials::from_hex("0x1234"), Err(SdkError::InvalidPrivateKey(_))));
        assert!(Credentials::from_hex("0xnothex").is_err());
        // zero is not a valid secp256k1 scalar
        assert!(Credentials::from_private_key(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("STORM_TEST_CREDENTIALS_KEY", TEST_KEY);
        let credentials = Credentials::from_env("STORM_TEST_CREDENTIALS_KEY").unwrap();
        assert_eq!(credentials.address().to_hex(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

        assert!(matches!(
            Credentials::from_env("STORM_TEST_CREDENTIALS_UNSET"),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn test_sign_transaction_recovers_to_address() {
        let credentials = Credentials::random();
        let tx = RawTransaction::call(0, U256::one(), U256::from(21_000u64), Address::ZERO, U256::zero(), Vec::new());
        let signed = credentials.sign_transaction(tx, Some(7)).unwrap();
        assert_eq!(&signed.recover_sender().unwrap(), credentials.address());
        assert_eq!(signed.chain_id(), Some(7));
    }

    #[test]
    fn test_debug_hides_key() {
        let credentials = Credentials::random();
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("address"));
        assert!(!debug.contains("private_key"));
    }
}
