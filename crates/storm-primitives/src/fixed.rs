//! Fixed-width byte strings: 20-byte addresses and 32-byte hashes

use std::fmt;

use crate::PrimitiveError;

macro_rules! fixed_bytes {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Size in bytes
            pub const LEN: usize = $len;

            /// All-zero value
            pub const ZERO: $name = $name([0u8; $len]);

            /// Create from an owned byte array
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }

            /// Create from a slice of exactly `LEN` bytes
            pub fn from_slice(slice: &[u8]) -> Result<Self, PrimitiveError> {
                let bytes: [u8; $len] =
                    slice.try_into().map_err(|_| PrimitiveError::InvalidLength {
                        expected: $len,
                        got: slice.len(),
                    })?;
                Ok($name(bytes))
            }

            /// Parse from a hex string, with or without `0x` prefix
            pub fn from_hex(s: &str) -> Result<Self, PrimitiveError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s).map_err(|e| PrimitiveError::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }

            /// Borrow the underlying bytes
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Whether every byte is zero
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }

            /// Lowercase hex with `0x` prefix
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = PrimitiveError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        #[cfg(feature = "rlp")]
        impl rlp::Encodable for $name {
            fn rlp_append(&self, s: &mut rlp::RlpStream) {
                s.encoder().encode_value(&self.0);
            }
        }

        #[cfg(feature = "rlp")]
        impl rlp::Decodable for $name {
            fn decode(rlp: &rlp::Rlp) -> Result<Self, rlp::DecoderError> {
                rlp.decoder().decode_value(|bytes| {
                    bytes.try_into().map($name).map_err(|_| {
                        if bytes.len() < $len {
                            rlp::DecoderError::RlpIsTooShort
                        } else {
                            rlp::DecoderError::RlpIsTooBig
                        }
                    })
                })
            }
        }
    };
}

fixed_bytes!(
    /// 20-byte account address, derived from the last 20 bytes of keccak256(pubkey)
    Address,
    20
);

fixed_bytes!(
    /// 32-byte hash (transaction hashes, keccak digests)
    H256,
    32
);
