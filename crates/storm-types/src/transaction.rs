//! Legacy transactions and their canonical RLP form

use bytes::Bytes;
use rlp::{Rlp, RlpStream};
use storm_crypto::{keccak256, recover_address, sign, PrivateKey, Signature};
use storm_primitives::{Address, H256, U256};

use crate::TxCodecError;

const UNSIGNED_FIELDS: usize = 6;
const SIGNED_FIELDS: usize = 9;

/// Unsigned legacy transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTransaction {
    /// Sender nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: U256,
    /// Recipient (None deploys `data` as init code)
    pub to: Option<Address>,
    /// Value in wei
    pub value: U256,
    /// Call data or init code
    pub data: Bytes,
}

impl RawTransaction {
    /// Contract call or value transfer
    pub fn call(
        nonce: u64,
        gas_price: U256,
        gas_limit: U256,
        to: Address,
        value: U256,
        data: impl Into<Bytes>,
    ) -> Self {
        Self { nonce, gas_price, gas_limit, to: Some(to), value, data: data.into() }
    }

    /// Contract deployment
    pub fn deploy(
        nonce: u64,
        gas_price: U256,
        gas_limit: U256,
        value: U256,
        init_code: impl Into<Bytes>,
    ) -> Self {
        Self { nonce, gas_price, gas_limit, to: None, value, data: init_code.into() }
    }

    fn append_fields(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);
        match &self.to {
            Some(to) => s.append(to),
            None => s.append_empty_data(),
        };
        s.append(&self.value);
        s.append(&self.data.to_vec());
    }

    /// Bytes that get hashed and signed: the six fields, plus `[chain_id, 0, 0]` under EIP-155
    pub fn signing_payload(&self, chain_id: Option<u64>) -> Vec<u8> {
        let mut s = match chain_id {
            Some(_) => RlpStream::new_list(SIGNED_FIELDS),
            None => RlpStream::new_list(UNSIGNED_FIELDS),
        };
        self.append_fields(&mut s);
        if let Some(id) = chain_id {
            s.append(&id);
            s.append(&0u64);
            s.append(&0u64);
        }
        s.out().to_vec()
    }

    /// keccak256 of the signing payload
    pub fn signing_hash(&self, chain_id: Option<u64>) -> H256 {
        keccak256(&self.signing_payload(chain_id))
    }

    /// Sign with `private_key`; `chain_id` selects EIP-155 replay protection
    pub fn sign(
        self,
        private_key: &PrivateKey,
        chain_id: Option<u64>,
    ) -> Result<SignedTransaction, TxCodecError> {
        let signature = sign(&self.signing_hash(chain_id), private_key)?;
        let v = match chain_id {
            Some(id) => signature.v_eip155(id)?,
            None => signature.v_legacy(),
        };
        Ok(SignedTransaction::from_parts(self, v, signature.r, signature.s))
    }

    /// Decode an unsigned six-field transaction
    pub fn decode(raw: &[u8]) -> Result<Self, TxCodecError> {
        let rlp = checked_list(raw, UNSIGNED_FIELDS)?;
        decode_fields(&rlp)
    }
}

/// Signed legacy transaction.
///
/// Immutable: the serialized bytes and the canonical hash are fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: RawTransaction,
    v: u64,
    r: [u8; 32],
    s: [u8; 32],
    encoded: Bytes,
    hash: H256,
}

impl SignedTransaction {
    fn from_parts(tx: RawTransaction, v: u64, r: [u8; 32], s: [u8; 32]) -> Self {
        let mut stream = RlpStream::new_list(SIGNED_FIELDS);
        tx.append_fields(&mut stream);
        stream.append(&v);
        stream.append(&U256::from_big_endian(&r));
        stream.append(&U256::from_big_endian(&s));
        let encoded = Bytes::from(stream.out().to_vec());
        let hash = keccak256(&encoded);
        Self { tx, v, r, s, encoded, hash }
    }

    /// Decode a signed nine-field transaction as broadcast on the wire
    pub fn decode(raw: &[u8]) -> Result<Self, TxCodecError> {
        let rlp = checked_list(raw, SIGNED_FIELDS)?;
        let tx = decode_fields(&rlp)?;
        let v: u64 = rlp.val_at(6)?;
        let r = u256_word(rlp.val_at(7)?);
        let s = u256_word(rlp.val_at(8)?);
        Ok(Self::from_parts(tx, v, r, s))
    }

    /// The unsigned body
    pub fn transaction(&self) -> &RawTransaction {
        &self.tx
    }

    /// Sender nonce
    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }

    /// Recipient
    pub fn to(&self) -> Option<&Address> {
        self.tx.to.as_ref()
    }

    /// Whether this deploys a contract
    pub fn is_contract_creation(&self) -> bool {
        self.tx.to.is_none()
    }

    /// `v` exactly as serialized
    pub fn v(&self) -> u64 {
        self.v
    }

    /// Signature r
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// Signature s
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// EIP-155 chain id encoded in `v`, if any
    pub fn chain_id(&self) -> Option<u64> {
        if self.v >= 35 {
            Some((self.v - 35) / 2)
        } else {
            None
        }
    }

    /// Canonical RLP bytes, as handed to `eth_sendRawTransaction`
    pub fn encoded(&self) -> &Bytes {
        &self.encoded
    }

    /// Canonical hash: keccak256 of [`Self::encoded`]
    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// Recover the sending address from the signature
    pub fn recover_sender(&self) -> Result<Address, TxCodecError> {
        let signature = Signature::from_rsv(self.r, self.s, self.v)?;
        let hash = self.tx.signing_hash(self.chain_id());
        Ok(recover_address(&hash, &signature)?)
    }
}

fn checked_list(raw: &[u8], expected: usize) -> Result<Rlp<'_>, TxCodecError> {
    let rlp = Rlp::new(raw);
    let total = rlp.payload_info()?.total();
    if total != raw.len() {
        return Err(TxCodecError::TrailingBytes(raw.len().saturating_sub(total)));
    }
    let got = rlp.item_count()?;
    if got != expected {
        return Err(TxCodecError::FieldCount { expected, got });
    }
    Ok(rlp)
}

fn decode_fields(rlp: &Rlp<'_>) -> Result<RawTransaction, TxCodecError> {
    let to_item = rlp.at(3)?;
    let to = if to_item.is_empty() { None } else { Some(to_item.as_val::<Address>()?) };
    let data: Vec<u8> = rlp.val_at(5)?;
    Ok(RawTransaction {
        nonce: rlp.val_at(0)?,
        gas_price: rlp.val_at(1)?,
        gas_limit: rlp.val_at(2)?,
        to,
        value: rlp.val_at(4)?,
        data: Bytes::from(data),
    })
}

fn u256_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}
