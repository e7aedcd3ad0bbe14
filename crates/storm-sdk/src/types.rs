//! SDK types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storm_primitives::{parse_quantity_hex, to_quantity_hex, Address, H256, U256};

use crate::SdkError;

/// Block identifier for RPC queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
    /// Earliest block (genesis)
    Earliest,
}

impl Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            BlockId::Number(n) => serializer.serialize_str(&format!("0x{:x}", n)),
            BlockId::Latest => serializer.serialize_str("latest"),
            BlockId::Pending => serializer.serialize_str("pending"),
            BlockId::Earliest => serializer.serialize_str("earliest"),
        }
    }
}

/// Call request for eth_call and eth_estimateGas
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient address
    pub to: Option<Address>,
    /// Gas limit
    pub gas: Option<U256>,
    /// Gas price
    pub gas_price: Option<U256>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Input data
    pub data: Option<Bytes>,
}

impl Serialize for CallRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let count = [
            self.from.is_some(),
            self.to.is_some(),
            self.gas.is_some(),
            self.gas_price.is_some(),
            self.value.is_some(),
            self.data.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        let mut map = serializer.serialize_map(Some(count))?;

        if let Some(from) = &self.from {
            map.serialize_entry("from", &from.to_hex())?;
        }
        if let Some(to) = &self.to {
            map.serialize_entry("to", &to.to_hex())?;
        }
        if let Some(gas) = &self.gas {
            map.serialize_entry("gas", &to_quantity_hex(gas))?;
        }
        if let Some(gas_price) = &self.gas_price {
            map.serialize_entry("gasPrice", &to_quantity_hex(gas_price))?;
        }
        if let Some(value) = &self.value {
            map.serialize_entry("value", &to_quantity_hex(value))?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", &format!("0x{}", hex::encode(data)))?;
        }

        map.end()
    }
}

/// What the caller wants executed; the manager fills in nonce, gas and signature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer in wei
    pub value: U256,
    /// Call data, or init code when deploying
    pub data: Bytes,
    /// Overrides the configured gas price
    pub gas_price: Option<U256>,
    /// Overrides the configured gas limit
    pub gas_limit: Option<U256>,
}

impl TransactionRequest {
    /// Contract call
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self { to: Some(to), data: data.into(), ..Default::default() }
    }

    /// Plain value transfer
    pub fn transfer(to: Address, value: U256) -> Self {
        Self { to: Some(to), value, ..Default::default() }
    }

    /// Contract deployment
    pub fn deploy(init_code: impl Into<Bytes>) -> Self {
        Self { to: None, data: init_code.into(), ..Default::default() }
    }

    /// Set value
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set gas price
    pub fn gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Set gas limit
    pub fn gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// A transaction the node accepted, identified by its canonical hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Transaction hash
    pub hash: H256,
    /// Nonce it was signed with
    pub nonce: u64,
}

impl PendingTransaction {
    /// Create a new pending transaction
    pub fn new(hash: H256, nonce: u64) -> Self {
        Self { hash, nonce }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptFields {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
    contract_address: Option<String>,
}

/// Transaction receipt as reported by the node
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReceipt {
    /// Transaction hash
    pub transaction_hash: H256,
    /// Including block, absent for placeholder receipts
    pub block_number: Option<u64>,
    /// 1 for success, 0 for revert, when the node reports it
    pub status: Option<u64>,
    /// Address of a deployed contract
    pub contract_address: Option<Address>,
    /// Full receipt object, for fields not modelled here
    pub raw: Value,
}

impl TransactionReceipt {
    /// Parse an `eth_getTransactionReceipt` result object
    pub fn from_json(raw: Value) -> Result<Self, SdkError> {
        let fields: ReceiptFields = serde_json::from_value(raw.clone())?;
        Ok(Self {
            transaction_hash: H256::from_hex(&fields.transaction_hash)?,
            block_number: fields.block_number.as_deref().map(parse_hex_u64).transpose()?,
            status: fields.status.as_deref().map(parse_hex_u64).transpose()?,
            contract_address: fields.contract_address.as_deref().map(Address::from_hex).transpose()?,
            raw,
        })
    }

    /// Placeholder for a submitted transaction whose receipt was not fetched
    pub fn pending(hash: H256) -> Self {
        Self { transaction_hash: hash, block_number: None, status: None, contract_address: None, raw: Value::Null }
    }

    /// Whether this is a [`TransactionReceipt::pending`] placeholder
    pub fn is_pending(&self) -> bool {
        self.raw.is_null()
    }

    /// Execution outcome, if the node reported a status
    pub fn succeeded(&self) -> Option<bool> {
        self.status.map(|status| status == 1)
    }
}

pub(crate) fn parse_hex_u64(s: &str) -> Result<u64, SdkError> {
    let value = parse_quantity_hex(s)?;
    if value > U256::from(u64::MAX) {
        return Err(SdkError::InvalidHex(format!("{} does not fit in 64 bits", s)));
    }
    Ok(value.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_id_serialization() {
        assert_eq!(serde_json::to_value(BlockId::Pending).unwrap(), json!("pending"));
        assert_eq!(serde_json::to_value(BlockId::Number(255)).unwrap(), json!("0xff"));
    }

    #[test]
    fn test_call_request_skips_missing_fields() {
        let request = CallRequest {
            to: Some(Address::from_bytes([0x11; 20])),
            value: Some(U256::zero()),
            data: Some(Bytes::from_static(&[0xab])),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "to": "0x1111111111111111111111111111111111111111",
                "value": "0x0",
                "data": "0xab",
            })
        );
    }

    #[test]
    fn test_receipt_from_json() {
        let hash = H256::from_bytes([0x22; 32]);
        let receipt = TransactionReceipt::from_json(json!({
            "transactionHash": hash.to_hex(),
            "blockNumber": "0x1b4",
            "status": "0x1",
            "contractAddress": null,
            "gasUsed": "0x5208",
        }))
        .unwrap();

        assert_eq!(receipt.transaction_hash, hash);
        assert_eq!(receipt.block_number, Some(436));
        assert_eq!(receipt.succeeded(), Some(true));
        assert_eq!(receipt.raw["gasUsed"], json!("0x5208"));
        assert!(!receipt.is_pending());
    }

    #[test]
    fn test_receipt_missing_hash_is_error() {
        assert!(TransactionReceipt::from_json(json!({ "blockNumber": "0x1" })).is_err());
    }

    #[test]
    fn test_pending_placeholder() {
        let receipt = TransactionReceipt::pending(H256::ZERO);
        assert!(receipt.is_pending());
        assert_eq!(receipt.succeeded(), None);
    }

    #[test]
    fn test_request_builders() {
        let deploy = TransactionRequest::deploy(vec![0x60, 0x80]);
        assert!(deploy.to.is_none());
        let call = TransactionRequest::call(Address::ZERO, Vec::new()).gas_limit(U256::from(50_000u64));
        assert_eq!(call.gas_limit, Some(U256::from(50_000u64)));
    }
}
