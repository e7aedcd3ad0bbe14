//! Web3Client - typed wrapper over the JSON-RPC transport

use bytes::Bytes;
use serde_json::Value;
use storm_primitives::{parse_quantity_hex, Address, H256, U256};

use crate::transport::{deserialize_response, MockTransport, Transport};
use crate::types::{parse_hex_u64, BlockId, CallRequest, TransactionReceipt};
use crate::SdkError;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// RPC client for the `eth_*` methods the transaction manager needs
pub struct Web3Client {
    transport: Box<dyn Transport>,
}

impl Web3Client {
    /// Create a new client with HTTP transport
    #[cfg(feature = "http")]
    pub fn connect(url: &str) -> Self {
        Self::with_transport(HttpTransport::new(url))
    }

    /// Create a new client with mock transport (for testing)
    pub fn new_mock() -> Self {
        Self::with_transport(MockTransport::new())
    }

    /// Create a client with a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self { transport: Box::new(transport) }
    }

    /// Helper method to make RPC request and deserialize
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, SdkError> {
        let value = self.transport.request_json(method, params).await?;
        deserialize_response(value)
    }

    // ==================== Chain Info ====================

    /// Get the chain ID
    pub async fn chain_id(&self) -> Result<u64, SdkError> {
        let result: String = self.request("eth_chainId", vec![]).await?;
        parse_hex_u64(&result)
    }

    /// Get the current gas price
    pub async fn gas_price(&self) -> Result<U256, SdkError> {
        let result: String = self.request("eth_gasPrice", vec![]).await?;
        Ok(parse_quantity_hex(&result)?)
    }

    /// Get the current block number
    pub async fn block_number(&self) -> Result<u64, SdkError> {
        let result: String = self.request("eth_blockNumber", vec![]).await?;
        parse_hex_u64(&result)
    }

    // ==================== Account Queries ====================

    /// Get the transaction count of an address at `block`
    pub async fn get_transaction_count(&self, address: &Address, block: BlockId) -> Result<u64, SdkError> {
        let result: String = self
            .request(
                "eth_getTransactionCount",
                vec![Value::String(address.to_hex()), serde_json::to_value(block)?],
            )
            .await?;
        parse_hex_u64(&result)
    }

    // ==================== Transactions ====================

    /// Submit signed RLP bytes; returns the hash the node reports
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256, SdkError> {
        let hex = format!("0x{}", hex::encode(raw));
        let result: String = self.request("eth_sendRawTransaction", vec![Value::String(hex)]).await?;
        Ok(H256::from_hex(&result)?)
    }

    /// Get a transaction receipt; `None` while the transaction is not mined
    pub async fn get_transaction_receipt(&self, hash: &H256) -> Result<Option<TransactionReceipt>, SdkError> {
        let result: Value = self
            .request("eth_getTransactionReceipt", vec![Value::String(hash.to_hex())])
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        TransactionReceipt::from_json(result).map(Some)
    }

    // ==================== Call & Estimation ====================

    /// Execute a call (read-only, does not create transaction)
    pub async fn call(&self, request: &CallRequest, block: BlockId) -> Result<Bytes, SdkError> {
        let result: String = self
            .request("eth_call", vec![serde_json::to_value(request)?, serde_json::to_value(block)?])
            .await?;
        parse_hex_bytes(&result)
    }

    /// Estimate gas for a transaction
    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<U256, SdkError> {
        let result: String = self.request("eth_estimateGas", vec![serde_json::to_value(request)?]).await?;
        Ok(parse_quantity_hex(&result)?)
    }
}

impl std::fmt::Debug for Web3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Web3Client").finish_non_exhaustive()
    }
}

fn parse_hex_bytes(s: &str) -> Result<Bytes, SdkError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(Bytes::new());
    }
    let bytes = hex::decode(s)?;
    Ok(Bytes::from(bytes))
}
