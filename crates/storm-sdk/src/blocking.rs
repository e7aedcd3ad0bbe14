//! Synchronous facade over [`TransactionManager`]

use std::sync::Arc;

use storm_primitives::{Address, H256, U256};
use tokio::runtime::{Builder, Runtime};

use crate::abi::{Function, Value};
use crate::tx_manager::TransactionManager;
use crate::types::{PendingTransaction, TransactionReceipt, TransactionRequest};
use crate::SdkError;

/// Blocking wrapper that drives the async manager on a private runtime.
///
/// Must not be used from inside another Tokio runtime.
pub struct BlockingTransactionManager {
    runtime: Runtime,
    inner: Arc<TransactionManager>,
}

impl BlockingTransactionManager {
    /// Wrap `manager`, starting a dedicated runtime for it
    pub fn new(manager: TransactionManager) -> Result<Self, SdkError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("storm-blocking")
            .enable_all()
            .build()
            .map_err(runtime_error)?;
        Ok(Self { runtime, inner: Arc::new(manager) })
    }

    /// The wrapped async manager
    pub fn inner(&self) -> &Arc<TransactionManager> {
        &self.inner
    }

    /// Sending address
    pub fn address(&self) -> &Address {
        self.inner.address()
    }

    /// See [`TransactionManager::send_transaction`]
    pub fn send_transaction(&self, request: TransactionRequest) -> Result<PendingTransaction, SdkError> {
        self.runtime.block_on(self.inner.send_transaction(request))
    }

    /// See [`TransactionManager::send_and_wait`]
    pub fn send_and_wait(&self, request: TransactionRequest) -> Result<TransactionReceipt, SdkError> {
        self.runtime.block_on(self.inner.send_and_wait(request))
    }

    /// See [`TransactionManager::wait_for_receipt`]
    pub fn wait_for_receipt(&self, hash: H256) -> Result<TransactionReceipt, SdkError> {
        self.runtime.block_on(self.inner.wait_for_receipt(hash))
    }

    /// See [`TransactionManager::replace_transaction`]
    pub fn replace_transaction(
        &self,
        nonce: u64,
        request: TransactionRequest,
    ) -> Result<PendingTransaction, SdkError> {
        self.runtime.block_on(self.inner.replace_transaction(nonce, request))
    }

    /// See [`TransactionManager::execute`]
    pub fn execute(&self, function: &Function, to: Address, value: U256) -> Result<TransactionReceipt, SdkError> {
        self.runtime.block_on(self.inner.execute(function, to, value))
    }

    /// See [`TransactionManager::call`]
    pub fn call(&self, function: &Function, to: Address) -> Result<Vec<Value>, SdkError> {
        self.runtime.block_on(self.inner.call(function, to))
    }
}

fn runtime_error(e: std::io::Error) -> SdkError {
    SdkError::Runtime(format!("failed to start runtime: {}", e))
}

impl std::fmt::Debug for BlockingTransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingTransactionManager").field("inner", &self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Web3Client;
    use crate::config::ManagerConfig;
    use crate::credentials::Credentials;
    use crate::transport::MockTransport;
    use serde_json::json;

    fn blocking(mock: &MockTransport) -> BlockingTransactionManager {
        let config = ManagerConfig { poll_interval_ms: 1, poll_attempts: 2, ..Default::default() };
        let manager = TransactionManager::new(
            Web3Client::with_transport(mock.clone()),
            Arc::new(Credentials::random()),
            config,
        );
        BlockingTransactionManager::new(manager).unwrap()
    }

    #[test]
    fn test_blocking_send_and_wait() {
        let mock = MockTransport::new();
        let manager = blocking(&mock);

        let pending = manager.send_transaction(TransactionRequest::default()).unwrap();
        mock.push_response(
            "eth_getTransactionReceipt",
            json!({ "transactionHash": pending.hash.to_hex(), "blockNumber": "0x2", "status": "0x1" }),
        );
        let receipt = manager.wait_for_receipt(pending.hash).unwrap();
        assert_eq!(receipt.transaction_hash, pending.hash);
    }

    #[test]
    fn test_runtime_failure_is_not_a_transport_error() {
        let err = runtime_error(std::io::Error::new(std::io::ErrorKind::Other, "no threads"));
        assert!(matches!(err, SdkError::Runtime(_)));
        assert!(err.to_string().contains("no threads"));
    }

    #[test]
    fn test_blocking_timeout_surfaces() {
        let mock = MockTransport::new();
        let manager = blocking(&mock);

        let err = manager.send_and_wait(TransactionRequest::default()).unwrap_err();
        assert!(matches!(err, SdkError::ReceiptTimeout { attempts: 3, .. }));
        assert_eq!(mock.call_count("eth_getTransactionReceipt"), 3);
    }
}
