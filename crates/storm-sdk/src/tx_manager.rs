//! Transaction manager: nonce assignment, signing, submission and confirmation
//!
//! ```text
//!   Built ──► Signed ──► Submitted ──► Confirmed
//!                            │   └───► TimedOut      (nonce stays consumed)
//!                            └───────► HashMismatch  (nonce not consumed)
//! ```

use std::sync::Arc;

use storm_primitives::{Address, H256, U256};
use storm_types::RawTransaction;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::abi::{Function, Value};
use crate::client::Web3Client;
use crate::config::{ManagerConfig, TimeoutNoncePolicy};
use crate::credentials::Credentials;
use crate::nonce::NonceTracker;
use crate::receipt::{PollingReceiptProcessor, ReceiptProcessor};
use crate::types::{BlockId, CallRequest, PendingTransaction, TransactionReceipt, TransactionRequest};
use crate::SdkError;

/// Signs and submits transactions for one account
pub struct TransactionManager {
    client: Web3Client,
    credentials: Arc<Credentials>,
    nonces: Arc<NonceTracker>,
    receipts: Box<dyn ReceiptProcessor>,
    config: ManagerConfig,
}

impl TransactionManager {
    /// Manager with its own nonce tracker and a receipt poller built from `config`
    pub fn new(client: Web3Client, credentials: Arc<Credentials>, config: ManagerConfig) -> Self {
        let receipts = PollingReceiptProcessor::new(config.poll_interval(), config.poll_attempts);
        Self {
            client,
            credentials,
            nonces: Arc::new(NonceTracker::new()),
            receipts: Box::new(receipts),
            config,
        }
    }

    /// Connect over HTTP to `config.rpc_url`, signing with the key named by
    /// `config.private_key_env`
    #[cfg(feature = "http")]
    pub fn from_config(config: ManagerConfig) -> Result<Self, SdkError> {
        let credentials = Arc::new(config.credentials()?);
        let client = Web3Client::connect(&config.rpc_url);
        Ok(Self::new(client, credentials, config))
    }

    /// Share a nonce tracker with other managers signing for the same account
    pub fn with_nonce_tracker(mut self, nonces: Arc<NonceTracker>) -> Self {
        self.nonces = nonces;
        self
    }

    /// Replace the receipt strategy
    pub fn with_receipt_processor(mut self, receipts: impl ReceiptProcessor + 'static) -> Self {
        self.receipts = Box::new(receipts);
        self
    }

    /// Sending address
    pub fn address(&self) -> &Address {
        self.credentials.address()
    }

    /// Underlying RPC client
    pub fn client(&self) -> &Web3Client {
        &self.client
    }

    /// Nonce tracker in use
    pub fn nonce_tracker(&self) -> &Arc<NonceTracker> {
        &self.nonces
    }

    /// Active configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Assign the next nonce, sign and submit. Returns once the node has
    /// accepted the transaction and echoed the expected hash.
    ///
    /// The nonce is consumed only on success; a transport error or a
    /// [`SdkError::TxHashMismatch`] leaves it free for the next send.
    pub async fn send_transaction(&self, request: TransactionRequest) -> Result<PendingTransaction, SdkError> {
        let mut guard = self.nonces.lock(*self.address()).await;
        let nonce = guard.next_nonce(&self.client).await?;
        let pending = self.sign_and_submit(nonce, request).await?;
        guard.commit(nonce);
        Ok(pending)
    }

    /// [`Self::send_transaction`], then wait for the receipt
    pub async fn send_and_wait(&self, request: TransactionRequest) -> Result<TransactionReceipt, SdkError> {
        let pending = self.send_transaction(request).await?;
        self.wait_for_receipt(pending.hash).await
    }

    /// Run [`Self::send_and_wait`] on the Tokio runtime
    pub fn spawn_send_and_wait(
        self: &Arc<Self>,
        request: TransactionRequest,
    ) -> JoinHandle<Result<TransactionReceipt, SdkError>> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.send_and_wait(request).await })
    }

    /// Wait for the receipt of an already submitted transaction
    pub async fn wait_for_receipt(&self, hash: H256) -> Result<TransactionReceipt, SdkError> {
        self.receipts.wait_for_receipt(&self.client, hash).await
    }

    /// Sign `request` with the nonce of an earlier transaction, typically one
    /// whose receipt timed out, so the node can replace it.
    ///
    /// Requires [`TimeoutNoncePolicy::AllowReplacement`]. The tracker is not
    /// advanced: the nonce was consumed when it was first used.
    pub async fn replace_transaction(
        &self,
        nonce: u64,
        request: TransactionRequest,
    ) -> Result<PendingTransaction, SdkError> {
        if self.config.timeout_nonce_policy != TimeoutNoncePolicy::AllowReplacement {
            return Err(SdkError::ReplacementDisabled);
        }

        // hold the account lock so the replacement cannot interleave with a new send
        let mut guard = self.nonces.lock(*self.address()).await;
        let next = guard.next_nonce(&self.client).await?;
        if nonce >= next {
            return Err(SdkError::NonceNotIssued { nonce, next });
        }
        info!(address = %self.address(), nonce, "replacing transaction");
        self.sign_and_submit(nonce, request).await
    }

    /// Encode `function`, submit it to `to` and wait for the receipt
    pub async fn execute(&self, function: &Function, to: Address, value: U256) -> Result<TransactionReceipt, SdkError> {
        let call = function.encode();
        debug!(function = function.name(), %to, "executing contract function");
        self.send_and_wait(TransactionRequest::call(to, call.calldata).value(value)).await
    }

    /// Read-only `eth_call` of `function` on `to`, decoded against its outputs
    pub async fn call(&self, function: &Function, to: Address) -> Result<Vec<Value>, SdkError> {
        let request = CallRequest {
            from: Some(*self.address()),
            to: Some(to),
            data: Some(function.encode().calldata),
            ..Default::default()
        };
        let output = self.client.call(&request, BlockId::Latest).await?;
        Ok(function.decode_output(&output)?)
    }

    fn build(&self, nonce: u64, request: TransactionRequest) -> RawTransaction {
        let gas_price = request.gas_price.unwrap_or_else(|| U256::from(self.config.gas_price));
        let gas_limit = request.gas_limit.unwrap_or_else(|| U256::from(self.config.gas_limit));
        match request.to {
            Some(to) => RawTransaction::call(nonce, gas_price, gas_limit, to, request.value, request.data),
            None => RawTransaction::deploy(nonce, gas_price, gas_limit, request.value, request.data),
        }
    }

    async fn sign_and_submit(&self, nonce: u64, request: TransactionRequest) -> Result<PendingTransaction, SdkError> {
        let tx = self.build(nonce, request);
        let signed = self.credentials.sign_transaction(tx, self.config.chain_id)?;
        let local = signed.hash();
        debug!(address = %self.address(), nonce, hash = %local, "transaction signed");

        let remote = self.client.send_raw_transaction(signed.encoded()).await?;
        if remote != local {
            warn!(nonce, %local, %remote, "node reported a different transaction hash");
            return Err(SdkError::TxHashMismatch { local, remote });
        }

        info!(address = %self.address(), nonce, hash = %local, "transaction submitted");
        Ok(PendingTransaction::new(local, nonce))
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("address", self.address())
            .field("chain_id", &self.config.chain_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::TypeDescriptor;
    use crate::transport::MockTransport;
    use serde_json::json;
    use storm_types::SignedTransaction;

    fn manager(mock: &MockTransport, config: ManagerConfig) -> TransactionManager {
        let credentials = Arc::new(Credentials::from_private_key(&[0x46; 32]).unwrap());
        TransactionManager::new(Web3Client::with_transport(mock.clone()), credentials, config)
    }

    fn submitted(mock: &MockTransport) -> Vec<SignedTransaction> {
        mock.requests("eth_sendRawTransaction")
            .iter()
            .map(|params| {
                let raw = params[0].as_str().unwrap().trim_start_matches("0x");
                SignedTransaction::decode(&hex::decode(raw).unwrap()).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_send_uses_config_and_chain_id() {
        let mock = MockTransport::new();
        mock.set_response("eth_getTransactionCount", json!("0x4"));
        let config = ManagerConfig { chain_id: Some(1), ..Default::default() };
        let manager = manager(&mock, config);

        let to = Address::from_bytes([0x35; 20]);
        let pending = manager.send_transaction(TransactionRequest::transfer(to, U256::from(5u64))).await.unwrap();
        assert_eq!(pending.nonce, 4);

        let sent = &submitted(&mock)[0];
        assert_eq!(sent.hash(), pending.hash);
        assert_eq!(sent.nonce(), 4);
        assert_eq!(sent.chain_id(), Some(1));
        assert_eq!(sent.transaction().gas_price, U256::from(22_000_000_000u64));
        assert_eq!(sent.transaction().gas_limit, U256::from(4_300_000u64));
        assert_eq!(&sent.recover_sender().unwrap(), manager.address());
    }

    #[tokio::test]
    async fn test_legacy_signature_without_chain_id() {
        let mock = MockTransport::new();
        let manager = manager(&mock, ManagerConfig::default());
        manager.send_transaction(TransactionRequest::deploy(vec![0x60, 0x00])).await.unwrap();

        let sent = &submitted(&mock)[0];
        assert!(sent.v() == 27 || sent.v() == 28);
        assert!(sent.is_contract_creation());
    }

    #[tokio::test]
    async fn test_replacement_disabled_by_default() {
        let mock = MockTransport::new();
        let manager = manager(&mock, ManagerConfig::default());
        let err = manager.replace_transaction(0, TransactionRequest::default()).await.unwrap_err();
        assert!(matches!(err, SdkError::ReplacementDisabled));
        assert_eq!(mock.call_count("eth_sendRawTransaction"), 0);
    }

    #[tokio::test]
    async fn test_replacement_reuses_nonce() {
        let mock = MockTransport::new();
        let config = ManagerConfig { timeout_nonce_policy: TimeoutNoncePolicy::AllowReplacement, ..Default::default() };
        let manager = manager(&mock, config);

        let first = manager.send_transaction(TransactionRequest::default()).await.unwrap();
        let bumped = TransactionRequest::default().gas_price(U256::from(30_000_000_000u64));
        let replacement = manager.replace_transaction(first.nonce, bumped).await.unwrap();

        assert_eq!(replacement.nonce, first.nonce);
        assert_ne!(replacement.hash, first.hash);
        assert_eq!(manager.nonce_tracker().peek(*manager.address()).await, Some(1));

        let err = manager.replace_transaction(5, TransactionRequest::default()).await.unwrap_err();
        assert!(matches!(err, SdkError::NonceNotIssued { nonce: 5, next: 1 }));
    }

    #[tokio::test]
    async fn test_call_decodes_outputs() {
        let mock = MockTransport::new();
        mock.set_response("eth_call", json!(format!("0x{}", "00".repeat(31) + "2a")));
        let manager = manager(&mock, ManagerConfig::default());

        let function = Function::new("get", Vec::new(), vec![TypeDescriptor::uint()]);
        let to = Address::from_bytes([0x77; 20]);
        let values = manager.call(&function, to).await.unwrap();
        assert_eq!(values, vec![Value::uint256(42u64)]);

        let params = &mock.requests("eth_call")[0];
        assert_eq!(params[0]["to"], json!(to.to_hex()));
        assert_eq!(params[0]["data"], json!(function.encode().to_hex()));
        assert_eq!(params[1], json!("latest"));
        assert_eq!(mock.call_count("eth_sendRawTransaction"), 0);
    }

    #[tokio::test]
    async fn test_call_to_account_without_code_fails() {
        let mock = MockTransport::new();
        let manager = manager(&mock, ManagerConfig::default());

        // default mock answers `0x`
        let function = Function::new("get", Vec::new(), vec![TypeDescriptor::uint()]);
        let err = manager.call(&function, Address::from_bytes([0x78; 20])).await.unwrap_err();
        assert!(matches!(err, SdkError::Abi(crate::AbiError::Decode { .. })));
    }
}
