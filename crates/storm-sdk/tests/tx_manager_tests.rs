//! Transaction manager tests for storm-sdk
//!
//! Drives the manager against a scripted node to check nonce consumption,
//! hash verification and receipt handling.

use std::sync::Arc;

use serde_json::json;
use storm_sdk::abi::{Function, TypeDescriptor, Value};
use storm_sdk::{
    Address, BlockingTransactionManager, Credentials, ManagerConfig, MockTransport, NoOpReceiptProcessor, SdkError,
    SignedTransaction, TransactionManager, TransactionRequest, Web3Client, H256, U256,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_config() -> ManagerConfig {
    ManagerConfig { chain_id: Some(1337), poll_interval_ms: 1, poll_attempts: 2, ..Default::default() }
}

fn manager(mock: &MockTransport) -> TransactionManager {
    init_tracing();
    let credentials = Arc::new(Credentials::from_private_key(&[0x11; 32]).unwrap());
    TransactionManager::new(Web3Client::with_transport(mock.clone()), credentials, fast_config())
}

fn sent_nonces(mock: &MockTransport) -> Vec<u64> {
    mock.requests("eth_sendRawTransaction")
        .iter()
        .map(|params| {
            let raw = params[0].as_str().unwrap().trim_start_matches("0x");
            SignedTransaction::decode(&hex::decode(raw).unwrap()).unwrap().nonce()
        })
        .collect()
}

fn mined(hash: H256) -> serde_json::Value {
    json!({ "transactionHash": hash.to_hex(), "blockNumber": "0x10", "status": "0x1" })
}

fn recipient() -> Address {
    Address::from_bytes([0x42; 20])
}

// ==================== Hash Verification ====================

/// A node echoing the wrong hash fails the send without waiting for a receipt
#[tokio::test]
async fn test_hash_mismatch_is_fatal_and_skips_polling() {
    let mock = MockTransport::new();
    let bogus = H256::from_bytes([0xee; 32]);
    mock.push_response("eth_sendRawTransaction", json!(bogus.to_hex()));
    let manager = manager(&mock);

    let err = manager.send_and_wait(TransactionRequest::transfer(recipient(), U256::one())).await.unwrap_err();
    match &err {
        SdkError::TxHashMismatch { local, remote } => {
            assert_eq!(*remote, bogus);
            assert_ne!(local, remote);
        }
        other => panic!("expected hash mismatch, got {:?}", other),
    }
    assert!(err.is_fatal());
    assert_eq!(mock.call_count("eth_getTransactionReceipt"), 0);
}

/// The nonce of a mismatched submission is handed out again
#[tokio::test]
async fn test_hash_mismatch_does_not_consume_nonce() {
    let mock = MockTransport::new();
    mock.set_response("eth_getTransactionCount", json!("0x9"));
    mock.push_response("eth_sendRawTransaction", json!(H256::from_bytes([1; 32]).to_hex()));
    let manager = manager(&mock);

    assert!(manager.send_transaction(TransactionRequest::default()).await.is_err());
    let pending = manager.send_transaction(TransactionRequest::default()).await.unwrap();

    assert_eq!(pending.nonce, 9);
    assert_eq!(sent_nonces(&mock), vec![9, 9]);
}

/// The returned hash is keccak256 of exactly the bytes that were sent
#[tokio::test]
async fn test_pending_hash_matches_sent_bytes() {
    let mock = MockTransport::new();
    let manager = manager(&mock);

    let pending = manager.send_transaction(TransactionRequest::transfer(recipient(), U256::from(7u64))).await.unwrap();
    let params = &mock.requests("eth_sendRawTransaction")[0];
    let raw = hex::decode(params[0].as_str().unwrap().trim_start_matches("0x")).unwrap();
    assert_eq!(storm_crypto::keccak256(&raw), pending.hash);
}

// ==================== Nonce Consumption ====================

/// A dropped connection during submission leaves the nonce free
#[tokio::test]
async fn test_transport_error_does_not_consume_nonce() {
    let mock = MockTransport::new();
    mock.push_transport_error("eth_sendRawTransaction", "connection refused");
    let manager = manager(&mock);

    let err = manager.send_transaction(TransactionRequest::default()).await.unwrap_err();
    assert!(matches!(err, SdkError::Transport(_)));
    assert!(!err.is_fatal());

    let pending = manager.send_transaction(TransactionRequest::default()).await.unwrap();
    assert_eq!(pending.nonce, 0);
}

/// A node rejection is reported as an RPC error and also leaves the nonce free
#[tokio::test]
async fn test_rpc_rejection_does_not_consume_nonce() {
    let mock = MockTransport::new();
    mock.push_rpc_error("eth_sendRawTransaction", -32000, "insufficient funds for gas * price + value");
    let manager = manager(&mock);

    let err = manager.send_transaction(TransactionRequest::default()).await.unwrap_err();
    assert!(matches!(err, SdkError::Rpc { code: -32000, .. }));
    assert_eq!(manager.send_transaction(TransactionRequest::default()).await.unwrap().nonce, 0);
}

/// Under the default policy a timed out transaction keeps its nonce
#[tokio::test]
async fn test_receipt_timeout_consumes_nonce() {
    let mock = MockTransport::new();
    let manager = manager(&mock);

    let err = manager.send_and_wait(TransactionRequest::default()).await.unwrap_err();
    assert!(matches!(err, SdkError::ReceiptTimeout { attempts: 3, .. }));
    assert!(!err.is_fatal());

    let pending = manager.send_transaction(TransactionRequest::default()).await.unwrap();
    assert_eq!(pending.nonce, 1);
    assert_eq!(sent_nonces(&mock), vec![0, 1]);
}

// ==================== Receipts ====================

/// Receipt appears on a later poll and is returned as-is
#[tokio::test]
async fn test_send_and_wait_returns_receipt() {
    let mock = MockTransport::new();
    let manager = manager(&mock);
    let expected = storm_crypto::keccak256(b"placeholder");
    mock.push_response("eth_getTransactionReceipt", serde_json::Value::Null);
    mock.push_response("eth_getTransactionReceipt", mined(expected));

    let receipt = manager.send_and_wait(TransactionRequest::transfer(recipient(), U256::one())).await.unwrap();
    assert_eq!(receipt.transaction_hash, expected);
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(receipt.succeeded(), Some(true));
    assert_eq!(mock.call_count("eth_getTransactionReceipt"), 2);
}

/// The no-op strategy returns immediately with a placeholder receipt
#[tokio::test]
async fn test_no_op_receipt_processor() {
    let mock = MockTransport::new();
    let manager = manager(&mock).with_receipt_processor(NoOpReceiptProcessor);

    let receipt = manager.send_and_wait(TransactionRequest::default()).await.unwrap();
    assert!(receipt.is_pending());
    assert_eq!(mock.call_count("eth_getTransactionReceipt"), 0);
}

/// Spawned sends run on the runtime and report their own result
#[tokio::test]
async fn test_spawn_send_and_wait() {
    let mock = MockTransport::new();
    mock.set_response("eth_getTransactionReceipt", mined(H256::from_bytes([3; 32])));
    let manager = Arc::new(manager(&mock));

    let handle = manager.spawn_send_and_wait(TransactionRequest::transfer(recipient(), U256::one()));
    let receipt = handle.await.unwrap().unwrap();
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(sent_nonces(&mock), vec![0]);
}

// ==================== Contract Calls ====================

/// Deployments carry no recipient and the init code as data
#[tokio::test]
async fn test_deploy_contract() {
    let mock = MockTransport::new();
    let manager = manager(&mock);
    let init_code = vec![0x60, 0x80, 0x60, 0x40, 0x52];

    manager.send_transaction(TransactionRequest::deploy(init_code.clone())).await.unwrap();

    let params = &mock.requests("eth_sendRawTransaction")[0];
    let raw = hex::decode(params[0].as_str().unwrap().trim_start_matches("0x")).unwrap();
    let signed = SignedTransaction::decode(&raw).unwrap();
    assert!(signed.is_contract_creation());
    assert_eq!(signed.transaction().data.to_vec(), init_code);
    assert_eq!(signed.chain_id(), Some(1337));
}

/// execute encodes the call, sends value along and waits for the receipt
#[tokio::test]
async fn test_execute_function() {
    let mock = MockTransport::new();
    mock.set_response("eth_getTransactionReceipt", mined(H256::from_bytes([4; 32])));
    let manager = manager(&mock);

    let function = Function::new(
        "transfer",
        vec![Value::Address(recipient()), Value::uint256(1000u64)],
        vec![TypeDescriptor::bool()],
    );
    manager.execute(&function, recipient(), U256::from(5u64)).await.unwrap();

    let params = &mock.requests("eth_sendRawTransaction")[0];
    let raw = hex::decode(params[0].as_str().unwrap().trim_start_matches("0x")).unwrap();
    let signed = SignedTransaction::decode(&raw).unwrap();
    assert_eq!(signed.to(), Some(&recipient()));
    assert_eq!(signed.transaction().value, U256::from(5u64));
    assert_eq!(&signed.transaction().data[..4], &function.selector()[..]);
}

// ==================== Blocking Facade ====================

/// Blocking calls share the async manager's nonce tracker
#[test]
fn test_blocking_manager_advances_nonce() {
    let mock = MockTransport::new();
    let manager = BlockingTransactionManager::new(manager(&mock)).unwrap();

    let first = manager.send_transaction(TransactionRequest::default()).unwrap();
    let second = manager.send_transaction(TransactionRequest::default()).unwrap();
    assert_eq!((first.nonce, second.nonce), (0, 1));
    assert_eq!(mock.call_count("eth_getTransactionCount"), 1);
}

// ==================== Signing ====================

/// A chain id too large for EIP-155 fails signing and never reaches the node
#[tokio::test]
async fn test_oversized_chain_id_fails_signing() {
    let mock = MockTransport::new();
    let credentials = Arc::new(Credentials::from_private_key(&[0x11; 32]).unwrap());
    let config = ManagerConfig { chain_id: Some(u64::MAX), ..fast_config() };
    let manager = TransactionManager::new(Web3Client::with_transport(mock.clone()), credentials, config);

    let err = manager.send_transaction(TransactionRequest::default()).await.unwrap_err();
    assert!(matches!(err, SdkError::Signing(_)));
    assert!(err.is_fatal());
    assert_eq!(mock.call_count("eth_sendRawTransaction"), 0);
    assert_eq!(manager.nonce_tracker().peek(*manager.address()).await, Some(0));
}
