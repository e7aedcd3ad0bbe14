//! Transport layer for RPC communication

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::SdkError;

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get JSON response
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError>;
}

/// Helper to deserialize response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SdkError> {
    serde_json::from_value(value).map_err(|e| SdkError::Serialization(e.to_string()))
}

/// One scripted answer
#[derive(Debug, Clone)]
enum Reply {
    Result(Value),
    Rpc { code: i64, message: String },
    Transport(String),
}

impl Reply {
    fn into_result(self) -> Result<Value, SdkError> {
        match self {
            Reply::Result(value) => Ok(value),
            Reply::Rpc { code, message } => Err(SdkError::Rpc { code, message }),
            Reply::Transport(message) => Err(SdkError::Transport(message)),
        }
    }
}

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// JSON-RPC method
    pub method: String,
    /// Positional parameters
    pub params: Vec<Value>,
}

#[derive(Default)]
struct MockState {
    queued: HashMap<String, VecDeque<Reply>>,
    responses: HashMap<String, Value>,
    defaults: HashMap<String, Value>,
    calls: Vec<RecordedCall>,
}

/// Mock transport for testing.
///
/// Answers come from, in order: replies queued with `push_*` (consumed once),
/// fixed responses from [`MockTransport::set_response`], then built-in
/// defaults. `eth_sendRawTransaction` echoes keccak256 of the submitted
/// bytes unless scripted otherwise, like an honest node. Every request is
/// recorded. Clones share state, so a test can keep a handle after moving
/// one into a client.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();

        defaults.insert("eth_chainId".to_string(), Value::String("0x1".to_string()));
        defaults.insert("eth_gasPrice".to_string(), Value::String("0x3b9aca00".to_string())); // 1 gwei
        defaults.insert("eth_blockNumber".to_string(), Value::String("0x100".to_string()));
        defaults.insert("eth_getTransactionCount".to_string(), Value::String("0x0".to_string()));
        defaults.insert("eth_estimateGas".to_string(), Value::String("0x5208".to_string())); // 21000
        defaults.insert("eth_getTransactionReceipt".to_string(), Value::Null);
        defaults.insert("eth_call".to_string(), Value::String("0x".to_string()));

        Self {
            state: Arc::new(Mutex::new(MockState { defaults, ..Default::default() })),
        }
    }

    /// Answer every call to `method` with `response` (until cleared)
    pub fn set_response(&self, method: &str, response: Value) {
        self.state.lock().responses.insert(method.to_string(), response);
    }

    /// Clear fixed responses and queued replies
    pub fn clear_responses(&self) {
        let mut state = self.state.lock();
        state.responses.clear();
        state.queued.clear();
    }

    /// Answer the next unanswered call to `method` with `response`
    pub fn push_response(&self, method: &str, response: Value) {
        self.push(method, Reply::Result(response));
    }

    /// Fail the next unanswered call to `method` with a JSON-RPC error
    pub fn push_rpc_error(&self, method: &str, code: i64, message: &str) {
        self.push(method, Reply::Rpc { code, message: message.to_string() });
    }

    /// Fail the next unanswered call to `method` as if the connection broke
    pub fn push_transport_error(&self, method: &str, message: &str) {
        self.push(method, Reply::Transport(message.to_string()));
    }

    fn push(&self, method: &str, reply: Reply) {
        self.state.lock().queued.entry(method.to_string()).or_default().push_back(reply);
    }

    /// Every request seen so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Parameters of every call to `method`, in order
    pub fn requests(&self, method: &str) -> Vec<Vec<Value>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .map(|call| call.params.clone())
            .collect()
    }

    /// Number of calls to `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|call| call.method == method).count()
    }

    fn reply(&self, method: &str, params: &[Value]) -> Reply {
        let mut state = self.state.lock();
        state.calls.push(RecordedCall { method: method.to_string(), params: params.to_vec() });

        if let Some(reply) = state.queued.get_mut(method).and_then(VecDeque::pop_front) {
            return reply;
        }
        if let Some(response) = state.responses.get(method) {
            return Reply::Result(response.clone());
        }
        if method == "eth_sendRawTransaction" {
            return echo_raw_hash(params);
        }
        match state.defaults.get(method) {
            Some(response) => Reply::Result(response.clone()),
            None => Reply::Rpc { code: -32601, message: format!("Method not found: {}", method) },
        }
    }
}

fn echo_raw_hash(params: &[Value]) -> Reply {
    let raw = params
        .first()
        .and_then(Value::as_str)
        .map(|s| s.strip_prefix("0x").unwrap_or(s))
        .and_then(|s| hex::decode(s).ok());
    match raw {
        Some(bytes) => Reply::Result(Value::String(storm_crypto::keccak256(&bytes).to_hex())),
        None => Reply::Rpc { code: -32602, message: "invalid raw transaction".to_string() },
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        self.reply(method, &params).into_result()
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let id = self.next_id();
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(id, method, url = %self.url, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;

        let response: JsonRpcResponse =
            response.json().await.map_err(|e| SdkError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            tracing::debug!(id, method, code = error.code, "rpc error: {}", error.message);
            return Err(SdkError::Rpc { code: error.code, message: error.message });
        }

        // `null` is a legitimate result (e.g. a receipt that does not exist yet)
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_default_responses() {
        let transport = MockTransport::new();

        let result = transport.request_json("eth_chainId", vec![]).await.unwrap();
        assert_eq!(result, Value::String("0x1".to_string()));

        let result = transport.request_json("eth_getTransactionReceipt", vec![]).await.unwrap();
        assert!(result.is_null());
    }

    #[tokio::test]
    async fn test_mock_transport_custom_response() {
        let transport = MockTransport::new();
        transport.set_response("eth_chainId", Value::String("0x5".to_string()));

        let result = transport.request_json("eth_chainId", vec![]).await.unwrap();
        assert_eq!(result, Value::String("0x5".to_string()));
    }

    #[tokio::test]
    async fn test_mock_transport_queue_before_fixed() {
        let transport = MockTransport::new();
        transport.set_response("eth_blockNumber", Value::String("0x2".to_string()));
        transport.push_response("eth_blockNumber", Value::String("0x1".to_string()));
        transport.push_transport_error("eth_blockNumber", "reset");

        let first = transport.request_json("eth_blockNumber", vec![]).await.unwrap();
        assert_eq!(first, Value::String("0x1".to_string()));
        assert!(matches!(
            transport.request_json("eth_blockNumber", vec![]).await,
            Err(SdkError::Transport(_))
        ));
        let third = transport.request_json("eth_blockNumber", vec![]).await.unwrap();
        assert_eq!(third, Value::String("0x2".to_string()));
        assert_eq!(transport.call_count("eth_blockNumber"), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_echoes_raw_hash() {
        let transport = MockTransport::new();
        let result = transport
            .request_json("eth_sendRawTransaction", vec![Value::String("0xc0".to_string())])
            .await
            .unwrap();
        assert_eq!(result, Value::String(storm_crypto::keccak256(&[0xc0]).to_hex()));
        assert_eq!(transport.requests("eth_sendRawTransaction")[0], vec![Value::String("0xc0".into())]);
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_method() {
        let transport = MockTransport::new();
        let result = transport.request_json("unknown_method", vec![]).await;
        assert!(matches!(result, Err(SdkError::Rpc { code: -32601, .. })));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let transport = MockTransport::new();
        let handle = transport.clone();
        transport.request_json("eth_chainId", vec![]).await.unwrap();
        assert_eq!(handle.calls().len(), 1);
    }
}
