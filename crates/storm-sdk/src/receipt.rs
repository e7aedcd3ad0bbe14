//! Receipt polling

use std::time::Duration;

use async_trait::async_trait;
use storm_primitives::H256;
use tracing::{debug, trace, warn};

use crate::client::Web3Client;
use crate::types::TransactionReceipt;
use crate::SdkError;

/// Turns a submitted transaction hash into a receipt
#[async_trait]
pub trait ReceiptProcessor: Send + Sync {
    /// Wait (or not) for the receipt of `hash`
    async fn wait_for_receipt(&self, client: &Web3Client, hash: H256) -> Result<TransactionReceipt, SdkError>;
}

/// Queries the node until the receipt appears or the attempt budget runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingReceiptProcessor {
    interval: Duration,
    max_attempts: u32,
}

impl PollingReceiptProcessor {
    /// One immediate query plus up to `max_attempts` more, `interval` apart
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts }
    }
}

#[async_trait]
impl ReceiptProcessor for PollingReceiptProcessor {
    async fn wait_for_receipt(&self, client: &Web3Client, hash: H256) -> Result<TransactionReceipt, SdkError> {
        poll_for_receipt(client, hash, self.interval, self.max_attempts).await
    }
}

/// Returns [`TransactionReceipt::pending`] without touching the node
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReceiptProcessor;

#[async_trait]
impl ReceiptProcessor for NoOpReceiptProcessor {
    async fn wait_for_receipt(&self, _client: &Web3Client, hash: H256) -> Result<TransactionReceipt, SdkError> {
        Ok(TransactionReceipt::pending(hash))
    }
}

/// Query for the receipt of `hash`: once immediately, then up to
/// `max_attempts` more times, sleeping `interval` before each retry.
///
/// Only an absent receipt is retried; transport and RPC errors end the poll.
pub async fn poll_for_receipt(
    client: &Web3Client,
    hash: H256,
    interval: Duration,
    max_attempts: u32,
) -> Result<TransactionReceipt, SdkError> {
    let total = max_attempts.saturating_add(1);
    for attempt in 1..=total {
        if attempt > 1 {
            tokio::time::sleep(interval).await;
        }
        if let Some(receipt) = client.get_transaction_receipt(&hash).await? {
            debug!(%hash, attempt, "receipt found");
            return Ok(receipt);
        }
        trace!(%hash, attempt, "receipt not yet available");
    }

    warn!(%hash, attempts = total, "gave up waiting for receipt");
    Err(SdkError::ReceiptTimeout { hash, attempts: total })
}
