//! Per-account nonce tracking
//!
//! Each address owns an async mutex around its next nonce. The transaction
//! manager holds that lock from reading the nonce until the node has
//! accepted (or rejected) the signed bytes, so concurrent senders for one
//! account are serialized while unrelated accounts never contend.
//!
//! ```text
//!   lock ──► next_nonce ──► sign + submit ──► commit   (nonce consumed)
//!                                    │
//!                                    └──────► drop     (nonce reusable)
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use storm_primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

use crate::client::Web3Client;
use crate::types::BlockId;
use crate::SdkError;

/// `None` until the first read from the chain
type Slot = Arc<Mutex<Option<u64>>>;

/// Process-local next-nonce counters, one per sending address
#[derive(Debug, Default)]
pub struct NonceTracker {
    slots: DashMap<Address, Slot>,
}

impl NonceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, address: Address) -> Slot {
        // the shard guard is released before anyone awaits the inner mutex
        self.slots.entry(address).or_default().clone()
    }

    /// Take exclusive use of `address`'s nonce until the guard is dropped
    pub async fn lock(&self, address: Address) -> NonceGuard {
        let slot = self.slot(address).lock_owned().await;
        trace!(%address, "nonce lock acquired");
        NonceGuard { address, slot }
    }

    /// Next nonce the tracker would hand out, if it has been seeded
    pub async fn peek(&self, address: Address) -> Option<u64> {
        let slot = self.slot(address);
        let next = *slot.lock().await;
        next
    }

    /// Re-read the pending transaction count and raise the local counter to
    /// it if the chain is ahead. Never lowers the counter.
    pub async fn resync(&self, client: &Web3Client, address: Address) -> Result<u64, SdkError> {
        let mut guard = self.lock(address).await;
        let remote = client.get_transaction_count(&address, BlockId::Pending).await?;
        let next = guard.slot.map_or(remote, |local| local.max(remote));
        debug!(%address, remote, next, "nonce resynced");
        *guard.slot = Some(next);
        Ok(next)
    }
}

/// Exclusive handle on one address's nonce counter
pub struct NonceGuard {
    address: Address,
    slot: OwnedMutexGuard<Option<u64>>,
}

impl NonceGuard {
    /// Address this guard serializes
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Nonce to use for the next transaction, seeding from the chain's
    /// pending count on first use. Does not consume it.
    pub async fn next_nonce(&mut self, client: &Web3Client) -> Result<u64, SdkError> {
        if let Some(nonce) = *self.slot {
            return Ok(nonce);
        }
        let seeded = client.get_transaction_count(&self.address, BlockId::Pending).await?;
        debug!(address = %self.address, nonce = seeded, "nonce seeded from chain");
        *self.slot = Some(seeded);
        Ok(seeded)
    }

    /// Mark `nonce` as used: the counter moves past it and never goes back
    pub fn commit(mut self, nonce: u64) {
        let used = nonce.saturating_add(1);
        let next = self.slot.map_or(used, |current| current.max(used));
        *self.slot = Some(next);
        trace!(address = %self.address, nonce, "nonce committed");
    }
}

impl std::fmt::Debug for NonceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceGuard")
            .field("address", &self.address)
            .field("next", &*self.slot)
            .finish()
    }
}
