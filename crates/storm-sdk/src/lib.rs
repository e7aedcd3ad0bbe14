//! # storm-sdk
//!
//! Client library for Ethereum-style ledgers.
//!
//! ## Features
//!
//! - **ABI**: typed contract values, call encoding and return decoding
//! - **TransactionManager**: nonce assignment, signing, submission with hash
//!   verification, and receipt polling
//! - **BlockingTransactionManager**: the same, for synchronous callers
//! - **Web3Client**: the handful of `eth_*` RPC methods the manager needs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storm_sdk::abi::{Function, TypeDescriptor, Value};
//! use storm_sdk::{Address, Credentials, ManagerConfig, TransactionManager, Web3Client, U256};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ManagerConfig::load("storm.toml")?;
//!     let credentials = Arc::new(config.credentials()?);
//!     let client = Web3Client::connect(&config.rpc_url);
//!     let manager = TransactionManager::new(client, credentials, config);
//!
//!     let token = Address::from_hex("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")?;
//!     let owner = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d")?;
//!
//!     // Read-only call
//!     let balance_of = Function::new("balanceOf", vec![Value::Address(owner)], vec![TypeDescriptor::uint()]);
//!     let balance = manager.call(&balance_of, token).await?;
//!     println!("Balance: {:?}", balance);
//!
//!     // State-changing call, confirmed by receipt
//!     let transfer = Function::new(
//!         "transfer",
//!         vec![Value::Address(owner), Value::uint256(1000u64)],
//!         vec![TypeDescriptor::bool()],
//!     );
//!     let receipt = manager.execute(&transfer, token, U256::zero()).await?;
//!     println!("Mined in block {:?}", receipt.block_number);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
pub mod blocking;
mod client;
pub mod config;
mod credentials;
mod error;
pub mod nonce;
pub mod receipt;
mod transport;
mod tx_manager;
pub mod types;

// Re-export main types
pub use abi::AbiError;
pub use blocking::BlockingTransactionManager;
pub use client::Web3Client;
pub use config::{ManagerConfig, TimeoutNoncePolicy};
pub use credentials::Credentials;
pub use error::SdkError;
pub use nonce::{NonceGuard, NonceTracker};
pub use receipt::{poll_for_receipt, NoOpReceiptProcessor, PollingReceiptProcessor, ReceiptProcessor};
pub use transport::{MockTransport, RecordedCall};
pub use tx_manager::TransactionManager;
pub use types::{BlockId, CallRequest, PendingTransaction, TransactionReceipt, TransactionRequest};

/// Re-export Transport trait for custom implementations
pub use transport::Transport;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export primitives for convenience
pub use storm_primitives::{Address, H256, U256};
pub use storm_types::{RawTransaction, SignedTransaction};
