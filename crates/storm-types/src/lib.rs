//! # storm-types
//!
//! Transaction types for the storm client.
//!
//! - [`RawTransaction`] - unsigned legacy transaction
//! - [`SignedTransaction`] - immutable signed transaction with its canonical hash

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod transaction;

pub use error::TxCodecError;
pub use transaction::{RawTransaction, SignedTransaction};
