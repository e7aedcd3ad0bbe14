//! Contract ABI codec
//!
//! This module provides functionality for:
//! - Resolving canonical type names
//! - Building range-checked typed values
//! - Encoding function calls and decoding return data
//!
//! # Example
//!
//! ```rust
//! use storm_sdk::abi::{decode, Function, TypeDescriptor, Value};
//! use storm_primitives::Address;
//!
//! let call = Function::new(
//!     "transfer",
//!     vec![Value::Address(Address::ZERO), Value::uint256(1000u64)],
//!     vec![TypeDescriptor::bool()],
//! )
//! .encode();
//! assert_eq!(call.selector, [0xa9, 0x05, 0x9c, 0xbb]);
//!
//! let return_data = [0u8; 32];
//! let balance = decode(&[TypeDescriptor::uint()], &return_data).unwrap();
//! assert_eq!(balance, vec![Value::uint256(0u64)]);
//! ```

mod decode;
mod encode;
mod error;
mod function;
mod types;
mod utils;
mod value;

pub use decode::{decode, decode_single};
pub use encode::{encode, encode_function_call, encode_single, function_selector};
pub use error::AbiError;
pub use function::{EncodedCall, Function};
pub use types::{TypeDescriptor, TypeKind, DEFAULT_BITS};
pub use utils::{type_map, type_map_nested, ArrayShape, RawValue};
pub use value::{ArrayValue, Fixed, FixedBytes, Int, Ufixed, Uint, Value, I256};
