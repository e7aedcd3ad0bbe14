//! Lifting plain Rust values into typed ABI values

use storm_primitives::{Address, U256};

use super::types::{TypeDescriptor, TypeKind};
use super::value::{Fixed, FixedBytes, Int, Ufixed, Uint, Value, I256};
use super::AbiError;

/// An untyped scalar awaiting a target [`TypeDescriptor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Boolean
    Bool(bool),
    /// Non-negative integer
    Uint(U256),
    /// Signed integer
    Int(I256),
    /// Address
    Address(Address),
    /// Byte string
    Bytes(Vec<u8>),
    /// Text
    String(String),
}

impl RawValue {
    fn kind_name(&self) -> &'static str {
        match self {
            RawValue::Bool(_) => "bool",
            RawValue::Uint(_) => "unsigned integer",
            RawValue::Int(_) => "signed integer",
            RawValue::Address(_) => "address",
            RawValue::Bytes(_) => "bytes",
            RawValue::String(_) => "string",
        }
    }
}

macro_rules! raw_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for RawValue {
            fn from(value: $t) -> Self {
                RawValue::Uint(U256::from(value))
            }
        })*
    };
}

raw_from_unsigned!(u8, u16, u32, u64, u128, U256);

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(I256::from(value))
    }
}

impl From<I256> for RawValue {
    fn from(value: I256) -> Self {
        RawValue::Int(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<Address> for RawValue {
    fn from(value: Address) -> Self {
        RawValue::Address(value)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(value: Vec<u8>) -> Self {
        RawValue::Bytes(value)
    }
}

impl From<&[u8]> for RawValue {
    fn from(value: &[u8]) -> Self {
        RawValue::Bytes(value.to_vec())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_owned())
    }
}

impl Value {
    /// Wrap a raw scalar as a value of type `ty`
    pub fn from_raw(ty: &TypeDescriptor, raw: RawValue) -> Result<Value, AbiError> {
        let mismatch = |raw: &RawValue| AbiError::range(ty, format!("cannot hold a {}", raw.kind_name()));

        match (ty.kind(), raw) {
            (TypeKind::Bool, RawValue::Bool(b)) => Ok(Value::Bool(b)),
            (TypeKind::Address, RawValue::Address(a)) => Ok(Value::Address(a)),
            (TypeKind::Address, RawValue::Uint(n)) => {
                if n.bits() > 160 {
                    return Err(AbiError::range(ty, "integer wider than 160 bits"));
                }
                let mut word = [0u8; 32];
                n.to_big_endian(&mut word);
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&word[12..]);
                Ok(Value::Address(Address::from_bytes(addr)))
            }
            (TypeKind::Uint(bits), RawValue::Uint(n)) => Ok(Value::Uint(Uint::new(*bits, n)?)),
            (TypeKind::Uint(bits), RawValue::Int(i)) => {
                if i.is_negative() {
                    return Err(AbiError::range(ty, "negative value"));
                }
                Ok(Value::Uint(Uint::new(*bits, i.abs())?))
            }
            (TypeKind::Int(bits), RawValue::Int(i)) => Ok(Value::Int(Int::new(*bits, i)?)),
            (TypeKind::Int(bits), RawValue::Uint(n)) => Ok(Value::Int(Int::new(*bits, I256::new(n, false))?)),
            (TypeKind::Ufixed { bits, scale }, RawValue::Uint(n)) => {
                Ok(Value::Ufixed(Ufixed::new(*bits, *scale, n)?))
            }
            (TypeKind::Fixed { bits, scale }, RawValue::Int(i)) => {
                Ok(Value::Fixed(Fixed::new(*bits, *scale, i)?))
            }
            (TypeKind::Fixed { bits, scale }, RawValue::Uint(n)) => {
                Ok(Value::Fixed(Fixed::new(*bits, *scale, I256::new(n, false))?))
            }
            (TypeKind::FixedBytes(len), RawValue::Bytes(b)) => {
                if b.len() != *len {
                    return Err(AbiError::range(ty, format!("expected {} bytes, got {}", len, b.len())));
                }
                Ok(Value::FixedBytes(FixedBytes::new(b)?))
            }
            (TypeKind::Bytes, RawValue::Bytes(b)) => Ok(Value::Bytes(b)),
            (TypeKind::String, RawValue::String(s)) => Ok(Value::String(s)),
            (TypeKind::FixedArray(..) | TypeKind::Array(_), _) => {
                Err(AbiError::range(ty, "array targets take nested input, see type_map_nested"))
            }
            (_, raw) => Err(mismatch(&raw)),
        }
    }
}

/// Whether [`type_map_nested`] builds fixed or dynamic arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayShape {
    /// Fixed arrays; every inner sequence must have exactly this many items
    Fixed(usize),
    /// Dynamic arrays of any length
    Dynamic,
}

/// Wrap each raw scalar as a value of `target`, preserving order
pub fn type_map<I>(input: I, target: &TypeDescriptor) -> Result<Vec<Value>, AbiError>
where
    I: IntoIterator,
    I::Item: Into<RawValue>,
{
    input.into_iter().map(|raw| Value::from_raw(target, raw.into())).collect()
}

/// Wrap each inner sequence as an array of `element` values
pub fn type_map_nested<I, J>(input: I, shape: ArrayShape, element: &TypeDescriptor) -> Result<Vec<Value>, AbiError>
where
    I: IntoIterator<Item = J>,
    J: IntoIterator,
    J::Item: Into<RawValue>,
{
    let array_ty = match shape {
        ArrayShape::Fixed(len) => TypeDescriptor::fixed_array(element.clone(), len)?,
        ArrayShape::Dynamic => TypeDescriptor::array(element.clone()),
    };

    input
        .into_iter()
        .map(|inner| Value::array_of(&array_ty, type_map(inner, element)?))
        .collect()
}
