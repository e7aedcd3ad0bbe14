//! Typed ABI values
//!
//! Every [`Value`] knows its [`TypeDescriptor`]. Numeric payloads, byte
//! lengths and array elements are checked when the value is built, so the
//! encoder never has to truncate or reject anything.

use storm_primitives::{Address, U256};

use super::types::{TypeDescriptor, TypeKind, DEFAULT_BITS};
use super::AbiError;

/// Signed 256-bit integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256 {
    abs: U256,
    negative: bool,
}

impl I256 {
    /// Build from magnitude and sign; negative zero collapses to zero
    pub fn new(abs: U256, negative: bool) -> Self {
        Self { abs, negative: negative && !abs.is_zero() }
    }

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        Self::new(U256::from(value.unsigned_abs()), value < 0)
    }

    /// Absolute value
    pub fn abs(&self) -> U256 {
        self.abs
    }

    /// Sign (true if negative)
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    /// Whether the value lies in `[-2^(bits-1), 2^(bits-1))`
    pub fn fits(&self, bits: usize) -> bool {
        let magnitude_bits = bits - 1;
        if self.negative {
            // -2^(bits-1) is the one magnitude with `bits` significant bits that still fits
            self.abs.bits() <= magnitude_bits || self.abs == U256::one() << magnitude_bits
        } else {
            self.abs.bits() <= magnitude_bits
        }
    }

    /// Two's complement 256-bit word
    pub fn to_twos_complement(&self) -> U256 {
        if self.negative {
            (!self.abs).overflowing_add(U256::one()).0
        } else {
            self.abs
        }
    }

    /// Interpret a 256-bit word as two's complement
    pub fn from_twos_complement(word: U256) -> Self {
        if word.bit(255) {
            Self::new((!word).overflowing_add(U256::one()).0, true)
        } else {
            Self::new(word, false)
        }
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        Self::from_i128(value as i128)
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

/// Unsigned integer of a declared width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uint {
    bits: usize,
    value: U256,
}

impl Uint {
    /// Range-checked `uint<bits>`
    pub fn new(bits: usize, value: U256) -> Result<Self, AbiError> {
        let ty = TypeDescriptor::uint_bits(bits)?;
        if !fits_unsigned(&value, bits) {
            return Err(AbiError::range(ty, format!("{} needs more than {} bits", value, bits)));
        }
        Ok(Self { bits, value })
    }

    /// Declared width
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Payload
    pub fn value(&self) -> U256 {
        self.value
    }
}

/// Signed integer of a declared width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Int {
    bits: usize,
    value: I256,
}

impl Int {
    /// Range-checked `int<bits>`
    pub fn new(bits: usize, value: I256) -> Result<Self, AbiError> {
        let ty = TypeDescriptor::int_bits(bits)?;
        if !value.fits(bits) {
            return Err(AbiError::range(ty, "outside signed range"));
        }
        Ok(Self { bits, value })
    }

    /// Declared width
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Payload
    pub fn value(&self) -> I256 {
        self.value
    }
}

/// Unsigned fixed-point number held as its raw scaled integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ufixed {
    bits: usize,
    scale: Option<usize>,
    raw: U256,
}

impl Ufixed {
    /// Range-checked `ufixed<bits>[x<scale>]`
    pub fn new(bits: usize, scale: Option<usize>, raw: U256) -> Result<Self, AbiError> {
        let ty = TypeDescriptor::try_from(TypeKind::Ufixed { bits, scale })?;
        if !fits_unsigned(&raw, bits) {
            return Err(AbiError::range(ty, "raw value too wide"));
        }
        Ok(Self { bits, scale, raw })
    }

    /// Raw scaled integer
    pub fn raw(&self) -> U256 {
        self.raw
    }
}

/// Signed fixed-point number held as its raw scaled integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fixed {
    bits: usize,
    scale: Option<usize>,
    raw: I256,
}

impl Fixed {
    /// Range-checked `fixed<bits>[x<scale>]`
    pub fn new(bits: usize, scale: Option<usize>, raw: I256) -> Result<Self, AbiError> {
        let ty = TypeDescriptor::try_from(TypeKind::Fixed { bits, scale })?;
        if !raw.fits(bits) {
            return Err(AbiError::range(ty, "raw value outside signed range"));
        }
        Ok(Self { bits, scale, raw })
    }

    /// Raw scaled integer
    pub fn raw(&self) -> I256 {
        self.raw
    }
}

/// `bytes<N>` payload of exactly N bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixedBytes(Vec<u8>);

impl FixedBytes {
    /// Length-checked; 1 to 32 bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, AbiError> {
        let bytes = bytes.into();
        TypeDescriptor::fixed_bytes(bytes.len())?;
        Ok(Self(bytes))
    }

    /// Payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Elements of an array value together with their declared element type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayValue {
    element: TypeDescriptor,
    values: Vec<Value>,
}

impl ArrayValue {
    fn new(element: TypeDescriptor, values: Vec<Value>) -> Result<Self, AbiError> {
        for (index, value) in values.iter().enumerate() {
            let got = value.descriptor();
            if got != element {
                return Err(AbiError::range(
                    format!("{}[]", element),
                    format!("element {} is {}", index, got),
                ));
            }
        }
        Ok(Self { element, values })
    }

    /// Declared element type
    pub fn element(&self) -> &TypeDescriptor {
        &self.element
    }

    /// Elements in order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no elements
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// ABI value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// 20-byte address
    Address(Address),
    /// Unsigned integer
    Uint(Uint),
    /// Signed integer
    Int(Int),
    /// Unsigned fixed-point
    Ufixed(Ufixed),
    /// Signed fixed-point
    Fixed(Fixed),
    /// Fixed-size bytes
    FixedBytes(FixedBytes),
    /// Dynamic bytes
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Fixed-size array
    FixedArray(ArrayValue),
    /// Dynamic array
    Array(ArrayValue),
}

impl Value {
    /// `uint256`
    pub fn uint256(value: impl Into<U256>) -> Self {
        Value::Uint(Uint { bits: DEFAULT_BITS, value: value.into() })
    }

    /// `uint<bits>`
    pub fn uint(bits: usize, value: impl Into<U256>) -> Result<Self, AbiError> {
        Ok(Value::Uint(Uint::new(bits, value.into())?))
    }

    /// `int256`; a magnitude beyond the signed range is rejected
    pub fn int256(value: impl Into<I256>) -> Result<Self, AbiError> {
        Value::int(DEFAULT_BITS, value)
    }

    /// `int<bits>`
    pub fn int(bits: usize, value: impl Into<I256>) -> Result<Self, AbiError> {
        Ok(Value::Int(Int::new(bits, value.into())?))
    }

    /// `bytes<N>` where N is the payload length
    pub fn fixed_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, AbiError> {
        Ok(Value::FixedBytes(FixedBytes::new(bytes)?))
    }

    /// `bytes`
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// `string`
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Fixed array of `values.len()` elements, each of type `element`
    pub fn fixed_array(element: TypeDescriptor, values: Vec<Value>) -> Result<Self, AbiError> {
        TypeDescriptor::fixed_array(element.clone(), values.len())?;
        Ok(Value::FixedArray(ArrayValue::new(element, values)?))
    }

    /// Dynamic array; every element must have type `element`
    pub fn array(element: TypeDescriptor, values: Vec<Value>) -> Result<Self, AbiError> {
        Ok(Value::Array(ArrayValue::new(element, values)?))
    }

    /// Build an array value that must match `ty` exactly, including fixed arity
    pub fn array_of(ty: &TypeDescriptor, values: Vec<Value>) -> Result<Self, AbiError> {
        match ty.kind() {
            TypeKind::FixedArray(element, len) => {
                if values.len() != *len {
                    return Err(AbiError::range(ty, format!("expected {} elements, got {}", len, values.len())));
                }
                Value::fixed_array(element.as_ref().clone(), values)
            }
            TypeKind::Array(element) => Value::array(element.as_ref().clone(), values),
            _ => Err(AbiError::range(ty, "not an array type")),
        }
    }

    /// Type of this value
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            Value::Bool(_) => TypeDescriptor::bool(),
            Value::Address(_) => TypeDescriptor::address(),
            Value::Uint(u) => typed(TypeKind::Uint(u.bits)),
            Value::Int(i) => typed(TypeKind::Int(i.bits)),
            Value::Ufixed(f) => typed(TypeKind::Ufixed { bits: f.bits, scale: f.scale }),
            Value::Fixed(f) => typed(TypeKind::Fixed { bits: f.bits, scale: f.scale }),
            Value::FixedBytes(b) => typed(TypeKind::FixedBytes(b.0.len())),
            Value::Bytes(_) => TypeDescriptor::bytes(),
            Value::String(_) => TypeDescriptor::string(),
            Value::FixedArray(a) => typed(TypeKind::FixedArray(Box::new(a.element.clone()), a.len())),
            Value::Array(a) => TypeDescriptor::array(a.element.clone()),
        }
    }

    /// Canonical type name
    pub fn type_name(&self) -> String {
        self.descriptor().type_name()
    }

    /// Whether this value is encoded in the tail
    pub fn is_dynamic(&self) -> bool {
        match self {
            Value::Bytes(_) | Value::String(_) | Value::Array(_) => true,
            Value::FixedArray(a) => a.element.is_dynamic(),
            _ => false,
        }
    }

    /// Bytes occupied in the head of an enclosing block
    pub fn head_len(&self) -> usize {
        match self {
            Value::FixedArray(a) if !a.element.is_dynamic() => a.element.head_len().saturating_mul(a.len()),
            _ => 32,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Address> for Value {
    fn from(address: Address) -> Self {
        Value::Address(address)
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Value::uint256(value)
    }
}

impl TryFrom<I256> for Value {
    type Error = AbiError;

    fn try_from(value: I256) -> Result<Self, AbiError> {
        Value::int256(value)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<Uint> for Value {
    fn from(u: Uint) -> Self {
        Value::Uint(u)
    }
}

impl From<Int> for Value {
    fn from(i: Int) -> Self {
        Value::Int(i)
    }
}

// Shapes taken from an existing value have already passed validation.
fn typed(kind: TypeKind) -> TypeDescriptor {
    TypeDescriptor::from_validated(kind)
}

pub(crate) fn fits_unsigned(value: &U256, bits: usize) -> bool {
    value.bits() <= bits
}
