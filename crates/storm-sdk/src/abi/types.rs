//! ABI type descriptors
//!
//! A [`TypeDescriptor`] can only be obtained through its validating
//! constructors or [`TypeDescriptor::parse`], so every descriptor in
//! circulation names a real ABI type. Width and length mistakes surface
//! here, not when a value is later encoded.

use std::fmt;
use std::str::FromStr;

use super::AbiError;

/// Default bit width for unqualified `uint`, `int`, `ufixed` and `fixed`
pub const DEFAULT_BITS: usize = 256;

const MAX_FIXED_SCALE: usize = 80;

/// Structural shape of an ABI type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// `bool`
    Bool,
    /// `address`
    Address,
    /// `uint<bits>`
    Uint(usize),
    /// `int<bits>`
    Int(usize),
    /// `ufixed<bits>` or `ufixed<bits>x<scale>`
    Ufixed {
        /// Total width
        bits: usize,
        /// Decimal places, when specified
        scale: Option<usize>,
    },
    /// `fixed<bits>` or `fixed<bits>x<scale>`
    Fixed {
        /// Total width
        bits: usize,
        /// Decimal places, when specified
        scale: Option<usize>,
    },
    /// `bytes<len>`, 1 to 32
    FixedBytes(usize),
    /// `bytes`
    Bytes,
    /// `string`
    String,
    /// `<element>[<len>]`
    FixedArray(Box<TypeDescriptor>, usize),
    /// `<element>[]`
    Array(Box<TypeDescriptor>),
}

/// A validated ABI type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    kind: TypeKind,
}

impl TypeDescriptor {
    /// `bool`
    pub fn bool() -> Self {
        Self { kind: TypeKind::Bool }
    }

    /// `address`
    pub fn address() -> Self {
        Self { kind: TypeKind::Address }
    }

    /// `string`
    pub fn string() -> Self {
        Self { kind: TypeKind::String }
    }

    /// `bytes`
    pub fn bytes() -> Self {
        Self { kind: TypeKind::Bytes }
    }

    /// `uint256`
    pub fn uint() -> Self {
        Self { kind: TypeKind::Uint(DEFAULT_BITS) }
    }

    /// `uint<bits>`
    pub fn uint_bits(bits: usize) -> Result<Self, AbiError> {
        check_bits("uint", bits)?;
        Ok(Self { kind: TypeKind::Uint(bits) })
    }

    /// `int256`
    pub fn int() -> Self {
        Self { kind: TypeKind::Int(DEFAULT_BITS) }
    }

    /// `int<bits>`
    pub fn int_bits(bits: usize) -> Result<Self, AbiError> {
        check_bits("int", bits)?;
        Ok(Self { kind: TypeKind::Int(bits) })
    }

    /// `ufixed256`
    pub fn ufixed() -> Self {
        Self { kind: TypeKind::Ufixed { bits: DEFAULT_BITS, scale: None } }
    }

    /// `ufixed<bits>x<scale>`
    pub fn ufixed_with(bits: usize, scale: usize) -> Result<Self, AbiError> {
        check_bits("ufixed", bits)?;
        check_scale("ufixed", scale)?;
        Ok(Self { kind: TypeKind::Ufixed { bits, scale: Some(scale) } })
    }

    /// `fixed256`
    pub fn fixed() -> Self {
        Self { kind: TypeKind::Fixed { bits: DEFAULT_BITS, scale: None } }
    }

    /// `fixed<bits>x<scale>`
    pub fn fixed_with(bits: usize, scale: usize) -> Result<Self, AbiError> {
        check_bits("fixed", bits)?;
        check_scale("fixed", scale)?;
        Ok(Self { kind: TypeKind::Fixed { bits, scale: Some(scale) } })
    }

    /// `bytes<len>`
    pub fn fixed_bytes(len: usize) -> Result<Self, AbiError> {
        if !(1..=32).contains(&len) {
            return Err(AbiError::TypeResolution(format!("bytes{} (length must be 1..=32)", len)));
        }
        Ok(Self { kind: TypeKind::FixedBytes(len) })
    }

    /// `<element>[<len>]`; the length is required since it cannot be inferred from values
    pub fn fixed_array(element: TypeDescriptor, len: usize) -> Result<Self, AbiError> {
        if len == 0 {
            return Err(AbiError::TypeResolution(format!("{}[0] (zero-length fixed array)", element)));
        }
        // every element takes at least one word, so the whole encoding must be addressable
        if element.head_len().checked_mul(len).is_none() {
            return Err(AbiError::TypeResolution(format!("{}[{}] (encoded size overflows)", element, len)));
        }
        Ok(Self { kind: TypeKind::FixedArray(Box::new(element), len) })
    }

    /// `<element>[]`
    pub fn array(element: TypeDescriptor) -> Self {
        Self { kind: TypeKind::Array(Box::new(element)) }
    }

    /// Parse a canonical type name such as `uint`, `bytes32`, `fixed128x18` or `string[][3]`
    pub fn parse(name: &str) -> Result<Self, AbiError> {
        let name = name.trim();
        if let Some(inner) = name.strip_suffix(']') {
            let open = inner
                .rfind('[')
                .ok_or_else(|| AbiError::TypeResolution(format!("unbalanced brackets in {:?}", name)))?;
            let element = Self::parse(&inner[..open])?;
            let len = &inner[open + 1..];
            return if len.is_empty() {
                Ok(Self::array(element))
            } else {
                Self::fixed_array(element, parse_number(name, len)?)
            };
        }

        match name {
            "bool" => return Ok(Self::bool()),
            "address" => return Ok(Self::address()),
            "string" => return Ok(Self::string()),
            "bytes" => return Ok(Self::bytes()),
            "uint" => return Ok(Self::uint()),
            "int" => return Ok(Self::int()),
            "ufixed" => return Ok(Self::ufixed()),
            "fixed" => return Ok(Self::fixed()),
            _ => {}
        }

        if let Some(rest) = name.strip_prefix("uint") {
            return Self::uint_bits(parse_number(name, rest)?);
        }
        if let Some(rest) = name.strip_prefix("int") {
            return Self::int_bits(parse_number(name, rest)?);
        }
        if let Some(rest) = name.strip_prefix("bytes") {
            return Self::fixed_bytes(parse_number(name, rest)?);
        }
        if let Some(rest) = name.strip_prefix("ufixed") {
            let (bits, scale) = parse_fixed_suffix(name, rest)?;
            return match scale {
                Some(scale) => Self::ufixed_with(bits, scale),
                None => {
                    check_bits("ufixed", bits)?;
                    Ok(Self { kind: TypeKind::Ufixed { bits, scale: None } })
                }
            };
        }
        if let Some(rest) = name.strip_prefix("fixed") {
            let (bits, scale) = parse_fixed_suffix(name, rest)?;
            return match scale {
                Some(scale) => Self::fixed_with(bits, scale),
                None => {
                    check_bits("fixed", bits)?;
                    Ok(Self { kind: TypeKind::Fixed { bits, scale: None } })
                }
            };
        }

        Err(AbiError::TypeResolution(format!("unknown type {:?}", name)))
    }

    pub(crate) fn from_validated(kind: TypeKind) -> Self {
        Self { kind }
    }

    /// Structural shape
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Canonical name, as used in function signatures
    pub fn type_name(&self) -> String {
        self.to_string()
    }

    /// Bit width of numeric kinds
    pub fn bit_width(&self) -> Option<usize> {
        match self.kind {
            TypeKind::Uint(bits) | TypeKind::Int(bits) => Some(bits),
            TypeKind::Ufixed { bits, .. } | TypeKind::Fixed { bits, .. } => Some(bits),
            _ => None,
        }
    }

    /// Decimal scale of fixed-point kinds
    pub fn scale(&self) -> Option<usize> {
        match self.kind {
            TypeKind::Ufixed { scale, .. } | TypeKind::Fixed { scale, .. } => scale,
            _ => None,
        }
    }

    /// Element type of array kinds
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match &self.kind {
            TypeKind::FixedArray(element, _) | TypeKind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Declared length of fixed arrays; `None` for dynamic arrays and scalars
    pub fn array_length(&self) -> Option<usize> {
        match self.kind {
            TypeKind::FixedArray(_, len) => Some(len),
            _ => None,
        }
    }

    /// Whether values of this type are encoded in the tail
    pub fn is_dynamic(&self) -> bool {
        match &self.kind {
            TypeKind::Bytes | TypeKind::String | TypeKind::Array(_) => true,
            TypeKind::FixedArray(element, _) => element.is_dynamic(),
            _ => false,
        }
    }

    /// Bytes occupied in the head of an enclosing block
    pub fn head_len(&self) -> usize {
        match &self.kind {
            // bounded at construction by `fixed_array`
            TypeKind::FixedArray(element, len) if !element.is_dynamic() => element.head_len().saturating_mul(*len),
            _ => 32,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Bool => f.write_str("bool"),
            TypeKind::Address => f.write_str("address"),
            TypeKind::Uint(bits) => write!(f, "uint{}", bits),
            TypeKind::Int(bits) => write!(f, "int{}", bits),
            TypeKind::Ufixed { bits, scale: None } => write!(f, "ufixed{}", bits),
            TypeKind::Ufixed { bits, scale: Some(scale) } => write!(f, "ufixed{}x{}", bits, scale),
            TypeKind::Fixed { bits, scale: None } => write!(f, "fixed{}", bits),
            TypeKind::Fixed { bits, scale: Some(scale) } => write!(f, "fixed{}x{}", bits, scale),
            TypeKind::FixedBytes(len) => write!(f, "bytes{}", len),
            TypeKind::Bytes => f.write_str("bytes"),
            TypeKind::String => f.write_str("string"),
            TypeKind::FixedArray(element, len) => write!(f, "{}[{}]", element, len),
            TypeKind::Array(element) => write!(f, "{}[]", element),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<TypeKind> for TypeDescriptor {
    type Error = AbiError;

    /// Validate a hand-built shape
    fn try_from(kind: TypeKind) -> Result<Self, Self::Error> {
        match kind {
            TypeKind::Uint(bits) => Self::uint_bits(bits),
            TypeKind::Int(bits) => Self::int_bits(bits),
            TypeKind::Ufixed { bits, scale: Some(scale) } => Self::ufixed_with(bits, scale),
            TypeKind::Fixed { bits, scale: Some(scale) } => Self::fixed_with(bits, scale),
            TypeKind::Ufixed { bits, scale: None } | TypeKind::Fixed { bits, scale: None } => {
                check_bits("fixed", bits)?;
                Ok(Self { kind })
            }
            TypeKind::FixedBytes(len) => Self::fixed_bytes(len),
            TypeKind::FixedArray(element, len) => Self::fixed_array(*element, len),
            other => Ok(Self { kind: other }),
        }
    }
}

fn check_bits(prefix: &str, bits: usize) -> Result<(), AbiError> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::TypeResolution(format!(
            "{}{} (width must be a multiple of 8 in 8..=256)",
            prefix, bits
        )));
    }
    Ok(())
}

fn check_scale(prefix: &str, scale: usize) -> Result<(), AbiError> {
    if scale == 0 || scale > MAX_FIXED_SCALE {
        return Err(AbiError::TypeResolution(format!(
            "{} scale {} (must be 1..={})",
            prefix, scale, MAX_FIXED_SCALE
        )));
    }
    Ok(())
}

fn parse_number(name: &str, digits: &str) -> Result<usize, AbiError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AbiError::TypeResolution(format!("unknown type {:?}", name)));
    }
    digits
        .parse()
        .map_err(|_| AbiError::TypeResolution(format!("number too large in {:?}", name)))
}

fn parse_fixed_suffix(name: &str, rest: &str) -> Result<(usize, Option<usize>), AbiError> {
    match rest.split_once('x') {
        Some((bits, scale)) => Ok((parse_number(name, bits)?, Some(parse_number(name, scale)?))),
        None => Ok((parse_number(name, rest)?, None)),
    }
}
