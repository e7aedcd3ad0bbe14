//! ABI decoding
//!
//! Every read is bounds-checked and every offset is resolved against the
//! start of the block that contains it, so hostile return data produces an
//! [`AbiError::Decode`] rather than a panic or an oversized allocation.

use std::iter;

use storm_primitives::{Address, U256};

use super::types::{TypeDescriptor, TypeKind};
use super::value::{Fixed, FixedBytes, Int, Ufixed, Uint, Value, I256};
use super::AbiError;

/// Decode a parameter block into values of the given types
pub fn decode(types: &[TypeDescriptor], data: &[u8]) -> Result<Vec<Value>, AbiError> {
    decode_block(types.iter(), data, 0)
}

/// Decode a single value encoded as a one-element parameter block
pub fn decode_single(ty: &TypeDescriptor, data: &[u8]) -> Result<Value, AbiError> {
    let mut values = decode_block(iter::once(ty), data, 0)?;
    values.pop().ok_or_else(|| AbiError::decode(0, "no value decoded"))
}

fn decode_block<'a>(
    types: impl Iterator<Item = &'a TypeDescriptor>,
    data: &[u8],
    base: usize,
) -> Result<Vec<Value>, AbiError> {
    let mut values = Vec::new();
    let mut cursor = base;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let start = base
                .checked_add(offset)
                .filter(|start| *start < data.len())
                .ok_or_else(|| AbiError::decode(cursor, format!("offset {} points outside the buffer", offset)))?;
            values.push(decode_at(ty, data, start)?);
            cursor += 32;
        } else {
            values.push(decode_at(ty, data, cursor)?);
            cursor += ty.head_len();
        }
    }

    Ok(values)
}

/// Decode the value of type `ty` whose encoding begins at `pos`
fn decode_at(ty: &TypeDescriptor, data: &[u8], pos: usize) -> Result<Value, AbiError> {
    match ty.kind() {
        TypeKind::Bool => {
            let word = read_u256(data, pos)?;
            if word > U256::one() {
                return Err(AbiError::decode(pos, "bool word is neither 0 nor 1"));
            }
            Ok(Value::Bool(!word.is_zero()))
        }
        TypeKind::Address => {
            let word = read_word(data, pos)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::decode(pos, "address word has dirty high bytes"));
            }
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok(Value::Address(Address::from_bytes(addr)))
        }
        TypeKind::Uint(bits) => {
            let word = read_u256(data, pos)?;
            Uint::new(*bits, word)
                .map(Value::Uint)
                .map_err(|_| AbiError::decode(pos, format!("value exceeds uint{}", bits)))
        }
        TypeKind::Int(bits) => {
            let word = I256::from_twos_complement(read_u256(data, pos)?);
            Int::new(*bits, word)
                .map(Value::Int)
                .map_err(|_| AbiError::decode(pos, format!("value is not sign-extended int{}", bits)))
        }
        TypeKind::Ufixed { bits, scale } => {
            let word = read_u256(data, pos)?;
            Ufixed::new(*bits, *scale, word)
                .map(Value::Ufixed)
                .map_err(|_| AbiError::decode(pos, format!("value exceeds {}", ty)))
        }
        TypeKind::Fixed { bits, scale } => {
            let word = I256::from_twos_complement(read_u256(data, pos)?);
            Fixed::new(*bits, *scale, word)
                .map(Value::Fixed)
                .map_err(|_| AbiError::decode(pos, format!("value is not sign-extended {}", ty)))
        }
        TypeKind::FixedBytes(len) => {
            let word = read_word(data, pos)?;
            if word[*len..].iter().any(|b| *b != 0) {
                return Err(AbiError::decode(pos, format!("bytes{} has non-zero padding", len)));
            }
            let bytes = FixedBytes::new(word[..*len].to_vec()).map_err(|e| AbiError::decode(pos, e.to_string()))?;
            Ok(Value::FixedBytes(bytes))
        }
        TypeKind::Bytes => Ok(Value::Bytes(read_payload(data, pos)?.to_vec())),
        TypeKind::String => {
            let payload = read_payload(data, pos)?;
            let s = std::str::from_utf8(payload)
                .map_err(|e| AbiError::decode(pos + 32, format!("invalid UTF-8: {}", e)))?;
            Ok(Value::String(s.to_owned()))
        }
        TypeKind::FixedArray(element, len) => {
            let values = decode_block(iter::repeat(element.as_ref()).take(*len), data, pos)?;
            array_value(ty, values, pos)
        }
        TypeKind::Array(element) => {
            let len = read_usize(data, pos)?;
            let body = pos + 32;
            // every element occupies at least one head slot
            let available = data.len().saturating_sub(body) / element.head_len();
            if len > available {
                return Err(AbiError::decode(
                    pos,
                    format!("array length {} exceeds remaining buffer ({} elements)", len, available),
                ));
            }
            let values = decode_block(iter::repeat(element.as_ref()).take(len), data, body)?;
            array_value(ty, values, pos)
        }
    }
}

fn array_value(ty: &TypeDescriptor, values: Vec<Value>, pos: usize) -> Result<Value, AbiError> {
    Value::array_of(ty, values).map_err(|e| AbiError::decode(pos, e.to_string()))
}

fn read_word(data: &[u8], pos: usize) -> Result<&[u8], AbiError> {
    pos.checked_add(32)
        .and_then(|end| data.get(pos..end))
        .ok_or_else(|| AbiError::decode(pos, format!("need 32 bytes, buffer is {} bytes", data.len())))
}

fn read_u256(data: &[u8], pos: usize) -> Result<U256, AbiError> {
    Ok(U256::from_big_endian(read_word(data, pos)?))
}

/// Offsets and lengths; anything wider than the buffer could address is rejected
fn read_usize(data: &[u8], pos: usize) -> Result<usize, AbiError> {
    let word = read_u256(data, pos)?;
    if word > U256::from(data.len()) {
        return Err(AbiError::decode(pos, format!("{} exceeds buffer length {}", word, data.len())));
    }
    Ok(word.as_usize())
}

/// Length-prefixed payload of `bytes` or `string`
fn read_payload(data: &[u8], pos: usize) -> Result<&[u8], AbiError> {
    let len = read_usize(data, pos)?;
    let start = pos + 32;
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| AbiError::decode(pos, format!("declared length {} exceeds remaining buffer", len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode;

    fn word(hex_str: &str) -> Vec<u8> {
        let raw = hex::decode(hex_str).unwrap();
        let mut out = vec![0u8; 32 - raw.len()];
        out.extend(raw);
        out
    }

    fn ty(name: &str) -> TypeDescriptor {
        TypeDescriptor::parse(name).unwrap()
    }

    #[test]
    fn test_decode_uint() {
        let values = decode(&[ty("uint256")], &word("64")).unwrap();
        assert_eq!(values, vec![Value::uint256(100u64)]);
    }

    #[test]
    fn test_decode_negative_int() {
        let values = decode(&[ty("int16")], &[0xffu8; 32]).unwrap();
        assert_eq!(values, vec![Value::int(16, -1i64).unwrap()]);
    }

    #[test]
    fn test_decode_rejects_non_canonical_padding() {
        let mut dirty = word("01");
        dirty[0] = 1;
        assert!(matches!(decode(&[ty("bool")], &dirty), Err(AbiError::Decode { .. })));
        assert!(decode(&[ty("address")], &dirty).is_err());
        assert!(decode(&[ty("uint8")], &word("0100")).is_err());
        // positive value with the sign bit of int8 set but not extended
        assert!(decode(&[ty("int8")], &word("80")).is_err());
        assert!(decode(&[ty("bytes1")], &[vec![0xaa, 0x01], vec![0u8; 30]].concat()).is_err());
    }

    #[test]
    fn test_decode_string() {
        let data = encode(&[Value::string("hello")]);
        assert_eq!(decode(&[ty("string")], &data).unwrap(), vec![Value::string("hello")]);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let data = [word("20"), word("02"), {
            let mut w = vec![0xff, 0xfe];
            w.resize(32, 0);
            w
        }]
        .concat();
        assert!(matches!(decode(&[ty("string")], &data), Err(AbiError::Decode { .. })));
    }

    #[test]
    fn test_truncated_dynamic_payload() {
        let data = encode(&[Value::bytes(vec![7u8; 40])]);
        for cut in [16, 32, 48, 64, 100] {
            assert!(
                matches!(decode(&[ty("bytes")], &data[..cut]), Err(AbiError::Decode { .. })),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_offset_outside_buffer() {
        let data = [word("ff"), word("00")].concat();
        assert!(decode(&[ty("string")], &data).is_err());

        let huge = [vec![0xffu8; 32], word("00")].concat();
        assert!(decode(&[ty("bytes")], &huge).is_err());
    }

    #[test]
    fn test_array_length_beyond_buffer() {
        // claims 2^20 elements with two words of data
        let data = [word("20"), word("100000"), word("01"), word("02")].concat();
        assert!(matches!(decode(&[ty("uint256[]")], &data), Err(AbiError::Decode { .. })));
    }

    #[test]
    fn test_huge_static_element_against_short_buffer() {
        // largest element size that still fits in usize
        let huge = 1usize << (usize::BITS - 6);
        let data = [word("20"), word("01")].concat();
        let result = decode(&[ty(&format!("uint256[{}][]", huge))], &data);
        assert!(matches!(result, Err(AbiError::Decode { .. })));
    }

    #[test]
    fn test_nested_dynamic_offsets_are_block_relative() {
        let inner = |items: &[&str]| {
            Value::array(TypeDescriptor::string(), items.iter().map(|s| Value::string(*s)).collect()).unwrap()
        };
        let value = Value::fixed_array(
            TypeDescriptor::array(TypeDescriptor::string()),
            vec![inner(&["a", "bc"]), inner(&[])],
        )
        .unwrap();

        let data = encode(&[Value::uint256(9u64), value.clone()]);
        let decoded = decode(&[ty("uint256"), ty("string[][2]")], &data).unwrap();
        assert_eq!(decoded, vec![Value::uint256(9u64), value]);
    }

    #[test]
    fn test_empty_input() {
        assert!(decode(&[], &[]).unwrap().is_empty());
        assert!(decode(&[ty("uint256")], &[]).is_err());
    }

    #[test]
    fn test_decode_single() {
        let v = Value::Bool(true);
        assert_eq!(decode_single(&ty("bool"), &encode(&[v.clone()])).unwrap(), v);
    }
}
