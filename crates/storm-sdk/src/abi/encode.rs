//! ABI encoding

use storm_primitives::U256;

use super::value::Value;

/// Encode values as a parameter block (head followed by tail)
pub fn encode(values: &[Value]) -> Vec<u8> {
    encode_block(values)
}

/// Encode a single value as a one-element parameter block
pub fn encode_single(value: &Value) -> Vec<u8> {
    encode_block(std::slice::from_ref(value))
}

/// Encode function call (selector + params)
pub fn encode_function_call(selector: [u8; 4], values: &[Value]) -> Vec<u8> {
    let mut result = selector.to_vec();
    result.extend(encode_block(values));
    result
}

/// Compute function selector (first 4 bytes of keccak256(signature))
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = storm_crypto::keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Offsets in the head are relative to the start of this block
fn encode_block(values: &[Value]) -> Vec<u8> {
    let head_size = values.iter().map(Value::head_len).sum::<usize>();

    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for value in values {
        if value.is_dynamic() {
            let offset = head_size + tail.len();
            head.extend(encode_u256(&U256::from(offset)));
            tail.extend(encode_value(value));
        } else {
            head.extend(encode_value(value));
        }
    }

    head.extend(tail);
    head
}

fn encode_value(value: &Value) -> Vec<u8> {
    match value {
        Value::Bool(b) => encode_u256(&U256::from(*b as u8)),
        Value::Address(addr) => {
            let mut buf = [0u8; 32];
            buf[12..32].copy_from_slice(addr.as_bytes());
            buf.to_vec()
        }
        Value::Uint(u) => encode_u256(&u.value()),
        Value::Int(i) => encode_u256(&i.value().to_twos_complement()),
        Value::Ufixed(f) => encode_u256(&f.raw()),
        Value::Fixed(f) => encode_u256(&f.raw().to_twos_complement()),
        Value::FixedBytes(data) => {
            let mut buf = [0u8; 32];
            buf[..data.as_bytes().len()].copy_from_slice(data.as_bytes());
            buf.to_vec()
        }
        Value::Bytes(data) => encode_bytes(data),
        Value::String(s) => encode_bytes(s.as_bytes()),
        Value::FixedArray(array) => encode_block(array.values()),
        Value::Array(array) => {
            let mut result = encode_u256(&U256::from(array.len()));
            result.extend(encode_block(array.values()));
            result
        }
    }
}

/// Convert U256 to 32-byte big-endian word
fn encode_u256(value: &U256) -> Vec<u8> {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes.to_vec()
}

/// Length word followed by the payload, right-padded to a word boundary
fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut result = encode_u256(&U256::from(data.len()));

    let padded_len = data.len().div_ceil(32) * 32;
    let mut padded = vec![0u8; padded_len];
    padded[..data.len()].copy_from_slice(data);
    result.extend(padded);

    result
}
