//! Contract function framing

use bytes::Bytes;

use super::decode::decode;
use super::encode::{encode_function_call, function_selector};
use super::types::TypeDescriptor;
use super::value::Value;
use super::AbiError;

/// A logical contract call: name, typed arguments and expected return types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    name: String,
    inputs: Vec<Value>,
    outputs: Vec<TypeDescriptor>,
}

/// Selector plus full calldata (selector followed by the parameter block)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    /// First 4 bytes of keccak256 of the signature
    pub selector: [u8; 4],
    /// Bytes to place in a transaction's `data` field
    pub calldata: Bytes,
}

impl EncodedCall {
    /// `0x`-prefixed hex of the calldata
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.calldata))
    }
}

impl Function {
    /// New function call
    pub fn new(name: impl Into<String>, inputs: Vec<Value>, outputs: Vec<TypeDescriptor>) -> Self {
        Self { name: name.into(), inputs, outputs }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments
    pub fn inputs(&self) -> &[Value] {
        &self.inputs
    }

    /// Expected return types
    pub fn outputs(&self) -> &[TypeDescriptor] {
        &self.outputs
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(Value::type_name).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// 4-byte selector
    pub fn selector(&self) -> [u8; 4] {
        function_selector(&self.signature())
    }

    /// Selector plus ABI-encoded arguments
    pub fn encode(&self) -> EncodedCall {
        let selector = self.selector();
        let calldata = encode_function_call(selector, &self.inputs);
        EncodedCall { selector, calldata: Bytes::from(calldata) }
    }

    /// Decode return data against the declared outputs.
    ///
    /// Empty data is only valid for a function without outputs. Nodes also
    /// answer `0x` for accounts without code and for reverts without a
    /// reason; with declared outputs that is a [`AbiError::Decode`].
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Value>, AbiError> {
        if self.outputs.is_empty() {
            return Ok(Vec::new());
        }
        decode(&self.outputs, data)
    }
}
