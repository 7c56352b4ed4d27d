//! ABI decoder implementation using alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use anyhow::{Context, Result};

use crate::domain::abi::{AbiDecoder, AbiRegistry, FunctionSignature};

use super::builtin::builtin_registry;

/// ABI decoder implementation using alloy-dyn-abi
pub struct AlloyAbiDecoder {
    registry: AbiRegistry,
}

impl AlloyAbiDecoder {
    /// Create a new decoder with the given registry
    pub fn new(registry: AbiRegistry) -> Self {
        Self { registry }
    }

    /// Create a decoder that knows the built-in router functions
    pub fn with_builtin() -> Self {
        Self::new(builtin_registry())
    }

    /// Get the underlying registry
    pub fn registry(&self) -> &AbiRegistry {
        &self.registry
    }

    /// Add functions from scanned ABI files (existing selectors win)
    pub fn extend(&mut self, registry: AbiRegistry) {
        self.registry.merge(registry);
    }
}

impl Default for AlloyAbiDecoder {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl AbiDecoder for AlloyAbiDecoder {
    fn decode_params(&self, types: &[&str], data: &[u8]) -> Result<Vec<DynSolValue>> {
        let types: Vec<DynSolType> = types
            .iter()
            .map(|kind| {
                kind.parse::<DynSolType>()
                    .with_context(|| format!("Failed to parse type '{}'", kind))
            })
            .collect::<Result<Vec<_>>>()?;

        if types.is_empty() {
            return Ok(Vec::new());
        }

        // Parameters are encoded as a sequence, not as a single tuple value
        let decoded = DynSolType::Tuple(types)
            .abi_decode_params(data)
            .context("Failed to decode parameters")?;

        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            other => Ok(vec![other]),
        }
    }

    fn lookup(&self, selector: [u8; 4]) -> Option<&FunctionSignature> {
        self.registry.lookup(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn test_decode_static_params() {
        let decoder = AlloyAbiDecoder::default();
        let data = DynSolValue::Tuple(vec![
            DynSolValue::Address(Address::repeat_byte(0x12)),
            DynSolValue::Uint(U256::from(1000u64), 256),
        ])
        .abi_encode_params();

        let values = decoder.decode_params(&["address", "uint256"], &data).unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values[0], DynSolValue::Address(Address::repeat_byte(0x12)));
        assert_eq!(values[1], DynSolValue::Uint(U256::from(1000u64), 256));
    }

    #[test]
    fn test_decode_dynamic_params() {
        let decoder = AlloyAbiDecoder::default();
        let data = DynSolValue::Tuple(vec![
            DynSolValue::Bytes(vec![0x0b, 0x00]),
            DynSolValue::Array(vec![
                DynSolValue::Bytes(vec![0xaa; 3]),
                DynSolValue::Bytes(vec![0xbb; 40]),
            ]),
        ])
        .abi_encode_params();

        let values = decoder.decode_params(&["bytes", "bytes[]"], &data).unwrap();

        assert_eq!(values[0], DynSolValue::Bytes(vec![0x0b, 0x00]));
        match &values[1] {
            DynSolValue::Array(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1], DynSolValue::Bytes(vec![0xbb; 40]));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_no_params() {
        let decoder = AlloyAbiDecoder::default();
        assert!(decoder.decode_params(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_type() {
        let decoder = AlloyAbiDecoder::default();
        let err = decoder.decode_params(&["uint257x"], &[0u8; 32]).unwrap_err();
        assert!(err.to_string().contains("uint257x"));
    }

    #[test]
    fn test_truncated_data() {
        let decoder = AlloyAbiDecoder::default();
        assert!(decoder.decode_params(&["address", "uint256"], &[0u8; 16]).is_err());
    }

    #[test]
    fn test_builtin_lookup() {
        let decoder = AlloyAbiDecoder::default();
        let execute = decoder.lookup([0x35, 0x93, 0x56, 0x4c]).unwrap();
        assert_eq!(execute.signature, "execute(bytes,bytes[],uint256)");
    }
}
