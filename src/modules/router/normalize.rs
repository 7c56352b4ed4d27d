//! Conversion of raw ABI values into lowercase, comparable output values

use alloy_dyn_abi::DynSolValue;

use crate::domain::router::DecodedValue;

/// Convert a decoded ABI value, lowercasing every string-valued leaf
pub fn normalize(value: &DynSolValue) -> DecodedValue {
    match value {
        DynSolValue::Bool(b) => DecodedValue::Bool(*b),
        DynSolValue::Uint(u, _) => DecodedValue::Uint(*u),
        DynSolValue::Int(i, _) => DecodedValue::Int(*i),
        DynSolValue::Address(addr) => DecodedValue::Address(hex_string(addr.as_slice())),
        DynSolValue::Function(func) => DecodedValue::FixedBytes(hex_string(func.as_slice())),
        DynSolValue::FixedBytes(word, size) => {
            DecodedValue::FixedBytes(hex_string(&word.as_slice()[..(*size).min(32)]))
        }
        DynSolValue::Bytes(bytes) => DecodedValue::Bytes(hex_string(bytes)),
        DynSolValue::String(s) => DecodedValue::String(s.to_lowercase()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            DecodedValue::Array(items.iter().map(normalize).collect())
        }
        DynSolValue::Tuple(fields) | DynSolValue::CustomStruct { tuple: fields, .. } => {
            DecodedValue::Tuple(fields.iter().map(normalize).collect())
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, I256, U256};

    #[test]
    fn test_strings_are_lowercased() {
        assert_eq!(
            normalize(&DynSolValue::String("WETH/USDC".to_string())),
            DecodedValue::String("weth/usdc".to_string())
        );
        assert_eq!(
            normalize(&DynSolValue::Address(Address::repeat_byte(0xab))),
            DecodedValue::Address(format!("0x{}", "ab".repeat(20)))
        );
        assert_eq!(
            normalize(&DynSolValue::Bytes(vec![0xde, 0xad, 0xBE, 0xEF])),
            DecodedValue::Bytes("0xdeadbeef".to_string())
        );
    }

    #[test]
    fn test_numbers_and_bools_untouched() {
        assert_eq!(
            normalize(&DynSolValue::Uint(U256::from(42u64), 256)),
            DecodedValue::Uint(U256::from(42u64))
        );
        assert_eq!(
            normalize(&DynSolValue::Int(I256::MINUS_ONE, 256)),
            DecodedValue::Int(I256::MINUS_ONE)
        );
        assert_eq!(normalize(&DynSolValue::Bool(true)), DecodedValue::Bool(true));
    }

    #[test]
    fn test_fixed_bytes_truncated_to_size() {
        let value = DynSolValue::FixedBytes(B256::repeat_byte(0xcd), 4);
        assert_eq!(normalize(&value), DecodedValue::FixedBytes("0xcdcdcdcd".to_string()));
    }

    #[test]
    fn test_nested_values() {
        let value = DynSolValue::Array(vec![DynSolValue::Tuple(vec![
            DynSolValue::Address(Address::repeat_byte(0x0f)),
            DynSolValue::String("ABC".to_string()),
            DynSolValue::Uint(U256::from(7u64), 160),
        ])]);

        assert_eq!(
            normalize(&value),
            DecodedValue::Array(vec![DecodedValue::Tuple(vec![
                DecodedValue::Address(format!("0x{}", "0f".repeat(20))),
                DecodedValue::String("abc".to_string()),
                DecodedValue::Uint(U256::from(7u64)),
            ])])
        );
    }

    #[test]
    fn test_named_struct_becomes_tuple() {
        let value = DynSolValue::CustomStruct {
            name: "Permit".to_string(),
            prop_names: vec!["owner".to_string(), "memo".to_string()],
            tuple: vec![
                DynSolValue::Address(Address::repeat_byte(0xAA)),
                DynSolValue::String("Hi".to_string()),
            ],
        };

        assert_eq!(
            normalize(&value),
            DecodedValue::Tuple(vec![
                DecodedValue::Address(format!("0x{}", "aa".repeat(20))),
                DecodedValue::String("hi".to_string()),
            ])
        );
    }
}
