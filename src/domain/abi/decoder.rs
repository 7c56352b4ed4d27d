//! ABI decoder trait

use alloy_dyn_abi::DynSolValue;

use super::FunctionSignature;

/// Trait for the generic ABI codec
///
/// The router engine never touches the wire format itself. It asks the
/// codec to decode a parameter tuple of declared Solidity types, and to
/// resolve selectors it does not know natively.
pub trait AbiDecoder: Send + Sync {
    /// Decode ABI-encoded parameters against a list of declared types
    ///
    /// # Arguments
    /// * `types` - Solidity types in declaration order (e.g. `["address", "uint256"]`)
    /// * `data` - The encoded parameters, without any selector
    ///
    /// # Returns
    /// * `Ok(values)` - One decoded value per declared type
    /// * `Err(...)` - If a type does not parse or the data does not match
    fn decode_params(&self, types: &[&str], data: &[u8]) -> anyhow::Result<Vec<DynSolValue>>;

    /// Look up a function signature by its 4-byte selector
    fn lookup(&self, selector: [u8; 4]) -> Option<&FunctionSignature>;
}
