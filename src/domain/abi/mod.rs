//! ABI domain models and contracts
//!
//! This module defines the codec capability the router engine consumes
//! and the registry of known function signatures, independent of the
//! underlying implementation (alloy-dyn-abi).

mod decoder;
mod registry;

pub use decoder::AbiDecoder;
pub use registry::{selector_of, AbiRegistry, FunctionSignature, ParamSpec, SignatureSource};
