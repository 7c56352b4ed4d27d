//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - ABI decoding and ABI file scanning using alloy-dyn-abi / alloy-json-abi
//! - Alloy-based Ethereum provider implementations (transaction fetch,
//!   pending-transaction subscription)

pub mod abi;
pub mod ethereum;

pub use abi::{AbiScanner, AlloyAbiDecoder};
