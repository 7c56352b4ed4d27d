//! uniscope: Uniswap Universal Router calldata decoder
//!
//! The decoding engine lives in [`modules::router`]; everything else
//! (node access, mempool monitor, export, local store) is tooling
//! around it.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod modules;
pub mod store;

pub use domain::router::{DecodeError, FullDecodeResult};
pub use modules::router::RouterDecoder;
