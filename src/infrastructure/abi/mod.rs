//! ABI infrastructure - Alloy-based ABI decoding and signature loading

mod builtin;
mod decoder;
mod scanner;

pub use builtin::builtin_registry;
pub use decoder::AlloyAbiDecoder;
pub use scanner::AbiScanner;
