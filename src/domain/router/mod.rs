//! Router domain - opcodes, known functions and the decoded data model

mod error;
mod function;
pub mod opcode;
mod types;

pub use error::DecodeError;
pub use function::{FunctionRole, RouterFunction};
pub use opcode::{OpcodeEntry, OpcodeLookup};
pub use types::{
    BatchEntry, CommandId, DecodedCommand, DecodedPath, DecodedValue, FullDecodeResult,
    PathElement, RawEnvelope, SubCallOutcome,
};
