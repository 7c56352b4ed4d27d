//! Errors raised while decoding router calldata

use thiserror::Error;

/// Errors that can occur while decoding a router call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("selector {selector} is not a router call")]
    InvalidSelector { selector: String },

    #[error("router call has {0} top-level arguments, expected 2 or 3")]
    InvalidArity(usize),

    #[error("{commands} commands but {inputs} input blobs")]
    InputCountMismatch { commands: usize, inputs: usize },

    #[error("unknown opcode 0x{opcode:02x}{}", reserved_note(.reserved))]
    UnknownOpcode { opcode: u8, reserved: bool },

    #[error("path of {len} bytes is not address(20) [fee(3) address(20)]*")]
    MalformedPath { len: usize },

    #[error("unknown function selector {selector}")]
    UnknownFunction { selector: String },

    #[error("malformed ABI data: {0}")]
    MalformedBlob(String),

    #[error("batch nesting exceeds {max} levels")]
    DepthExceeded { max: usize },
}

fn reserved_note(reserved: &bool) -> &'static str {
    if *reserved {
        " (reserved slot)"
    } else {
        ""
    }
}
