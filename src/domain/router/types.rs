//! Decoded router data model
//!
//! Everything here is output: values are built once by the engine and
//! only read afterwards. Serialization is one-way; there is no
//! re-encoding back to calldata.

use std::fmt;

use alloy_primitives::{I256, U256};
use serde::{Serialize, Serializer};

use super::DecodeError;

/// Router envelope split out of an `execute` call
///
/// Holds the packed opcode bytes, one input blob per opcode and the
/// optional deadline. The opcode/blob counts are checked on
/// construction and the envelope is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawEnvelope {
    #[serde(serialize_with = "hex_bytes")]
    commands: Vec<u8>,
    #[serde(serialize_with = "hex_bytes_seq")]
    inputs: Vec<Vec<u8>>,
    #[serde(serialize_with = "decimal_opt")]
    deadline: Option<U256>,
}

impl RawEnvelope {
    pub fn new(
        commands: Vec<u8>,
        inputs: Vec<Vec<u8>>,
        deadline: Option<U256>,
    ) -> Result<Self, DecodeError> {
        if commands.len() != inputs.len() {
            return Err(DecodeError::InputCountMismatch {
                commands: commands.len(),
                inputs: inputs.len(),
            });
        }
        Ok(Self {
            commands,
            inputs,
            deadline,
        })
    }

    /// Packed opcodes as lowercase hex (e.g. "0x0b00")
    pub fn commands_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.commands))
    }

    /// One hex pair per opcode (e.g. ["0b", "00"])
    pub fn command_array(&self) -> Vec<String> {
        self.commands.iter().map(|op| format!("{:02x}", op)).collect()
    }

    pub fn inputs(&self) -> &[Vec<u8>] {
        &self.inputs
    }

    pub fn deadline(&self) -> Option<U256> {
        self.deadline
    }

    /// Opcodes paired with their input blobs
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[u8])> {
        self.commands
            .iter()
            .copied()
            .zip(self.inputs.iter().map(Vec::as_slice))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// One element of a decoded V3 path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathElement {
    /// Token address, lowercase hex
    Token(String),
    /// Pool fee tier in hundredths of a bip
    Fee(u32),
}

/// Decoded multihop path: token, fee, token, ..., token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecodedPath(Vec<PathElement>);

impl DecodedPath {
    pub(crate) fn new(elements: Vec<PathElement>) -> Self {
        Self(elements)
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|element| match element {
            PathElement::Token(address) => Some(address.as_str()),
            PathElement::Fee(_) => None,
        })
    }

    pub fn fees(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().filter_map(|element| match element {
            PathElement::Fee(fee) => Some(*fee),
            PathElement::Token(_) => None,
        })
    }
}

/// A decoded ABI value
///
/// Addresses, byte strings and strings are lowercase; numbers and
/// booleans keep their native value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Bool(bool),
    #[serde(serialize_with = "decimal")]
    Uint(U256),
    #[serde(serialize_with = "decimal")]
    Int(I256),
    Address(String),
    FixedBytes(String),
    Bytes(String),
    String(String),
    Array(Vec<DecodedValue>),
    Tuple(Vec<DecodedValue>),
    /// Packed V3 path expanded into hops
    Path(DecodedPath),
    /// Sub-calls of a batch wrapper, decoded recursively
    Batch(Vec<BatchEntry>),
}

impl DecodedValue {
    pub fn as_address(&self) -> Option<&str> {
        match self {
            DecodedValue::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            DecodedValue::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&DecodedPath> {
        match self {
            DecodedValue::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_batch(&self) -> Option<&[BatchEntry]> {
        match self {
            DecodedValue::Batch(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Identity of a decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// Router opcode byte
    Opcode(u8),
    /// Function selector of a plain or batch call
    Selector([u8; 4]),
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandId::Opcode(opcode) => write!(f, "{:02x}", opcode),
            CommandId::Selector(selector) => write!(f, "0x{}", hex::encode(selector)),
        }
    }
}

impl Serialize for CommandId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A router command or function call with its decoded arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedCommand {
    pub command: CommandId,
    /// Symbolic name (e.g. "V3_SWAP_EXACT_IN", "multicall")
    pub name: String,
    pub declared_types: Vec<String>,
    pub args: Vec<DecodedValue>,
}

/// Outcome of decoding one sub-call of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubCallOutcome {
    Decoded {
        result: FullDecodeResult,
    },
    UnknownFunction {
        selector: String,
    },
    Failed {
        #[serde(serialize_with = "display")]
        error: DecodeError,
    },
}

/// One sub-call of a batch, tagged with its position in the call tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    /// Index of the enclosing call within its own batch (0 at top level)
    pub parent_index: usize,
    /// Index of this sub-call within the batch
    pub child_index: usize,
    /// Nesting depth, 1 for entries of a top-level batch
    pub depth: usize,
    /// Child indices from the outermost batch down to this entry
    pub trail: Vec<usize>,
    #[serde(flatten)]
    pub outcome: SubCallOutcome,
}

impl BatchEntry {
    pub fn decoded(&self) -> Option<&FullDecodeResult> {
        match &self.outcome {
            SubCallOutcome::Decoded { result } => Some(result),
            _ => None,
        }
    }
}

/// Fully decoded call: ordered commands and the optional deadline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullDecodeResult {
    pub contents: Vec<DecodedCommand>,
    #[serde(serialize_with = "decimal_opt")]
    pub deadline: Option<U256>,
}

fn decimal<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn decimal_opt<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}

fn display<S: Serializer>(value: &DecodeError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn hex_bytes<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(value)))
}

fn hex_bytes_seq<S: Serializer>(values: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(|value| format!("0x{}", hex::encode(value))))
}
