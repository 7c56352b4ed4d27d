//! Router calldata decoding engine
//!
//! Turns a raw router call into typed, nested commands:
//!
//! - `envelope`: splits an `execute` call into opcodes, input blobs and deadline
//! - `commands`: decodes each blob per its opcode and expands V3 paths
//! - `batch`: resolves `multicall` sub-calls recursively with partial success
//! - `path`: the packed V3 multihop path codec
//!
//! The engine is synchronous and holds no mutable state. One
//! `RouterDecoder` can be shared across threads and tasks.

mod batch;
mod commands;
mod envelope;
mod normalize;
mod path;

use alloy_dyn_abi::DynSolValue;

use crate::domain::abi::AbiDecoder;
use crate::domain::router::{
    CommandId, DecodeError, DecodedCommand, FullDecodeResult, FunctionRole, RouterFunction,
};
use crate::infrastructure::abi::AlloyAbiDecoder;

pub use batch::{Trail, MAX_BATCH_DEPTH};
pub use normalize::normalize;
pub use path::decode_path;

/// Decoder for router calldata
pub struct RouterDecoder<D: AbiDecoder = AlloyAbiDecoder> {
    abi: D,
}

impl RouterDecoder<AlloyAbiDecoder> {
    /// Decoder backed by alloy-dyn-abi and the built-in function registry
    pub fn new() -> Self {
        Self::with_abi(AlloyAbiDecoder::with_builtin())
    }
}

impl Default for RouterDecoder<AlloyAbiDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: AbiDecoder> RouterDecoder<D> {
    pub fn with_abi(abi: D) -> Self {
        Self { abi }
    }

    /// Decode a full router call
    ///
    /// Accepts router `execute` calls, batch wrappers and the other
    /// router functions the engine knows. Any other selector is an
    /// `InvalidSelector` error. Errors propagate; only batch sub-calls
    /// are isolated from each other.
    pub fn decode_full(&self, calldata: &[u8]) -> Result<FullDecodeResult, DecodeError> {
        match split_selector(calldata) {
            Some((selector, _)) if RouterFunction::from_selector(selector).is_some() => {
                self.decode_call(calldata, &Trail::root())
            }
            _ => Err(DecodeError::InvalidSelector {
                selector: selector_hex(calldata),
            }),
        }
    }

    /// Decode any call by selector, re-entered for batch sub-calls
    fn decode_call(&self, calldata: &[u8], trail: &Trail) -> Result<FullDecodeResult, DecodeError> {
        let Some((selector, args)) = split_selector(calldata) else {
            return Err(DecodeError::UnknownFunction {
                selector: selector_hex(calldata),
            });
        };

        let Some(function) = RouterFunction::from_selector(selector) else {
            let Some(signature) = self.abi.lookup(selector) else {
                return Err(DecodeError::UnknownFunction {
                    selector: selector_hex(calldata),
                });
            };
            let command = self.decode_function(
                selector,
                &signature.name,
                &signature.kinds(),
                args,
            )?;
            return Ok(single(command));
        };

        match function.role() {
            FunctionRole::Execute => {
                let envelope = self.envelope_from_args(function, args)?;
                let contents = self.decode_commands(&envelope)?;
                Ok(FullDecodeResult {
                    contents,
                    deadline: envelope.deadline(),
                })
            }
            FunctionRole::Batch { calls_arg } => {
                let command = self.decode_batch(function, calls_arg, args, trail)?;
                Ok(single(command))
            }
            FunctionRole::Call => {
                let command =
                    self.decode_function(selector, function.name(), function.arg_types(), args)?;
                Ok(single(command))
            }
        }
    }

    /// Decode a plain function call by its declared types
    fn decode_function(
        &self,
        selector: [u8; 4],
        name: &str,
        arg_types: &[&str],
        args: &[u8],
    ) -> Result<DecodedCommand, DecodeError> {
        let values = self.decode_values(arg_types, args)?;
        Ok(DecodedCommand {
            command: CommandId::Selector(selector),
            name: name.to_string(),
            declared_types: arg_types.iter().map(|kind| kind.to_string()).collect(),
            args: values.iter().map(normalize).collect(),
        })
    }

    /// Run the ABI codec, surfacing its failure as `MalformedBlob`
    fn decode_values(&self, types: &[&str], data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
        self.abi
            .decode_params(types, data)
            .map_err(|err| DecodeError::MalformedBlob(format!("{:#}", err)))
    }
}

fn single(command: DecodedCommand) -> FullDecodeResult {
    FullDecodeResult {
        contents: vec![command],
        deadline: None,
    }
}

/// Split calldata into its 4-byte selector and the encoded arguments
fn split_selector(calldata: &[u8]) -> Option<([u8; 4], &[u8])> {
    let (selector, args) = calldata.split_first_chunk::<4>()?;
    Some((*selector, args))
}

/// Hex of the selector, or of whatever shorter prefix is present
fn selector_hex(calldata: &[u8]) -> String {
    format!("0x{}", hex::encode(&calldata[..calldata.len().min(4)]))
}

/// Parse `0x`-prefixed (or bare) hex calldata
pub fn parse_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let trimmed = input.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(payload)
}
