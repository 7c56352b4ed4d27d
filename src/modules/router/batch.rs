//! Recursive resolution of batch (`multicall`) sub-calls
//!
//! Every sub-call is decoded on its own. A sub-call that fails becomes a
//! marker entry in the batch; its siblings and the enclosing call are
//! unaffected.

use alloy_dyn_abi::DynSolValue;

use crate::domain::abi::AbiDecoder;
use crate::domain::router::{
    BatchEntry, CommandId, DecodeError, DecodedCommand, DecodedValue, RouterFunction,
    SubCallOutcome,
};

use super::{normalize, RouterDecoder};

/// Deepest batch nesting that is still decoded
pub const MAX_BATCH_DEPTH: usize = 8;

/// Position of a call in the batch tree, as child indices from the root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trail {
    indices: Vec<usize>,
}

impl Trail {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// Child index of this call within its own batch, 0 for the root
    pub fn parent_index(&self) -> usize {
        self.indices.last().copied().unwrap_or(0)
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.indices.clone();
        indices.push(index);
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D: AbiDecoder> RouterDecoder<D> {
    pub(super) fn decode_batch(
        &self,
        function: RouterFunction,
        calls_arg: usize,
        args: &[u8],
        trail: &Trail,
    ) -> Result<DecodedCommand, DecodeError> {
        let values = self.decode_values(function.arg_types(), args)?;
        let calls = match values.get(calls_arg) {
            Some(DynSolValue::Array(calls)) => calls,
            _ => {
                return Err(DecodeError::MalformedBlob(format!(
                    "{} has no call list at argument {}",
                    function.name(),
                    calls_arg
                )))
            }
        };

        let entries = calls
            .iter()
            .enumerate()
            .map(|(index, call)| self.decode_entry(index, call, trail))
            .collect();

        let mut decoded: Vec<DecodedValue> = values.iter().map(normalize).collect();
        decoded[calls_arg] = DecodedValue::Batch(entries);

        Ok(DecodedCommand {
            command: CommandId::Selector(function.selector()),
            name: function.name().to_string(),
            declared_types: function.arg_types().iter().map(|kind| kind.to_string()).collect(),
            args: decoded,
        })
    }

    fn decode_entry(&self, index: usize, call: &DynSolValue, trail: &Trail) -> BatchEntry {
        let child = trail.child(index);

        let outcome = match call {
            _ if child.depth() > MAX_BATCH_DEPTH => SubCallOutcome::Failed {
                error: DecodeError::DepthExceeded {
                    max: MAX_BATCH_DEPTH,
                },
            },
            DynSolValue::Bytes(calldata) => match self.decode_call(calldata, &child) {
                Ok(result) => SubCallOutcome::Decoded { result },
                Err(DecodeError::UnknownFunction { selector }) => {
                    tracing::debug!(trail = ?child.indices(), %selector, "unknown function in batch");
                    SubCallOutcome::UnknownFunction { selector }
                }
                Err(error) => SubCallOutcome::Failed { error },
            },
            other => SubCallOutcome::Failed {
                error: DecodeError::MalformedBlob(format!(
                    "batch entry should be bytes, got {:?}",
                    other.as_type()
                )),
            },
        };

        if let SubCallOutcome::Failed { error } = &outcome {
            tracing::warn!(trail = ?child.indices(), %error, "batch entry failed to decode");
        }

        BatchEntry {
            parent_index: trail.parent_index(),
            child_index: index,
            depth: child.depth(),
            trail: child.indices().to_vec(),
            outcome,
        }
    }
}
