//! Outer envelope decoding for router `execute` calls

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;

use crate::domain::abi::AbiDecoder;
use crate::domain::router::{DecodeError, FunctionRole, RawEnvelope, RouterFunction};

use super::{selector_hex, split_selector, RouterDecoder};

impl<D: AbiDecoder> RouterDecoder<D> {
    /// Split an `execute` call into opcodes, input blobs and deadline
    pub fn decode_envelope(&self, calldata: &[u8]) -> Result<RawEnvelope, DecodeError> {
        let execute = split_selector(calldata).and_then(|(selector, args)| {
            RouterFunction::from_selector(selector)
                .filter(|function| function.role() == FunctionRole::Execute)
                .map(|function| (function, args))
        });

        match execute {
            Some((function, args)) => self.envelope_from_args(function, args),
            None => Err(DecodeError::InvalidSelector {
                selector: selector_hex(calldata),
            }),
        }
    }

    /// Cheap pre-filter: an `execute` call with at least one command
    ///
    /// Never fails; any decode error means "not decodable". Calls whose
    /// command count differs from their input count are also rejected,
    /// since no envelope can be built for them.
    pub fn is_decodable(&self, calldata: &[u8]) -> bool {
        match self.decode_envelope(calldata) {
            Ok(envelope) => !envelope.is_empty(),
            Err(err) => {
                tracing::trace!(%err, "calldata is not a decodable router call");
                false
            }
        }
    }

    pub(super) fn envelope_from_args(
        &self,
        function: RouterFunction,
        args: &[u8],
    ) -> Result<RawEnvelope, DecodeError> {
        let values = self.decode_values(function.arg_types(), args)?;
        if !(2..=3).contains(&values.len()) {
            return Err(DecodeError::InvalidArity(values.len()));
        }

        let commands = bytes_arg(&values[0], "commands")?;
        let inputs = match &values[1] {
            DynSolValue::Array(blobs) => blobs
                .iter()
                .map(|blob| bytes_arg(blob, "inputs"))
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(unexpected("inputs", "bytes[]", other)),
        };
        let deadline = match values.get(2) {
            Some(value) => Some(uint_arg(value, "deadline")?),
            None => None,
        };

        let envelope = RawEnvelope::new(commands, inputs, deadline)?;
        tracing::debug!(
            commands = %envelope.commands_hex(),
            deadline = ?envelope.deadline(),
            "decoded router envelope"
        );
        Ok(envelope)
    }
}

fn bytes_arg(value: &DynSolValue, field: &str) -> Result<Vec<u8>, DecodeError> {
    match value {
        DynSolValue::Bytes(bytes) => Ok(bytes.clone()),
        other => Err(unexpected(field, "bytes", other)),
    }
}

fn uint_arg(value: &DynSolValue, field: &str) -> Result<U256, DecodeError> {
    match value {
        DynSolValue::Uint(value, _) => Ok(*value),
        other => Err(unexpected(field, "uint256", other)),
    }
}

fn unexpected(field: &str, expected: &str, got: &DynSolValue) -> DecodeError {
    DecodeError::MalformedBlob(format!(
        "{} should be {}, got {:?}",
        field,
        expected,
        got.as_type()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execute(commands: Vec<u8>, inputs: Vec<Vec<u8>>, deadline: Option<u64>) -> Vec<u8> {
        let mut args = vec![
            DynSolValue::Bytes(commands),
            DynSolValue::Array(inputs.into_iter().map(DynSolValue::Bytes).collect()),
        ];
        let function = match deadline {
            Some(deadline) => {
                args.push(DynSolValue::Uint(U256::from(deadline), 256));
                RouterFunction::ExecuteWithDeadline
            }
            None => RouterFunction::Execute,
        };
        let mut data = function.selector().to_vec();
        data.extend(DynSolValue::Tuple(args).abi_encode_params());
        data
    }

    #[test]
    fn test_envelope_with_deadline() {
        let decoder = RouterDecoder::new();
        let data = execute(vec![0x0b, 0x00], vec![vec![0x01], vec![0x02, 0x03]], Some(1_700_000_000));

        let envelope = decoder.decode_envelope(&data).unwrap();

        assert_eq!(envelope.command_array(), vec!["0b", "00"]);
        assert_eq!(envelope.inputs(), &[vec![0x01], vec![0x02, 0x03]]);
        assert_eq!(envelope.deadline(), Some(U256::from(1_700_000_000u64)));
    }

    #[test]
    fn test_envelope_without_deadline() {
        let decoder = RouterDecoder::new();
        let data = execute(vec![0x0c], vec![vec![0xff]], None);

        let envelope = decoder.decode_envelope(&data).unwrap();

        assert_eq!(envelope.len(), 1);
        assert_eq!(envelope.deadline(), None);
    }

    #[test]
    fn test_envelope_count_mismatch() {
        let decoder = RouterDecoder::new();
        let data = execute(vec![0x0b, 0x00], vec![vec![0x01]], Some(1));

        assert_eq!(
            decoder.decode_envelope(&data),
            Err(DecodeError::InputCountMismatch {
                commands: 2,
                inputs: 1
            })
        );
        assert!(!decoder.is_decodable(&data));
    }

    #[test]
    fn test_envelope_rejects_other_functions() {
        let decoder = RouterDecoder::new();
        let data = RouterFunction::RefundEth.selector();

        assert!(matches!(
            decoder.decode_envelope(&data),
            Err(DecodeError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_is_decodable() {
        let decoder = RouterDecoder::new();

        assert!(decoder.is_decodable(&execute(vec![0x0b], vec![vec![]], Some(1))));
        assert!(decoder.is_decodable(&execute(vec![0x0b], vec![vec![]], None)));
        // No commands at all
        assert!(!decoder.is_decodable(&execute(vec![], vec![], Some(1))));
        // Not the execute selector
        assert!(!decoder.is_decodable(&[0xa9, 0x05, 0x9c, 0xbb]));
        // Selector only, arguments missing
        assert!(!decoder.is_decodable(&RouterFunction::ExecuteWithDeadline.selector()));
        assert!(!decoder.is_decodable(&[]));
    }
}
