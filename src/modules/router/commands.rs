//! Per-opcode command decoding

use alloy_dyn_abi::DynSolValue;

use crate::domain::abi::AbiDecoder;
use crate::domain::router::opcode::{self, OpcodeEntry, OpcodeLookup, PATH_ARG_INDEX};
use crate::domain::router::{CommandId, DecodeError, DecodedCommand, DecodedValue, RawEnvelope};

use super::{decode_path, normalize, RouterDecoder};

impl<D: AbiDecoder> RouterDecoder<D> {
    /// Decode every command's input blob, without path expansion
    pub fn decode_inputs(&self, envelope: &RawEnvelope) -> Result<Vec<Vec<DecodedValue>>, DecodeError> {
        envelope
            .iter()
            .map(|(opcode, blob)| {
                let entry = resolve_opcode(opcode)?;
                let values = self.decode_values(entry.arg_types, blob)?;
                Ok(values.iter().map(normalize).collect())
            })
            .collect()
    }

    /// Decode every command in envelope order
    ///
    /// The first failing command aborts the whole sequence: one
    /// malformed command means the transaction itself is malformed.
    pub fn decode_commands(&self, envelope: &RawEnvelope) -> Result<Vec<DecodedCommand>, DecodeError> {
        envelope
            .iter()
            .enumerate()
            .map(|(index, (opcode, blob))| self.decode_command(index, opcode, blob))
            .collect()
    }

    fn decode_command(
        &self,
        index: usize,
        opcode: u8,
        blob: &[u8],
    ) -> Result<DecodedCommand, DecodeError> {
        let entry = resolve_opcode(opcode)?;
        let values = self.decode_values(entry.arg_types, blob)?;
        let mut args: Vec<DecodedValue> = values.iter().map(normalize).collect();

        if opcode::is_path_bearing(opcode) {
            let raw_path = match values.get(PATH_ARG_INDEX) {
                Some(DynSolValue::Bytes(path)) => path,
                _ => {
                    return Err(DecodeError::MalformedBlob(format!(
                        "{} has no path argument",
                        entry.name
                    )))
                }
            };
            args[PATH_ARG_INDEX] = DecodedValue::Path(decode_path(raw_path)?);
        }

        tracing::trace!(index, opcode = %format!("{:02x}", opcode), name = entry.name, "decoded command");

        Ok(DecodedCommand {
            command: CommandId::Opcode(opcode),
            name: entry.name.to_string(),
            declared_types: entry.arg_types.iter().map(|kind| kind.to_string()).collect(),
            args,
        })
    }
}

fn resolve_opcode(opcode: u8) -> Result<&'static OpcodeEntry, DecodeError> {
    match opcode::lookup(opcode) {
        OpcodeLookup::Found(entry) => Ok(entry),
        OpcodeLookup::Reserved => Err(DecodeError::UnknownOpcode {
            opcode,
            reserved: true,
        }),
        OpcodeLookup::NotInTable => Err(DecodeError::UnknownOpcode {
            opcode,
            reserved: false,
        }),
    }
}
