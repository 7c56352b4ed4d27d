//! CSV Export
//!
//! One row per top-level command; nested values stay JSON in `args`.

use std::path::Path;

use anyhow::Result;

use crate::modules::monitor::WatchedDecode;

/// One flattened command of a watched transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRow {
    pub hash: String,
    pub index: usize,
    pub command: String,
    pub name: String,
    pub declared_types: String,
    pub args: String,
}

pub fn command_rows(decode: &WatchedDecode) -> Result<Vec<CommandRow>> {
    decode
        .result
        .contents
        .iter()
        .enumerate()
        .map(|(index, command)| {
            Ok(CommandRow {
                hash: decode.hash.clone(),
                index,
                command: command.command.to_string(),
                name: command.name.clone(),
                declared_types: command.declared_types.join(","),
                args: serde_json::to_string(&command.args)?,
            })
        })
        .collect()
}

/// Write command rows to CSV file, returning the row count
pub fn write_commands(path: &Path, decodes: &[WatchedDecode]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["hash", "index", "command", "name", "declared_types", "args"])?;

    let mut count = 0;
    for decode in decodes {
        for row in command_rows(decode)? {
            wtr.write_record([
                row.hash,
                row.index.to_string(),
                row.command,
                row.name,
                row.declared_types,
                row.args,
            ])?;
            count += 1;
        }
    }

    wtr.flush()?;
    Ok(count)
}
