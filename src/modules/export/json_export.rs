//! JSON Export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

/// Write records to a pretty-printed JSON array
pub fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(records.len())
}
