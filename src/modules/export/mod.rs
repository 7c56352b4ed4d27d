//! Export of watched decodes
//!
//! - JSON: the full decode tree of every transaction
//! - CSV: one row per top-level command, arguments as JSON
//!
//! Without an explicit path, files land in the data dir's `exports/`.

mod csv_export;
mod json_export;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use directories::ProjectDirs;

use crate::modules::monitor::WatchedDecode;

pub use csv_export::{command_rows, write_commands, CommandRow};
pub use json_export::write_json;

/// Export format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Get the export directory path, creating it if needed
pub fn export_dir() -> std::io::Result<PathBuf> {
    let export_dir = ProjectDirs::from("io", "uniscope", "uniscope")
        .map(|dirs| dirs.data_dir().join("exports"))
        .unwrap_or_else(|| PathBuf::from(".uniscope").join("exports"));
    fs::create_dir_all(&export_dir)?;
    Ok(export_dir)
}

/// Generate a timestamped filename
pub fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

/// Write watched decodes to `path`, in the format its extension names
///
/// Returns the number of records written.
pub fn export_decodes(path: &Path, decodes: &[WatchedDecode]) -> Result<usize> {
    let written = match ExportFormat::from_path(path) {
        ExportFormat::Json => write_json(path, decodes)?,
        ExportFormat::Csv => write_commands(path, decodes)?,
    };
    tracing::info!(path = %path.display(), records = written, "exported decodes");
    Ok(written)
}

/// Export into the default directory under a timestamped name
pub fn export_default(decodes: &[WatchedDecode], format: ExportFormat) -> Result<PathBuf> {
    let dir = export_dir().context("Failed to create export directory")?;
    let path = dir.join(generate_filename("decodes", format.extension()));
    export_decodes(&path, decodes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Json);
    }

    #[test]
    fn test_generate_filename() {
        let name = generate_filename("decodes", "csv");
        assert!(name.starts_with("decodes-"));
        assert!(name.ends_with(".csv"));
    }
}
