//! ABI file scanner - loads extra function signatures from build artifacts
//!
//! Batch sub-calls may target functions the engine does not know
//! natively. Pointing the scanner at a Foundry `out/` or Hardhat
//! `artifacts/` tree makes those functions decodable.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use alloy_json_abi::{Function, JsonAbi};
use walkdir::WalkDir;

use crate::domain::abi::{AbiRegistry, FunctionSignature, ParamSpec, SignatureSource};

/// Largest artifact file the scanner will parse
const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// ABI file scanner
pub struct AbiScanner;

impl AbiScanner {
    /// Scan one root: a single ABI file, or a directory walked recursively
    pub fn scan(root: impl AsRef<Path>) -> AbiRegistry {
        let root = root.as_ref();
        let mut registry = AbiRegistry::new();

        if root.is_file() {
            registry.scanned_files = 1;
            if let Err(err) = Self::load_abi_file(root, &mut registry) {
                registry.errors.push(format!("{}: {:#}", root.display(), err));
            }
            return registry;
        }

        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !Self::is_ignored_dir(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    registry.errors.push(err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if !Self::path_contains_any(path, &["out", "artifacts", "abi"]) {
                continue;
            }

            match entry.metadata() {
                Ok(meta) if meta.len() > MAX_FILE_BYTES => continue,
                Ok(_) => {}
                Err(err) => {
                    registry.errors.push(format!("{}: {}", path.display(), err));
                    continue;
                }
            }

            registry.scanned_files += 1;
            if let Err(err) = Self::load_abi_file(path, &mut registry) {
                registry.errors.push(format!("{}: {:#}", path.display(), err));
            }
        }

        registry
    }

    /// Scan multiple roots into one registry
    pub fn scan_roots(roots: &[PathBuf]) -> AbiRegistry {
        let started = Instant::now();
        let mut registry = AbiRegistry::new();

        for root in roots {
            registry.merge(Self::scan(root));
        }

        tracing::debug!(
            roots = roots.len(),
            files = registry.scanned_files,
            functions = registry.len(),
            errors = registry.errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scanned ABI roots"
        );

        registry
    }

    /// Load a single ABI file (raw array or artifact with an "abi" field)
    fn load_abi_file(path: &Path, registry: &mut AbiRegistry) -> anyhow::Result<()> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        let abi_value = if value.is_array() {
            value
        } else if let Some(abi) = value.get("abi") {
            abi.clone()
        } else {
            return Ok(());
        };

        let abi: JsonAbi = serde_json::from_value(abi_value)?;
        for function in abi.functions() {
            registry.insert(Self::function_signature(function, path));
        }

        Ok(())
    }

    fn function_signature(function: &Function, path: &Path) -> FunctionSignature {
        FunctionSignature {
            selector: function.selector().0,
            name: function.name.clone(),
            signature: function.signature(),
            inputs: function
                .inputs
                .iter()
                .map(|input| ParamSpec {
                    name: input.name.clone(),
                    kind: input.selector_type().into_owned(),
                })
                .collect(),
            source: SignatureSource::File(path.to_path_buf()),
        }
    }

    /// Check if a path should be ignored
    fn is_ignored_dir(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| {
                matches!(
                    name,
                    ".git" | "target" | "node_modules" | "cache" | "dist" | "build"
                )
            })
            .unwrap_or(false)
    }

    /// Check if path contains any of the given names
    fn path_contains_any(path: &Path, names: &[&str]) -> bool {
        path.components().any(|component| match component {
            Component::Normal(value) => value
                .to_str()
                .map(|value| names.contains(&value))
                .unwrap_or(false),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_ABI: &str = r#"[
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"permit","stateMutability":"nonpayable",
         "inputs":[{"name":"p","type":"tuple","components":[
            {"name":"owner","type":"address"},{"name":"value","type":"uint256"}]}],
         "outputs":[]}
    ]"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("uniscope-scan-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("out")).unwrap();
        dir
    }

    #[test]
    fn test_scan_artifact_dir() {
        let dir = scratch_dir("artifacts");
        fs::write(
            dir.join("out").join("Token.json"),
            format!(r#"{{"abi": {}}}"#, ERC20_ABI),
        )
        .unwrap();
        fs::write(dir.join("out").join("broken.json"), "{not json").unwrap();
        fs::write(dir.join("Token.json"), ERC20_ABI).unwrap();

        let registry = AbiScanner::scan(&dir);

        // Files outside out/ are skipped
        assert_eq!(registry.scanned_files, 2);
        assert_eq!(registry.errors.len(), 1);
        let transfer = registry.lookup_hex("0xa9059cbb").unwrap();
        assert_eq!(transfer.kinds(), vec!["address", "uint256"]);
        let permit = registry
            .functions()
            .find(|f| f.name == "permit")
            .unwrap();
        assert_eq!(permit.signature, "permit((address,uint256))");
        assert_eq!(permit.kinds(), vec!["(address,uint256)"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scan_single_file() {
        let dir = scratch_dir("single");
        let file = dir.join("erc20.json");
        fs::write(&file, ERC20_ABI).unwrap();

        let registry = AbiScanner::scan(&file);
        assert_eq!(registry.scanned_files, 1);
        assert_eq!(registry.len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_is_ignored_dir() {
        assert!(AbiScanner::is_ignored_dir(Path::new(".git")));
        assert!(AbiScanner::is_ignored_dir(Path::new("node_modules")));
        assert!(!AbiScanner::is_ignored_dir(Path::new("src")));
        assert!(!AbiScanner::is_ignored_dir(Path::new("out")));
    }

    #[test]
    fn test_path_contains_any() {
        assert!(AbiScanner::path_contains_any(
            Path::new("/project/artifacts/contracts/UniversalRouter.sol/UniversalRouter.json"),
            &["out", "artifacts"]
        ));
        assert!(!AbiScanner::path_contains_any(
            Path::new("/project/src/Router.sol"),
            &["out", "artifacts"]
        ));
    }
}
