use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Universal Router on mainnet
pub const DEFAULT_ROUTER: &str = "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad";

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Pending hashes inspected before the monitor stops
    pub limit: usize,
    /// Fetch attempts per hash
    pub attempts: u32,
    pub retry_delay_ms: u64,
    /// Transactions fetched at once
    pub concurrency: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            attempts: 4,
            retry_delay_ms: 1000,
            concurrency: 16,
        }
    }
}

impl WatchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_routers")]
    pub routers: Vec<String>,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub abi_paths: Vec<String>,

    #[serde(default)]
    pub watch: WatchConfig,

    /// Persist watched decodes to the local database
    #[serde(default = "default_store")]
    pub store: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            routers: default_routers(),
            endpoints: Vec::new(),
            abi_paths: Vec::new(),
            watch: WatchConfig::default(),
            store: default_store(),
        }
    }
}

fn default_routers() -> Vec<String> {
    vec![DEFAULT_ROUTER.to_string()]
}

fn default_store() -> bool {
    true
}

impl Config {
    /// Router addresses, lowercased
    pub fn normalized_routers(&self) -> Vec<String> {
        self.routers.iter().map(|router| normalize_address(router)).collect()
    }

    /// First HTTP endpoint: `RPC_URL`, else the config file
    pub fn rpc_endpoint(&self) -> Option<String> {
        env_endpoint("RPC_URL").or_else(|| {
            self.endpoints
                .iter()
                .find_map(|entry| non_empty(entry.rpc.as_deref()))
        })
    }

    /// First streaming endpoint: `WEBSOCKET_URL`, else a ws or ipc entry
    pub fn stream_endpoint(&self) -> Option<String> {
        env_endpoint("WEBSOCKET_URL").or_else(|| {
            self.endpoints.iter().find_map(|entry| {
                non_empty(entry.ws.as_deref())
                    .or_else(|| non_empty(entry.ipc.as_deref()).and_then(|ipc| expand_path(&ipc)))
            })
        })
    }

    /// Directories scanned for extra ABI files
    pub fn abi_roots(&self) -> Vec<PathBuf> {
        self.abi_paths
            .iter()
            .filter_map(|raw| expand_path(raw))
            .map(PathBuf::from)
            .collect()
    }
}

pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => Config::default(),
    }
}

/// Load a config file; missing or invalid files yield the defaults
pub fn load_from(path: &std::path::Path) -> Config {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "invalid config, using defaults");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("UNISCOPE_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("uniscope").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("uniscope").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "uniscope", "uniscope")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("uniscope"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("uniscope"));
    }
    directories::ProjectDirs::from("io", "uniscope", "uniscope")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn store_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("decodes.sqlite3"))
}

pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", payload.to_lowercase())
}

pub fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn env_endpoint(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok().as_deref())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn expand_path(path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return Some(home.join(rest).to_string_lossy().into_owned());
        }
    }

    let mut buf = PathBuf::from(trimmed);
    if buf.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            buf = cwd.join(buf);
        }
    }
    Some(buf.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.routers, vec![DEFAULT_ROUTER.to_string()]);
        assert_eq!(config.watch.limit, 50);
        assert_eq!(config.watch.attempts, 4);
        assert_eq!(config.watch.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.watch.concurrency, 16);
        assert!(config.store);
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            routers = ["0x3FC91A3AFD70395CD496C647D5A6CC9D4B2B7FAD", "0xEf1c6E67703c7BD7107eed8303Fbe6EC2554BF6B"]
            abi_paths = ["/opt/abis"]
            store = false

            [[endpoints]]
            name = "mainnet"
            rpc = "https://rpc.example"
            ws = "wss://ws.example"

            [watch]
            limit = 5
            "#,
        )
        .unwrap();

        assert_eq!(
            config.normalized_routers(),
            vec![
                "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad".to_string(),
                "0xef1c6e67703c7bd7107eed8303fbe6ec2554bf6b".to_string(),
            ]
        );
        assert_eq!(config.watch.limit, 5);
        assert_eq!(config.watch.attempts, 4);
        assert!(!config.store);
        assert_eq!(config.abi_roots(), vec![PathBuf::from("/opt/abis")]);
        assert_eq!(config.endpoints[0].ws.as_deref(), Some("wss://ws.example"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_from(std::path::Path::new("/nonexistent/uniscope/config.toml"));
        assert_eq!(config.routers.len(), 1);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_address(" 0XABcd "), "0xabcd");
        assert_eq!(normalize_http_endpoint("localhost:8545"), "http://localhost:8545");
        assert_eq!(normalize_http_endpoint("https://rpc.example"), "https://rpc.example");
    }
}
