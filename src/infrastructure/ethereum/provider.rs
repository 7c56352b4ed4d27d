//! Ethereum provider abstraction and Alloy implementations
//!
//! Transactions are fetched with raw JSON requests so the monitor works
//! against any EVM chain, including L2s with non-standard transaction
//! types.

use std::path::PathBuf;

use alloy::network::Ethereum;
use alloy::primitives::{Bytes, B256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;

/// Raw transaction data parsed from JSON - chain agnostic
#[derive(Debug, Clone)]
pub struct RawTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub input: Bytes,
}

/// Provider configuration
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Pick the transport from the endpoint's scheme
    pub fn from_endpoint(endpoint: &str) -> Self {
        if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            return ProviderConfig::WebSocket(endpoint.to_string());
        }
        #[cfg(unix)]
        if endpoint.ends_with(".ipc") || endpoint.starts_with('/') {
            return ProviderConfig::Ipc(PathBuf::from(endpoint));
        }
        ProviderConfig::Http(endpoint.to_string())
    }

    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }

    /// Check if this endpoint can carry subscriptions
    pub fn is_streaming(&self) -> bool {
        !matches!(self, ProviderConfig::Http(_))
    }
}

/// Node operations the decoder tools need
#[async_trait::async_trait]
pub trait EthereumProvider: Send + Sync + 'static {
    /// Get a transaction by hash (chain-agnostic raw format)
    async fn get_transaction(&self, hash: B256) -> Result<Option<RawTransaction>>;

    /// Subscribe to pending transaction hashes (WebSocket/IPC only)
    async fn subscribe_pending(&self) -> Result<mpsc::Receiver<B256>>;

    /// Check if subscriptions are supported
    fn supports_subscriptions(&self) -> bool;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

type FilledProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Enum-based provider that stores the connected transport
pub enum AlloyProvider {
    Http {
        provider: FilledProvider,
        endpoint: String,
    },
    WebSocket {
        provider: FilledProvider,
        endpoint: String,
    },
    #[cfg(unix)]
    Ipc {
        provider: FilledProvider,
        endpoint: String,
    },
}

/// Create a provider from configuration
pub async fn create_provider(config: ProviderConfig) -> Result<Box<dyn EthereumProvider>> {
    tracing::debug!(endpoint = %config.display(), "connecting provider");
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            let provider = ProviderBuilder::new().connect_http(rpc_url);
            Ok(Box::new(AlloyProvider::Http {
                provider,
                endpoint: url,
            }))
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(Box::new(AlloyProvider::WebSocket {
                provider,
                endpoint: url,
            }))
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc_path = path.to_string_lossy().to_string();
            let ipc = IpcConnect::new(ipc_path);
            let provider = ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            let display = path.display().to_string();
            Ok(Box::new(AlloyProvider::Ipc {
                provider,
                endpoint: display,
            }))
        }
    }
}

impl AlloyProvider {
    fn inner(&self) -> &FilledProvider {
        match self {
            AlloyProvider::Http { provider, .. } => provider,
            AlloyProvider::WebSocket { provider, .. } => provider,
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => provider,
        }
    }
}

#[async_trait::async_trait]
impl EthereumProvider for AlloyProvider {
    async fn get_transaction(&self, hash: B256) -> Result<Option<RawTransaction>> {
        let json: serde_json::Value = self
            .inner()
            .raw_request("eth_getTransactionByHash".into(), (hash,))
            .await
            .with_context(|| format!("eth_getTransactionByHash {}", hash))?;

        if json.is_null() {
            return Ok(None);
        }

        parse_raw_transaction(&json)
            .map(Some)
            .with_context(|| format!("Malformed transaction response for {}", hash))
    }

    async fn subscribe_pending(&self) -> Result<mpsc::Receiver<B256>> {
        if let AlloyProvider::Http { .. } = self {
            anyhow::bail!("{} does not support subscriptions", self.endpoint_name());
        }

        let sub = self.inner().subscribe_pending_transactions().await?;
        let (tx, rx) = mpsc::channel(256);

        tokio::spawn(async move {
            let mut stream = sub.into_stream();
            while let Some(hash) = stream.next().await {
                if tx.send(hash).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }

    fn supports_subscriptions(&self) -> bool {
        match self {
            AlloyProvider::Http { .. } => false,
            AlloyProvider::WebSocket { .. } => true,
            #[cfg(unix)]
            AlloyProvider::Ipc { .. } => true,
        }
    }

    fn endpoint_name(&self) -> String {
        match self {
            AlloyProvider::Http { endpoint, .. } => endpoint.clone(),
            AlloyProvider::WebSocket { endpoint, .. } => endpoint.clone(),
            #[cfg(unix)]
            AlloyProvider::Ipc { endpoint, .. } => endpoint.clone(),
        }
    }
}

/// Parse a single transaction from JSON
///
/// Addresses and the hash are lowercased. A missing or non-hex `input`
/// is an error, never empty calldata.
pub fn parse_raw_transaction(json: &serde_json::Value) -> Result<RawTransaction> {
    let hash = string_field(json, "hash")?.to_lowercase();
    let from = string_field(json, "from")?.to_lowercase();
    let to = json.get("to").and_then(|v| v.as_str()).map(str::to_lowercase);

    let input = string_field(json, "input")?;
    let input = hex::decode(input.strip_prefix("0x").unwrap_or(input))
        .with_context(|| format!("Invalid input hex in transaction {}", hash))?;

    Ok(RawTransaction {
        hash,
        from,
        to,
        input: Bytes::from(input),
    })
}

fn string_field<'a>(json: &'a serde_json::Value, key: &str) -> Result<&'a str> {
    json.get(key)
        .and_then(|v| v.as_str())
        .with_context(|| format!("Missing field `{}`", key))
}
