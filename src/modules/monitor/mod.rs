//! Pending-transaction monitor
//!
//! Subscribes to pending transaction hashes, fetches each transaction,
//! and decodes the ones sent to a configured router. Every hash is
//! handled on its own task so a slow fetch never stalls the stream.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use anyhow::Result;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::{normalize_address, Config};
use crate::domain::abi::AbiDecoder;
use crate::domain::router::FullDecodeResult;
use crate::infrastructure::ethereum::{EthereumProvider, RawTransaction};
use crate::modules::router::RouterDecoder;

/// Monitor settings
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Router addresses, lowercase
    pub routers: Vec<String>,
    /// Hashes to inspect before stopping; `None` runs until the stream ends
    pub limit: Option<usize>,
    /// Fetch attempts per hash
    pub attempts: u32,
    pub retry_delay: Duration,
    /// Hashes being fetched or decoded at once
    pub max_in_flight: usize,
}

impl WatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            routers: config.normalized_routers(),
            limit: Some(config.watch.limit).filter(|limit| *limit > 0),
            attempts: config.watch.attempts,
            retry_delay: config.watch.retry_delay(),
            max_in_flight: config.watch.concurrency.max(1),
        }
    }

    pub fn is_router(&self, to: &str) -> bool {
        let to = normalize_address(to);
        self.routers.iter().any(|router| *router == to)
    }
}

/// A decoded router transaction seen in the mempool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchedDecode {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub result: FullDecodeResult,
}

/// Counters for one monitor run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub inspected: usize,
    pub decoded: usize,
    /// Not a router call, or no decodable commands
    pub skipped: usize,
    /// Never returned by the node within the retry budget
    pub not_found: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashOutcome {
    Decoded,
    Skipped,
    NotFound,
    Failed,
}

impl WatchSummary {
    fn record(&mut self, outcome: HashOutcome) {
        match outcome {
            HashOutcome::Decoded => self.decoded += 1,
            HashOutcome::Skipped => self.skipped += 1,
            HashOutcome::NotFound => self.not_found += 1,
            HashOutcome::Failed => self.failed += 1,
        }
    }
}

/// Watch pending transactions and send router decodes to `sink`
///
/// Returns once `limit` hashes were inspected and their tasks finished,
/// or when the subscription closes. Finished tasks are counted while the
/// stream runs; at most `max_in_flight` hashes are handled at once.
pub async fn watch<D>(
    provider: Arc<dyn EthereumProvider>,
    decoder: Arc<RouterDecoder<D>>,
    options: WatchOptions,
    sink: mpsc::Sender<WatchedDecode>,
) -> Result<WatchSummary>
where
    D: AbiDecoder + 'static,
{
    let mut hashes = provider.subscribe_pending().await?;
    let options = Arc::new(options);
    let mut tasks = JoinSet::new();
    let mut summary = WatchSummary::default();

    tracing::info!(
        endpoint = %provider.endpoint_name(),
        routers = ?options.routers,
        limit = ?options.limit,
        "watching pending transactions"
    );

    let max_in_flight = options.max_in_flight.max(1);
    while options.limit.map_or(true, |limit| summary.inspected < limit) {
        tokio::select! {
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                summary.record(task_outcome(joined));
            }
            next = hashes.recv(), if tasks.len() < max_in_flight => {
                let Some(hash) = next else {
                    tracing::info!("pending subscription closed");
                    break;
                };
                summary.inspected += 1;

                let provider = Arc::clone(&provider);
                let decoder = Arc::clone(&decoder);
                let options = Arc::clone(&options);
                let sink = sink.clone();
                tasks.spawn(async move { inspect(provider.as_ref(), &decoder, &options, &sink, hash).await });
            }
        }
    }
    drop(hashes);

    while let Some(joined) = tasks.join_next().await {
        summary.record(task_outcome(joined));
    }

    tracing::info!(?summary, "monitor finished");
    Ok(summary)
}

fn task_outcome(joined: Result<HashOutcome, tokio::task::JoinError>) -> HashOutcome {
    joined.unwrap_or_else(|err| {
        tracing::error!(%err, "monitor task aborted");
        HashOutcome::Failed
    })
}

async fn inspect<D: AbiDecoder>(
    provider: &dyn EthereumProvider,
    decoder: &RouterDecoder<D>,
    options: &WatchOptions,
    sink: &mpsc::Sender<WatchedDecode>,
    hash: B256,
) -> HashOutcome {
    let tx = match fetch_with_retry(provider, hash, options.attempts, options.retry_delay).await {
        Ok(Some(tx)) => tx,
        Ok(None) => {
            tracing::debug!(%hash, "transaction not found");
            return HashOutcome::NotFound;
        }
        Err(err) => {
            tracing::warn!(%hash, error = %format!("{:#}", err), "failed to fetch transaction");
            return HashOutcome::Failed;
        }
    };

    let Some(to) = tx.to.as_deref().filter(|to| options.is_router(to)) else {
        return HashOutcome::Skipped;
    };
    if !decoder.is_decodable(&tx.input) {
        tracing::debug!(%hash, "router call without decodable commands");
        return HashOutcome::Skipped;
    }

    match decoder.decode_full(&tx.input) {
        Ok(result) => {
            tracing::info!(%hash, commands = result.contents.len(), "decoded router transaction");
            let decoded = WatchedDecode {
                hash: tx.hash.clone(),
                from: tx.from.clone(),
                to: normalize_address(to),
                result,
            };
            if sink.send(decoded).await.is_err() {
                tracing::debug!(%hash, "decode sink closed");
            }
            HashOutcome::Decoded
        }
        Err(err) => {
            tracing::warn!(%hash, %err, "failed to decode router transaction");
            HashOutcome::Failed
        }
    }
}

/// Fetch a transaction, retrying while the node does not know it yet
///
/// Pending hashes often arrive before the node serves the transaction
/// body. Transport errors are retried too; the last one is returned.
pub async fn fetch_with_retry(
    provider: &dyn EthereumProvider,
    hash: B256,
    attempts: u32,
    retry_delay: Duration,
) -> Result<Option<RawTransaction>> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match provider.get_transaction(hash).await {
            Ok(Some(tx)) => return Ok(Some(tx)),
            Ok(None) => tracing::trace!(%hash, attempt, "transaction not yet available"),
            Err(err) if attempt == attempts => return Err(err),
            Err(err) => tracing::debug!(%hash, attempt, %err, "fetch failed, retrying"),
        }
        if attempt < attempts {
            tokio::time::sleep(retry_delay).await;
        }
    }
    Ok(None)
}
