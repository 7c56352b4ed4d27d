//! Monitor behaviour against an in-memory provider

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Bytes, B256, U256};
use alloy_dyn_abi::DynSolValue;
use anyhow::Result;
use tokio::sync::mpsc;

use uniscope::config::DEFAULT_ROUTER;
use uniscope::domain::router::RouterFunction;
use uniscope::infrastructure::ethereum::{EthereumProvider, RawTransaction};
use uniscope::modules::monitor::{self, fetch_with_retry, WatchOptions, WatchedDecode};
use uniscope::RouterDecoder;

/// Serves a fixed set of transactions and pending hashes
struct MockProvider {
    pending: Vec<B256>,
    transactions: HashMap<B256, RawTransaction>,
    /// Lookups that miss before the transaction becomes visible
    hidden_for: HashMap<B256, u32>,
    lookups: Mutex<HashMap<B256, u32>>,
    fail_all: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockProvider {
    fn new(pending: Vec<B256>) -> Self {
        Self {
            pending,
            transactions: HashMap::new(),
            hidden_for: HashMap::new(),
            lookups: Mutex::new(HashMap::new()),
            fail_all: false,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_tx(mut self, hash: B256, to: &str, input: Vec<u8>) -> Self {
        self.transactions.insert(
            hash,
            RawTransaction {
                hash: format!("{}", hash),
                from: "0x1111111111111111111111111111111111111111".to_string(),
                to: Some(to.to_string()),
                input: Bytes::from(input),
            },
        );
        self
    }

    fn lookups(&self, hash: B256) -> u32 {
        self.lookups.lock().unwrap().get(&hash).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl EthereumProvider for MockProvider {
    async fn get_transaction(&self, hash: B256) -> Result<Option<RawTransaction>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let seen = {
            let mut lookups = self.lookups.lock().unwrap();
            let count = lookups.entry(hash).or_insert(0);
            *count += 1;
            *count
        };
        if self.fail_all {
            anyhow::bail!("connection reset");
        }
        if seen <= self.hidden_for.get(&hash).copied().unwrap_or(0) {
            return Ok(None);
        }
        Ok(self.transactions.get(&hash).cloned())
    }

    async fn subscribe_pending(&self) -> Result<mpsc::Receiver<B256>> {
        let (tx, rx) = mpsc::channel(self.pending.len().max(1));
        for hash in &self.pending {
            tx.send(*hash).await?;
        }
        Ok(rx)
    }

    fn supports_subscriptions(&self) -> bool {
        true
    }

    fn endpoint_name(&self) -> String {
        "mock".to_string()
    }
}

fn execute_calldata() -> Vec<u8> {
    let blob = DynSolValue::Tuple(vec![
        DynSolValue::Address(alloy::primitives::Address::repeat_byte(0x01)),
        DynSolValue::Uint(U256::from(1u64), 256),
    ])
    .abi_encode_params();
    let mut data = RouterFunction::ExecuteWithDeadline.selector().to_vec();
    data.extend(
        DynSolValue::Tuple(vec![
            DynSolValue::Bytes(vec![0x0b]),
            DynSolValue::Array(vec![DynSolValue::Bytes(blob)]),
            DynSolValue::Uint(U256::from(1_700_000_000u64), 256),
        ])
        .abi_encode_params(),
    );
    data
}

fn options(limit: Option<usize>) -> WatchOptions {
    WatchOptions {
        routers: vec![DEFAULT_ROUTER.to_string()],
        limit,
        attempts: 3,
        retry_delay: Duration::from_millis(1),
        max_in_flight: 8,
    }
}

async fn run(provider: MockProvider, options: WatchOptions) -> (monitor::WatchSummary, Vec<WatchedDecode>) {
    run_shared(Arc::new(provider), options).await
}

async fn run_shared(
    provider: Arc<MockProvider>,
    options: WatchOptions,
) -> (monitor::WatchSummary, Vec<WatchedDecode>) {
    let (sink, mut rx) = mpsc::channel(64);
    let summary = monitor::watch(provider, Arc::new(RouterDecoder::new()), options, sink)
        .await
        .unwrap();
    let mut decodes = Vec::new();
    while let Some(decode) = rx.recv().await {
        decodes.push(decode);
    }
    (summary, decodes)
}

#[tokio::test]
async fn test_watch_decodes_router_transactions() {
    let router_tx = B256::repeat_byte(0x01);
    let other_tx = B256::repeat_byte(0x02);
    let transfer_tx = B256::repeat_byte(0x03);
    let missing_tx = B256::repeat_byte(0x04);
    let late_tx = B256::repeat_byte(0x05);

    let mut provider = MockProvider::new(vec![router_tx, other_tx, transfer_tx, missing_tx, late_tx])
        .with_tx(router_tx, "0x3FC91A3AFD70395CD496C647D5A6CC9D4B2B7FAD", execute_calldata())
        .with_tx(other_tx, "0x2222222222222222222222222222222222222222", execute_calldata())
        .with_tx(transfer_tx, DEFAULT_ROUTER, vec![0xa9, 0x05, 0x9c, 0xbb])
        .with_tx(late_tx, DEFAULT_ROUTER, execute_calldata());
    provider.hidden_for.insert(late_tx, 2);

    let (summary, decodes) = run(provider, options(Some(10))).await;

    assert_eq!(summary.inspected, 5);
    assert_eq!(summary.decoded, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.failed, 0);

    assert_eq!(decodes.len(), 2);
    for decode in &decodes {
        assert_eq!(decode.to, DEFAULT_ROUTER);
        assert_eq!(decode.result.contents[0].name, "WRAP_ETH");
    }
}

#[tokio::test]
async fn test_watch_stops_at_limit() {
    let hashes: Vec<B256> = (1..=5).map(B256::repeat_byte).collect();
    let provider = hashes
        .iter()
        .fold(MockProvider::new(hashes.clone()), |provider, hash| {
            provider.with_tx(*hash, DEFAULT_ROUTER, execute_calldata())
        });

    let (summary, decodes) = run(provider, options(Some(2))).await;

    assert_eq!(summary.inspected, 2);
    assert_eq!(decodes.len(), 2);
}

#[tokio::test]
async fn test_unbounded_watch_caps_in_flight_fetches() {
    let hashes: Vec<B256> = (1..=12).map(B256::repeat_byte).collect();
    let provider = hashes
        .iter()
        .fold(MockProvider::new(hashes.clone()), |provider, hash| {
            provider.with_tx(*hash, DEFAULT_ROUTER, execute_calldata())
        });
    let provider = Arc::new(provider);
    let mut options = options(None);
    options.max_in_flight = 3;

    let (summary, decodes) = run_shared(Arc::clone(&provider), options).await;

    assert_eq!(summary.inspected, 12);
    assert_eq!(summary.decoded, 12);
    assert_eq!(decodes.len(), 12);
    let peak = provider.peak_in_flight.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 3, "peak in-flight fetches was {}", peak);
}

#[tokio::test]
async fn test_watch_counts_fetch_errors_as_failed() {
    let hashes: Vec<B256> = (1..=3).map(B256::repeat_byte).collect();
    let mut provider = MockProvider::new(hashes);
    provider.fail_all = true;

    let (summary, decodes) = run(provider, options(None)).await;

    assert_eq!(summary.inspected, 3);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.skipped, 0);
    assert!(decodes.is_empty());
}

#[tokio::test]
async fn test_fetch_with_retry_gives_up() {
    let hash = B256::repeat_byte(0x09);
    let mut provider = MockProvider::new(Vec::new());
    provider.fail_all = true;

    let result = fetch_with_retry(&provider, hash, 3, Duration::from_millis(1)).await;

    assert!(result.is_err());
    assert_eq!(provider.lookups(hash), 3);
}

#[tokio::test]
async fn test_fetch_with_retry_finds_late_transaction() {
    let hash = B256::repeat_byte(0x0a);
    let mut provider = MockProvider::new(Vec::new()).with_tx(hash, DEFAULT_ROUTER, execute_calldata());
    provider.hidden_for.insert(hash, 1);

    let tx = fetch_with_retry(&provider, hash, 3, Duration::from_millis(1))
        .await
        .unwrap();

    assert!(tx.is_some());
    assert_eq!(provider.lookups(hash), 2);
}
