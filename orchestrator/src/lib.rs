//! §4.F Scan Orchestrator: a FIFO, single-worker task queue over the
//! watched-token set, tick-scheduled re-analysis, result buffering, and
//! token lifecycle (add -> watch -> finalize/remove).

use analyzer::{AnalysisResult, Analyzer, AnalysisServices, Task};
use anyhow::Result;
use eth::types::{Address, Standard};
use ingress::TxEvent;
use memoizer::Memoizer;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use store::{DataStore, TokenContract};
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

/// Bookkeeping for §3 "Task": "At most one Task exists per token at a
/// time." `finished_at` is `None` while the task is queued or running.
struct TaskRecord {
    finished_at: Option<Instant>,
}

#[derive(Default)]
struct Inner {
    watched: HashMap<Address, TokenContract>,
    task_by_token: HashMap<Address, TaskRecord>,
    result_by_token: HashMap<Address, AnalysisResult>,
    queue: VecDeque<Task>,
}

/// Owns the watched-token mirror, the task queue, and result buffer
/// (§4.F). A single background worker drains the queue one token at a
/// time — "queue concurrency 1" (§5) — so no two analyses ever run
/// concurrently within a process.
pub struct Orchestrator {
    store: Arc<Mutex<DataStore>>,
    memoizer: Arc<Memoizer>,
    ingress: ingress::Adapter,
    tick_interval: Duration,
    inner: Arc<Mutex<Inner>>,
    wake: Arc<Notify>,
    idle: Arc<Notify>,
    in_flight: Arc<AtomicUsize>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<Mutex<DataStore>>,
        memoizer: Arc<Memoizer>,
        services: AnalysisServices,
        ingress: ingress::Adapter,
        tick_interval: Duration,
    ) -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));
        let wake = Arc::new(Notify::new());
        let idle = Arc::new(Notify::new());
        let in_flight = Arc::new(AtomicUsize::new(0));

        spawn_worker(inner.clone(), wake.clone(), idle.clone(), in_flight.clone(), Analyzer::new(services));

        Self { store, memoizer, ingress, tick_interval, inner, wake, idle, in_flight }
    }

    /// §4.F `onNewToken`: add to store, add to the in-memory watched set.
    pub async fn on_new_token(&self, token: TokenContract) -> Result<()> {
        {
            let mut store = self.store.lock().await;
            store.add_token(&token)?;
        }
        let mut inner = self.inner.lock().await;
        inner.watched.entry(token.address).or_insert(token);
        Ok(())
    }

    /// §4.F `onTransaction`: forward to store ingestion via the ingress
    /// adapter (§4.G), then watch any newly deployed recognized-standard
    /// contracts the transaction's trace revealed.
    pub async fn on_transaction(&self, event: &TxEvent) -> Result<Vec<TokenContract>> {
        let standards: HashMap<Address, Standard> = {
            let inner = self.inner.lock().await;
            inner.watched.iter().map(|(address, token)| (*address, token.standard)).collect()
        };
        let new_tokens = {
            let mut store = self.store.lock().await;
            self.ingress.handle_tx(&mut store, &standards, event)?
        };
        for token in &new_tokens {
            self.on_new_token(*token).await?;
        }
        Ok(new_tokens)
    }

    /// §4.F `tick`: for each watched token without a pending (unreleased)
    /// result, enqueue a fresh task if none is in flight, or the previous
    /// one finished more than `tickInterval` ago.
    pub async fn tick(&self, timestamp: u64, block_number: u64) {
        let mut inner = self.inner.lock().await;
        let tokens: Vec<Address> = inner.watched.keys().copied().collect();
        let mut enqueued = 0usize;
        for token in tokens {
            if inner.result_by_token.contains_key(&token) {
                continue;
            }
            let should_enqueue = match inner.task_by_token.get(&token) {
                None => true,
                Some(record) => record.finished_at.map(|finished| finished.elapsed() > self.tick_interval).unwrap_or(false),
            };
            if !should_enqueue {
                continue;
            }
            inner.task_by_token.insert(token, TaskRecord { finished_at: None });
            inner.queue.push_back(Task { token, timestamp, block_number });
            enqueued += 1;
        }
        drop(inner);
        if enqueued > 0 {
            self.in_flight.fetch_add(enqueued, Ordering::SeqCst);
            self.wake.notify_waiters();
        }
    }

    /// (testing) awaits queue emptiness: no task queued or running.
    pub async fn drain(&self) {
        while self.in_flight.load(Ordering::SeqCst) != 0 {
            self.idle.notified().await;
        }
    }

    /// §4.F `releaseAnalyses`: atomically drains the result buffer. Any
    /// finalized result triggers this token's deletion (store purge +
    /// memoizer scope drop + task-map removal).
    pub async fn release_analyses(&self) -> Result<Vec<(Address, AnalysisResult)>> {
        let drained: Vec<(Address, AnalysisResult)> = {
            let mut inner = self.inner.lock().await;
            inner.result_by_token.drain().collect()
        };
        for (token, result) in &drained {
            if result.interpretation.is_finalized {
                self.delete_token(*token).await?;
            }
        }
        Ok(drained)
    }

    /// §4.F `deleteToken`: the same cleanup path `releaseAnalyses` takes
    /// for a finalized token, reachable directly (e.g. an operator
    /// removing a false-positive watch).
    pub async fn delete_token(&self, token: Address) -> Result<()> {
        {
            let mut store = self.store.lock().await;
            store.clear_token(token)?;
        }
        self.memoizer.delete_scope(token).await;
        let mut inner = self.inner.lock().await;
        inner.watched.remove(&token);
        inner.task_by_token.remove(&token);
        inner.result_by_token.remove(&token);
        Ok(())
    }

    pub async fn is_watched(&self, token: Address) -> bool {
        self.inner.lock().await.watched.contains_key(&token)
    }

    pub async fn watched_count(&self) -> usize {
        self.inner.lock().await.watched.len()
    }
}

/// The single worker of §4.F/§5 "queue concurrency 1": pops tasks FIFO,
/// runs the analyzer, and files the result. A task that errors (§7: "the
/// orchestrator catches and logs any task-level exception and reports
/// the task as failed") drops its `task_by_token` entry entirely so the
/// next `tick` retries it, rather than waiting out `tickInterval`.
fn spawn_worker(
    inner: Arc<Mutex<Inner>>,
    wake: Arc<Notify>,
    idle: Arc<Notify>,
    in_flight: Arc<AtomicUsize>,
    analyzer: Analyzer,
) {
    tokio::spawn(async move {
        loop {
            let task = {
                let mut guard = inner.lock().await;
                guard.queue.pop_front()
            };
            let Some(task) = task else {
                wake.notified().await;
                continue;
            };

            let token = task.token;
            let outcome = analyzer.run(task).await;
            let mut guard = inner.lock().await;
            match outcome {
                Ok(result) => {
                    if let Some(record) = guard.task_by_token.get_mut(&token) {
                        record.finished_at = Some(Instant::now());
                    }
                    guard.result_by_token.insert(token, result);
                }
                Err(err) => {
                    tracing::warn!(token = %token, error = %err, "scan task failed; token stays watched for retry");
                    guard.task_by_token.remove(&token);
                }
            }
            drop(guard);
            if in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                idle.notify_waiters();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer::Config;
    use eth::rpc::EthNodeReading;
    use eth::types::{BlockData, ContractDetails, TxDetails, U256};
    use providers::{
        HttpMetadataFetcher, SelectorHeuristicIdentifier, StaticHoneypotOracle, StaticLeaderboard, StaticMarketplaceDomains,
        StaticShortUrlDomains, StaticTokenList,
    };
    use std::collections::HashMap as Map;

    struct StubProvider;

    #[async_trait::async_trait]
    impl EthNodeReading for StubProvider {
        async fn get_blocks_for_range(&self, _start: u64, _end: u64) -> Result<Map<u64, BlockData>> {
            Ok(Map::new())
        }
        async fn is_eoa(&self, addresses: &[Address]) -> Map<Address, bool> {
            addresses.iter().map(|a| (*a, true)).collect()
        }
        async fn get_contract_details(&self, addresses: &[Address]) -> Map<Address, ContractDetails> {
            addresses.iter().map(|a| (*a, ContractDetails::default())).collect()
        }
        async fn get_token_uris(&self, _tokens: &[(Address, U256)]) -> Map<(Address, U256), Option<String>> {
            Map::new()
        }
        async fn owner_of(&self, _contract: Address, _token_id: U256, _block: u64) -> Option<Address> {
            None
        }
        async fn total_supply(&self, _contract: Address, _block: u64) -> Option<U256> {
            None
        }
        async fn allowance(&self, _contract: Address, _owner: Address, _spender: Address) -> Option<U256> {
            None
        }
        async fn pair_tokens(&self, _contract: Address) -> Option<(Address, Address)> {
            None
        }
    }

    fn orchestrator(tick_interval: Duration) -> Orchestrator {
        let store = Arc::new(Mutex::new(DataStore::new(":memory:").unwrap()));
        let memoizer = Arc::new(Memoizer::new());
        let services = AnalysisServices {
            transformer: Arc::new(analyzer::Transformer::new(store.clone())),
            store: store.clone(),
            memoizer: memoizer.clone(),
            provider: Arc::new(StubProvider),
            honeypot: Arc::new(StaticHoneypotOracle::new("/nonexistent/honeypots.json")),
            known_tokens: Arc::new(StaticTokenList::new("/nonexistent/tokens.json")),
            leaderboard: Arc::new(StaticLeaderboard::new("/nonexistent/leaders.json")),
            short_urls: Arc::new(StaticShortUrlDomains::default()),
            marketplaces: Arc::new(StaticMarketplaceDomains::default()),
            metadata_fetcher: Arc::new(HttpMetadataFetcher::default()),
            config: Arc::new(Config::default()),
        };
        let adapter = ingress::Adapter::new(Arc::new(SelectorHeuristicIdentifier));
        Orchestrator::new(store, memoizer, services, adapter, tick_interval)
    }

    #[tokio::test]
    async fn tick_runs_a_task_and_buffers_its_result() {
        let orchestrator = orchestrator(Duration::from_secs(3600));
        let token = TokenContract {
            address: Address::from(1u64),
            deployer: Address::from(2u64),
            deployment_block: 1,
            deployment_timestamp: 1,
            standard: Standard::Erc20,
        };
        orchestrator.on_new_token(token).await.unwrap();
        orchestrator.tick(100, 10).await;
        orchestrator.drain().await;

        let released = orchestrator.release_analyses().await.unwrap();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].0, token.address);
    }

    #[tokio::test]
    async fn tick_does_not_requeue_a_token_with_a_pending_result() {
        let orchestrator = orchestrator(Duration::from_secs(3600));
        let token = TokenContract {
            address: Address::from(1u64),
            deployer: Address::from(2u64),
            deployment_block: 1,
            deployment_timestamp: 1,
            standard: Standard::Erc20,
        };
        orchestrator.on_new_token(token).await.unwrap();
        orchestrator.tick(100, 10).await;
        orchestrator.drain().await;
        // A result is now sitting, undrained, in the buffer.
        orchestrator.tick(200, 20).await;
        orchestrator.drain().await;

        let released = orchestrator.release_analyses().await.unwrap();
        assert_eq!(released.len(), 1, "second tick must not enqueue while a result is pending release");
    }

    #[tokio::test]
    async fn releasing_a_finalized_result_removes_the_token() {
        let orchestrator = orchestrator(Duration::from_secs(3600));
        let token = TokenContract {
            address: Address::from(1u64),
            deployer: Address::from(2u64),
            deployment_block: 1,
            // Deployed far enough in the past that ObservationTime finalizes it.
            deployment_timestamp: 0,
            standard: Standard::Erc20,
        };
        orchestrator.on_new_token(token).await.unwrap();
        orchestrator.tick(200 * 24 * 60 * 60, 10).await;
        orchestrator.drain().await;

        let released = orchestrator.release_analyses().await.unwrap();
        assert!(released[0].1.interpretation.is_finalized);
        assert!(!orchestrator.is_watched(token.address).await);
    }

    #[tokio::test]
    async fn on_transaction_watches_a_newly_deployed_token() {
        let orchestrator = orchestrator(Duration::from_secs(3600));
        let mut bytecode = vec![0x60, 0x80];
        for selector in [[0xa9, 0x05, 0x9c, 0xbb], [0x70, 0xa0, 0x82, 0x31]] {
            bytecode.push(0x63);
            bytecode.extend_from_slice(&selector);
        }
        let event = TxEvent {
            details: TxDetails {
                hash: 1u64.into(),
                from: Address::from(5u64),
                to: None,
                selector: [0; 4],
                block_number: 1,
                block_timestamp: 1,
                position: 0,
            },
            logs: vec![],
            created_contracts: vec![ingress::ContractCreation { address: Address::from(99u64), code: bytecode }],
        };
        let new_tokens = orchestrator.on_transaction(&event).await.unwrap();
        assert_eq!(new_tokens.len(), 1);
        assert!(orchestrator.is_watched(Address::from(99u64)).await);
    }

    #[tokio::test]
    async fn delete_token_drops_the_watch() {
        let orchestrator = orchestrator(Duration::from_secs(3600));
        let token = TokenContract {
            address: Address::from(1u64),
            deployer: Address::from(2u64),
            deployment_block: 1,
            deployment_timestamp: 1,
            standard: Standard::Erc20,
        };
        orchestrator.on_new_token(token).await.unwrap();
        assert_eq!(orchestrator.watched_count().await, 1);
        orchestrator.delete_token(token.address).await.unwrap();
        assert_eq!(orchestrator.watched_count().await, 0);
    }
}
