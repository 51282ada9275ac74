extern crate classifier;

use anyhow::{Context, Result};
use classifier::cli::Args;
use classifier::config::analyzer_config;
use classifier::feed::{ChainFeed, NullChainFeed};
use classifier::verdict::{verdicts_for, TracingVerdictSink, VerdictSink};
use clap::Parser;
use eth::rpc::ethers_client::Client as EthRpcClient;
use eth::rpc::EthNodeReading;
use eth::types::Address;
use memoizer::Memoizer;
use providers::{
    HttpMetadataFetcher, SelectorHeuristicIdentifier, StaticHoneypotOracle, StaticLeaderboard, StaticMarketplaceDomains,
    StaticShortUrlDomains, StaticTokenList,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use store::DataStore;
use tokio::sync::Mutex;

const BLOCK_PERIOD: Duration = Duration::from_secs(12);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_from(std::env::args());

    let filter = if args.debug { "debug".to_string() } else { args.log.clone() };
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_env_filter(filter).with_ansi(false).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = analyzer_config(&args);
    let data_dir = Path::new(&args.data_dir);

    let store = Arc::new(Mutex::new(DataStore::new(&args.store_path).context("init DataStore")?));
    let memoizer = Arc::new(Memoizer::new());
    let provider: Arc<dyn EthNodeReading> =
        Arc::new(EthRpcClient::new(&args.node_url, config.provider_concurrency).context("init EthRpcClient")?);

    let services = analyzer::AnalysisServices {
        transformer: Arc::new(analyzer::Transformer::new(store.clone())),
        store: store.clone(),
        memoizer: memoizer.clone(),
        provider,
        honeypot: Arc::new(StaticHoneypotOracle::new(data_dir.join("honeypots.json"))),
        known_tokens: Arc::new(StaticTokenList::new(data_dir.join("tokens.json"))),
        leaderboard: Arc::new(StaticLeaderboard::new(data_dir.join("leaders.json"))),
        short_urls: Arc::new(StaticShortUrlDomains::default()),
        marketplaces: Arc::new(StaticMarketplaceDomains::default()),
        metadata_fetcher: Arc::new(HttpMetadataFetcher::default()),
        config: Arc::new(config),
    };

    let tick_interval = config.tick_interval;
    let adapter = ingress::Adapter::new(Arc::new(SelectorHeuristicIdentifier));
    let orchestrator = orchestrator::Orchestrator::new(store, memoizer, services, adapter, tick_interval);

    let mut feed: Box<dyn ChainFeed> = Box::new(NullChainFeed);
    let sink: Arc<dyn VerdictSink> = Arc::new(TracingVerdictSink);

    tracing::info!(store_path = %args.store_path, node_url = %args.node_url, "classifier starting");
    run(&orchestrator, feed.as_mut(), sink.as_ref(), &args).await
}

/// The outer tick/ingest loop (§2 "Data flow"): poll the (external)
/// chain feed, forward each transaction, tick the orchestrator once per
/// block period, then drain and release whatever analyses finished,
/// comparing each against its prior verdict before emitting.
async fn run(
    orchestrator: &orchestrator::Orchestrator,
    feed: &mut dyn ChainFeed,
    sink: &dyn VerdictSink,
    args: &Args,
) -> Result<()> {
    let mut block_number: u64 = 0;
    let mut prior: HashMap<Address, analyzer::AnalysisResult> = HashMap::new();

    loop {
        let events = feed.poll().await.context("polling chain feed")?;
        for event in &events {
            let new_tokens = orchestrator.on_transaction(event).await?;
            for token in new_tokens {
                if args.debug {
                    if let Some(target) = args.target_token {
                        if token.address != target {
                            orchestrator.delete_token(token.address).await?;
                            continue;
                        }
                    }
                }
                tracing::info!(token = %token.address, standard = ?token.standard, "watching new token");
            }
        }

        block_number += 1;
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        orchestrator.tick(timestamp, block_number).await;
        orchestrator.drain().await;

        for (token, result) in orchestrator.release_analyses().await? {
            for verdict in verdicts_for(token, &result, prior.get(&token)) {
                sink.emit(verdict).await;
            }
            if result.interpretation.is_finalized {
                prior.remove(&token);
            } else {
                prior.insert(token, result);
            }
        }

        tokio::time::sleep(BLOCK_PERIOD).await;
    }
}
