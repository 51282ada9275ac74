//! §4.E Analyzer: runs the fixed module battery against a fresh context
//! and reduces it to the externalized short form plus the public
//! interpretation. Nothing besides those two survives the scan.

use crate::context::{AnalysisContext, ModuleOutcome};
use crate::interpretation::{interpret, Interpretation};
use crate::module::{Module, ScanContext};
use crate::modules::battery;
use crate::services::AnalysisServices;
use anyhow::Result;
use eth::types::Address;
use serde_json::Value;

/// One unit of work for a single token (§4.F "at most one task per
/// token").
#[derive(Debug, Clone, Copy)]
pub struct Task {
    pub token: Address,
    pub timestamp: u64,
    pub block_number: u64,
}

/// What a completed scan leaves behind (§4.E: "the externalized context
/// is the only object retained after the scan").
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub token: Address,
    pub externalized: Value,
    pub interpretation: Interpretation,
}

pub struct Analyzer {
    services: AnalysisServices,
}

impl Analyzer {
    pub fn new(services: AnalysisServices) -> Self {
        Self { services }
    }

    pub async fn run(&self, task: Task) -> Result<AnalysisResult> {
        let mut context = AnalysisContext::new();
        let modules = battery();

        for module in &modules {
            let mut scan_ctx = ScanContext {
                token: task.token,
                timestamp: task.timestamp,
                block_number: task.block_number,
                context: &mut context,
                services: &self.services,
            };
            let outcome = module.scan(&mut scan_ctx).await?;
            context.record(module.key(), ModuleOutcome { detected: outcome.detected, metadata: outcome.metadata });
            if outcome.interrupt {
                break;
            }
        }

        let interpretation = interpret(&context);
        let externalized = externalize(&modules, &context);

        Ok(AnalysisResult { token: task.token, externalized, interpretation })
    }
}

/// Reduces the raw per-scan context down to each module's *short* form
/// (§4.E, §9 "order-sensitive" note: this is what `compare()` sees on
/// the next tick, never the raw metadata dependent modules read).
fn externalize(modules: &[Box<dyn Module>], context: &AnalysisContext) -> Value {
    let mut map = serde_json::Map::new();
    for module in modules {
        let Some(outcome) = context.get(module.key()) else {
            continue;
        };
        let metadata = outcome.metadata.as_ref().map(|value| module.simplify_metadata(value));
        map.insert(
            module.key().to_string(),
            serde_json::json!({
                "detected": outcome.detected,
                "metadata": metadata,
            }),
        );
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use eth::rpc::EthNodeReading;
    use eth::types::{Address, BlockData, ContractDetails, U256};
    use memoizer::Memoizer;
    use providers::{HttpMetadataFetcher, StaticHoneypotOracle, StaticLeaderboard, StaticMarketplaceDomains, StaticShortUrlDomains, StaticTokenList};
    use std::collections::HashMap;
    use std::sync::Arc;
    use store::DataStore;
    use tokio::sync::Mutex;

    struct StubProvider;

    #[async_trait::async_trait]
    impl EthNodeReading for StubProvider {
        async fn get_blocks_for_range(&self, _start: u64, _end: u64) -> Result<HashMap<u64, BlockData>> {
            Ok(HashMap::new())
        }
        async fn is_eoa(&self, addresses: &[Address]) -> HashMap<Address, bool> {
            addresses.iter().map(|a| (*a, true)).collect()
        }
        async fn get_contract_details(&self, addresses: &[Address]) -> HashMap<Address, ContractDetails> {
            addresses.iter().map(|a| (*a, ContractDetails::default())).collect()
        }
        async fn get_token_uris(&self, _tokens: &[(Address, U256)]) -> HashMap<(Address, U256), Option<String>> {
            HashMap::new()
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

    fn test_services() -> AnalysisServices {
        let store = Arc::new(Mutex::new(DataStore::new(":memory:").unwrap()));
        AnalysisServices {
            transformer: Arc::new(crate::transformer::Transformer::new(store.clone())),
            store,
            memoizer: Arc::new(Memoizer::new()),
            provider: Arc::new(StubProvider),
            honeypot: Arc::new(StaticHoneypotOracle::new("/nonexistent/honeypots.json")),
            known_tokens: Arc::new(StaticTokenList::new("/nonexistent/tokens.json")),
            leaderboard: Arc::new(StaticLeaderboard::new("/nonexistent/leaders.json")),
            short_urls: Arc::new(StaticShortUrlDomains::default()),
            marketplaces: Arc::new(StaticMarketplaceDomains::default()),
            metadata_fetcher: Arc::new(HttpMetadataFetcher::default()),
            config: Arc::new(Config::default()),
        }
    }

    #[tokio::test]
    async fn unknown_token_produces_an_empty_not_spam_result() {
        let analyzer = Analyzer::new(test_services());
        let result = analyzer
            .run(Task { token: Address::from(1u64), timestamp: 0, block_number: 0 })
            .await
            .unwrap();
        assert!(!result.interpretation.is_spam);
        assert!(result.externalized.is_object());
    }
}
