use crate::config::Config;
use crate::transformer::Transformer;
use eth::rpc::EthNodeReading;
use memoizer::Memoizer;
use providers::{
    HoneypotOracle, KnownTokenList, Leaderboard, MetadataFetcher, ShortUrlDomains, StaticMarketplaceDomains,
};
use std::sync::Arc;
use store::DataStore;
use tokio::sync::Mutex;

/// Everything a detector module (§4.D) can reach, bundled so it is
/// `Clone` (all `Arc`) and `'static` — keeps the `Module` trait
/// object-safe without threading lifetimes through every signature.
#[derive(Clone)]
pub struct AnalysisServices {
    pub store: Arc<Mutex<DataStore>>,
    pub memoizer: Arc<Memoizer>,
    pub transformer: Arc<Transformer>,
    pub provider: Arc<dyn EthNodeReading>,
    pub honeypot: Arc<dyn HoneypotOracle>,
    pub known_tokens: Arc<dyn KnownTokenList>,
    pub leaderboard: Arc<dyn Leaderboard>,
    pub short_urls: Arc<dyn ShortUrlDomains>,
    pub marketplaces: Arc<StaticMarketplaceDomains>,
    pub metadata_fetcher: Arc<dyn MetadataFetcher>,
    pub config: Arc<Config>,
}
