//! §1/§9: narrow, swappable collaborators outside the core — contract-type
//! identification, the honeypot oracle, the impersonation/known-token
//! list, the naming-authority leaderboard, and the short-URL domain list.

mod contract_type;
mod honeypot;
mod known_tokens;
mod leaderboard;
mod metadata_fetch;
mod short_urls;
mod side_input;

pub use contract_type::{ContractTypeIdentifier, SelectorHeuristicIdentifier};
pub use honeypot::{HoneypotOracle, HoneypotVerdict, StaticHoneypotOracle};
pub use known_tokens::{KnownTokenList, StaticTokenList, TokenRecord};
pub use leaderboard::{Leaderboard, StaticLeaderboard};
pub use metadata_fetch::{HttpMetadataFetcher, MetadataFetcher};
pub use short_urls::{ShortUrlDomains, StaticMarketplaceDomains, StaticShortUrlDomains};
