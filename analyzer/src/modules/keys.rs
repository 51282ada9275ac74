//! Stable module keys (§3 "Analysis Context", §9). Centralized so the
//! interpretation step (§4.D) and the modules agree on spelling.

pub const TOKEN_IMPERSONATION: &str = "token_impersonation";
pub const AIRDROP: &str = "airdrop";
pub const TOO_MUCH_AIRDROP_ACTIVITY: &str = "too_much_airdrop_activity";
pub const LOW_ACTIVITY_AFTER_AIRDROP: &str = "low_activity_after_airdrop";
pub const ERC721_MULTIPLE_OWNERS: &str = "erc721_multiple_owners";
pub const ERC721_NON_UNIQUE_TOKENS: &str = "erc721_non_unique_tokens";
pub const ERC721_FALSE_TOTAL_SUPPLY: &str = "erc721_false_total_supply";
pub const SILENT_MINT: &str = "silent_mint";
pub const SLEEP_MINT: &str = "sleep_mint";
pub const TOO_MANY_TOKEN_CREATIONS: &str = "too_many_token_creations";
pub const PHISHING_METADATA: &str = "phishing_metadata";
pub const TOO_MANY_HONEYPOT_OWNERS: &str = "too_many_honeypot_owners";
pub const HONEYPOT_SHARE_DOMINANCE: &str = "honeypot_share_dominance";
pub const HIGH_ACTIVITY: &str = "high_activity";
pub const OBSERVATION_TIME: &str = "observation_time";
