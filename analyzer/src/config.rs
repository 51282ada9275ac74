//! §6 "Defaults (canonical values)" and the HighActivity suspicious-
//! multiplier weight table. One `Config` per process; cheap to clone.

use std::time::Duration;

const DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub tick_interval: Duration,
    pub airdrop_window: u64,
    pub min_rx_per_tx: usize,
    pub min_rx_per_sender: usize,
    pub provider_concurrency: usize,
    pub fetch_concurrency: usize,

    pub airdrop_duration_threshold: u64,
    pub receivers_threshold: usize,

    pub delay_after_airdrop: u64,
    pub min_airdrop_receivers: usize,
    pub min_active_receivers_rate: f64,

    /// §4.D #5 Erc721MultipleOwners thresholds. spec.md names these
    /// without canonical defaults (§6's table omits them); decided in
    /// DESIGN.md alongside the module's other open questions.
    pub min_duplicated_tokens_from_same_sender: usize,
    pub min_duplicated_tokens: usize,

    pub max_tokens_for_uri_sample: usize,
    pub min_duplicate_tokens: usize,

    pub max_honeypot_accounts: usize,
    pub min_honeypot_accounts: usize,
    pub min_honeypot_ratio: f64,
    pub honeypot_share_threshold: f64,

    pub creation_window: u64,
    pub token_creations_threshold: usize,

    pub sleep_mint_receivers_threshold: usize,

    pub high_activity_total_senders: usize,
    pub high_activity_window_senders: usize,
    pub high_activity_window: u64,

    pub observation_time: u64,

    pub phishing_description_budget: usize,

    pub weights: ModuleWeights,
}

/// Per-module weight contributing to HighActivity's `multiplier` (§6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleWeights {
    pub too_much_airdrop_activity: f64,
    pub low_activity_after_airdrop: f64,
    pub erc721_multiple_owners: f64,
    pub erc721_non_unique_tokens: f64,
    pub erc721_false_total_supply: f64,
    pub silent_mint: f64,
    pub sleep_mint: f64,
    pub too_many_token_creations: f64,
    pub phishing_metadata: f64,
    pub too_many_honeypot_owners: f64,
    pub honeypot_share_dominance: f64,
    pub token_impersonation: f64,
}

impl Default for ModuleWeights {
    fn default() -> Self {
        Self {
            too_much_airdrop_activity: 1.5,
            low_activity_after_airdrop: 1.3,
            erc721_multiple_owners: 4.0,
            erc721_non_unique_tokens: 4.0,
            erc721_false_total_supply: 4.0,
            silent_mint: 1.1,
            sleep_mint: 1.5,
            too_many_token_creations: 1.5,
            phishing_metadata: 4.0,
            too_many_honeypot_owners: 2.0,
            honeypot_share_dominance: 1.5,
            token_impersonation: 5.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(4 * 60 * 60),
            airdrop_window: 5 * DAY,
            min_rx_per_tx: 9,
            min_rx_per_sender: 20,
            provider_concurrency: 2,
            fetch_concurrency: 25,

            airdrop_duration_threshold: 30 * DAY,
            receivers_threshold: 15_000,

            delay_after_airdrop: 20 * DAY,
            min_airdrop_receivers: 200,
            min_active_receivers_rate: 0.0025,

            min_duplicated_tokens_from_same_sender: 2,
            min_duplicated_tokens: 3,

            max_tokens_for_uri_sample: 700,
            min_duplicate_tokens: 4,

            max_honeypot_accounts: 1000,
            min_honeypot_accounts: 100,
            min_honeypot_ratio: 0.35,
            honeypot_share_threshold: 0.5,

            creation_window: 90 * DAY,
            token_creations_threshold: 6,

            sleep_mint_receivers_threshold: 20,

            high_activity_total_senders: 400,
            high_activity_window_senders: 120,
            high_activity_window: 7 * DAY,

            observation_time: 124 * DAY,

            phishing_description_budget: 2000,

            weights: ModuleWeights::default(),
        }
    }
}

impl Config {
    /// §6 "NODE_ENV": development widens the provider/fetch pools.
    pub fn development() -> Self {
        Self {
            provider_concurrency: 40,
            fetch_concurrency: 50,
            ..Self::default()
        }
    }
}
