//! The fixed module battery (§4.D) and its execution order. `battery()`
//! is the only place this order is written down; the analyzer iterates
//! it verbatim and honors each module's `interrupt`.

pub mod keys;

mod airdrop;
mod erc721_false_total_supply;
mod erc721_multiple_owners;
mod erc721_non_unique_tokens;
mod high_activity;
mod honeypot_share_dominance;
mod low_activity_after_airdrop;
mod observation_time;
mod phishing_metadata;
mod silent_mint;
mod sleep_mint;
mod token_impersonation;
mod too_many_honeypot_owners;
mod too_many_token_creations;
mod too_much_airdrop_activity;

pub use airdrop::{Airdrop, AirdropMetadata};
pub use erc721_false_total_supply::Erc721FalseTotalSupply;
pub use erc721_multiple_owners::Erc721MultipleOwners;
pub use erc721_non_unique_tokens::Erc721NonUniqueTokens;
pub use high_activity::HighActivity;
pub use honeypot_share_dominance::HoneypotShareDominance;
pub use low_activity_after_airdrop::LowActivityAfterAirdrop;
pub use observation_time::ObservationTime;
pub use phishing_metadata::PhishingMetadata;
pub use silent_mint::SilentMint;
pub use sleep_mint::SleepMint;
pub use token_impersonation::TokenImpersonation;
pub use too_many_honeypot_owners::TooManyHoneyPotOwners;
pub use too_many_token_creations::TooManyTokenCreations;
pub use too_much_airdrop_activity::TooMuchAirdropActivity;

use crate::module::Module;

/// §4.D "Fixed execution order (the analyzer respects this exact
/// sequence; interrupt halts remaining modules)".
pub fn battery() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(TokenImpersonation),
        Box::new(Airdrop),
        Box::new(TooMuchAirdropActivity),
        Box::new(LowActivityAfterAirdrop),
        Box::new(Erc721MultipleOwners),
        Box::new(Erc721NonUniqueTokens),
        Box::new(Erc721FalseTotalSupply),
        Box::new(SilentMint),
        Box::new(SleepMint),
        Box::new(TooManyTokenCreations),
        Box::new(PhishingMetadata),
        Box::new(TooManyHoneyPotOwners),
        Box::new(HoneypotShareDominance),
        Box::new(HighActivity),
        Box::new(ObservationTime),
    ]
}
