use super::keys::{
    ERC721_FALSE_TOTAL_SUPPLY, ERC721_MULTIPLE_OWNERS, ERC721_NON_UNIQUE_TOKENS, HIGH_ACTIVITY, HONEYPOT_SHARE_DOMINANCE,
    LOW_ACTIVITY_AFTER_AIRDROP, PHISHING_METADATA, SILENT_MINT, SLEEP_MINT, TOKEN_IMPERSONATION, TOO_MANY_HONEYPOT_OWNERS,
    TOO_MANY_TOKEN_CREATIONS, TOO_MUCH_AIRDROP_ACTIVITY,
};
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;

/// §4.D #14. Always runs last: a token with genuinely broad, sustained
/// activity is unlikely to be spam regardless of what else fired, so its
/// detection interrupts and finalizes the scan.
pub struct HighActivity;

#[async_trait]
impl Module for HighActivity {
    fn key(&self) -> &'static str {
        HIGH_ACTIVITY
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let weights = ctx.services.config.weights;
        let multiplier = [
            (TOO_MUCH_AIRDROP_ACTIVITY, weights.too_much_airdrop_activity),
            (LOW_ACTIVITY_AFTER_AIRDROP, weights.low_activity_after_airdrop),
            (ERC721_MULTIPLE_OWNERS, weights.erc721_multiple_owners),
            (ERC721_NON_UNIQUE_TOKENS, weights.erc721_non_unique_tokens),
            (ERC721_FALSE_TOTAL_SUPPLY, weights.erc721_false_total_supply),
            (SILENT_MINT, weights.silent_mint),
            (SLEEP_MINT, weights.sleep_mint),
            (TOO_MANY_TOKEN_CREATIONS, weights.too_many_token_creations),
            (PHISHING_METADATA, weights.phishing_metadata),
            (TOO_MANY_HONEYPOT_OWNERS, weights.too_many_honeypot_owners),
            (HONEYPOT_SHARE_DOMINANCE, weights.honeypot_share_dominance),
            (TOKEN_IMPERSONATION, weights.token_impersonation),
        ]
        .into_iter()
        .filter(|(key, _)| ctx.context.detected(key))
        .map(|(_, weight)| weight)
        .product::<f64>()
        .max(1.0);

        let transactions = ctx.services.transformer.transactions(ctx.token).await?;
        let senders: HashSet<_> = transactions.iter().map(|tx| tx.from).collect();

        let config = ctx.services.config;
        let total_threshold = (config.high_activity_total_senders as f64 * multiplier) as usize;
        if senders.len() > total_threshold {
            return Ok(ScanOutcome::detected(json!({ "uniqueSenders": senders.len(), "multiplier": multiplier }))
                .interrupting());
        }

        let events: Vec<(eth::types::Address, u64)> =
            transactions.iter().map(|tx| (tx.from, tx.block_timestamp as u64)).collect();
        let windowed = crate::util::max_distinct_in_sliding_window(&events, config.high_activity_window);
        let window_threshold = (config.high_activity_window_senders as f64 * multiplier) as usize;
        if windowed >= window_threshold {
            return Ok(
                ScanOutcome::detected(json!({ "windowedUniqueSenders": windowed, "multiplier": multiplier })).interrupting()
            );
        }

        Ok(ScanOutcome::not_detected())
    }
}
