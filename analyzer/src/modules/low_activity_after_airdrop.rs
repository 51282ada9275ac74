use super::airdrop::AirdropMetadata;
use super::keys::{AIRDROP, LOW_ACTIVITY_AFTER_AIRDROP};
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;

/// §4.D #4. A large airdrop that produced almost no subsequent sender
/// activity from its recipients is itself a spam signal.
pub struct LowActivityAfterAirdrop;

#[async_trait]
impl Module for LowActivityAfterAirdrop {
    fn key(&self) -> &'static str {
        LOW_ACTIVITY_AFTER_AIRDROP
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let Some(outcome) = ctx.context.get(AIRDROP) else {
            return Ok(ScanOutcome::not_detected());
        };
        let Some(metadata) = outcome.metadata.as_ref() else {
            return Ok(ScanOutcome::not_detected());
        };
        let airdrop: AirdropMetadata = serde_json::from_value(metadata.clone())?;
        let config = ctx.services.config;
        if airdrop.receivers.len() < config.min_airdrop_receivers {
            return Ok(ScanOutcome::not_detected());
        }

        let cutoff = airdrop.end_time.saturating_add(config.delay_after_airdrop);
        let receivers: HashSet<_> = airdrop.receivers.iter().copied().collect();

        let txs = ctx.services.transformer.transactions(ctx.token).await?;
        let active_after: HashSet<_> = txs
            .iter()
            .filter(|tx| tx.block_timestamp as u64 >= cutoff && receivers.contains(&tx.from))
            .map(|tx| tx.from)
            .collect();

        let threshold = (airdrop.receivers.len() as f64) * config.min_active_receivers_rate;
        if (active_after.len() as f64) < threshold {
            return Ok(ScanOutcome::detected(json!({
                "activeReceivers": active_after.len(),
                "totalReceivers": airdrop.receivers.len(),
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}
