use super::airdrop::AirdropMetadata;
use super::keys::{AIRDROP, TOO_MANY_HONEYPOT_OWNERS};
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use bigdecimal::Zero;
use serde_json::json;

/// §4.D #12. Recipients of the airdrop that are themselves honeypot
/// contracts — rather than real holders — mean the "distribution" never
/// reached genuine users.
pub struct TooManyHoneyPotOwners;

#[async_trait]
impl Module for TooManyHoneyPotOwners {
    fn key(&self) -> &'static str {
        TOO_MANY_HONEYPOT_OWNERS
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let Some(outcome) = ctx.context.get(AIRDROP) else {
            return Ok(ScanOutcome::not_detected());
        };
        let Some(metadata) = outcome.metadata.as_ref() else {
            return Ok(ScanOutcome::not_detected());
        };
        let airdrop: AirdropMetadata = serde_json::from_value(metadata.clone())?;

        let balances = ctx.services.transformer.balance_by_account(ctx.token).await?;
        let mut receivers = airdrop.receivers.clone();
        receivers.sort_by(|a, b| {
            let ba = balances.get(a).cloned().unwrap_or_else(bigdecimal::BigDecimal::zero);
            let bb = balances.get(b).cloned().unwrap_or_else(bigdecimal::BigDecimal::zero);
            bb.cmp(&ba)
        });

        let config = ctx.services.config;
        receivers.truncate(config.max_honeypot_accounts);

        let mut honeypots = 0usize;
        for &receiver in &receivers {
            let verdict = ctx
                .services
                .memoizer
                .memo(ctx.token, "honeypot", vec![receiver.to_string(), ctx.block_number.to_string()], {
                    let honeypot = ctx.services.honeypot.clone();
                    let block = ctx.block_number;
                    move || async move { honeypot.is_honeypot(receiver, block).await }
                })
                .await?;
            if verdict.is_honeypot {
                honeypots += 1;
            }
        }

        let ratio = if receivers.is_empty() { 0.0 } else { honeypots as f64 / receivers.len() as f64 };
        if honeypots >= config.min_honeypot_accounts || ratio >= config.min_honeypot_ratio {
            return Ok(ScanOutcome::detected(json!({
                "honeypotCount": honeypots,
                "sampled": receivers.len(),
                "ratio": ratio,
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}
