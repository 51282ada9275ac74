use super::airdrop::AirdropMetadata;
use super::keys::{AIRDROP, HONEYPOT_SHARE_DOMINANCE};
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use eth::types::Address;
use serde_json::json;
use std::collections::HashSet;

const TOP_N: usize = 100;

/// §4.D #13. A handful of honeypot-controlled addresses holding most of
/// the supply means the token never really circulated.
pub struct HoneypotShareDominance;

#[async_trait]
impl Module for HoneypotShareDominance {
    fn key(&self) -> &'static str {
        HONEYPOT_SHARE_DOMINANCE
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let Some(outcome) = ctx.context.get(AIRDROP) else {
            return Ok(ScanOutcome::not_detected());
        };
        let Some(metadata) = outcome.metadata.as_ref() else {
            return Ok(ScanOutcome::not_detected());
        };
        let airdrop: AirdropMetadata = serde_json::from_value(metadata.clone())?;

        let deployer = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?.map(|t| t.deployer)
        };

        // §4.D #13: "Over `balanceByAccount` (excluding deployer and
        // token contract)" — neither holder is a real distribution
        // target, so both are dropped before the share is computed.
        let mut balances = ctx.services.transformer.balance_by_account(ctx.token).await?;
        balances.remove(&ctx.token);
        if let Some(deployer) = deployer {
            balances.remove(&deployer);
        }
        // Guard against store artifacts: any negative balance invalidates
        // the derived shares for this scan (§4.D #13).
        if balances.values().any(|b| *b < BigDecimal::zero()) {
            return Ok(ScanOutcome::not_detected());
        }

        let total: BigDecimal = balances.values().cloned().sum();
        if total <= BigDecimal::zero() {
            return Ok(ScanOutcome::not_detected());
        }

        let burn = crate::util::burn_addresses();
        let senders: HashSet<Address> = airdrop.senders.iter().copied().collect();
        let mut candidates: Vec<(Address, BigDecimal)> = airdrop
            .receivers
            .iter()
            .filter(|r| !burn.contains(r) && !senders.contains(r))
            .filter_map(|r| balances.get(r).cloned().map(|b| (*r, b)))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        candidates.truncate(TOP_N);

        let mut honeypot_share = BigDecimal::zero();
        for (address, balance) in &candidates {
            let verdict = ctx
                .services
                .memoizer
                .memo(ctx.token, "honeypot", vec![address.to_string(), ctx.block_number.to_string()], {
                    let honeypot = ctx.services.honeypot.clone();
                    let address = *address;
                    let block = ctx.block_number;
                    move || async move { honeypot.is_honeypot(address, block).await }
                })
                .await?;
            if verdict.is_honeypot {
                honeypot_share += balance.clone();
            }
        }

        let share = (&honeypot_share / &total).to_string().parse::<f64>().unwrap_or(0.0);
        let config = ctx.services.config;
        if share > config.honeypot_share_threshold {
            return Ok(ScanOutcome::detected(json!({
                "share": share,
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}
