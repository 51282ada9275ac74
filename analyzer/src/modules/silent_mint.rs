use super::keys::SILENT_MINT;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use eth::types::Standard;
use serde_json::json;

/// §4.D #8, ERC-20 only. A negative net balance for an account other
/// than the deployer or the token contract itself is only explainable by
/// a mint that never emitted a `Transfer`.
pub struct SilentMint;

#[async_trait]
impl Module for SilentMint {
    fn key(&self) -> &'static str {
        SILENT_MINT
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let token_row = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?
        };
        let Some(token_row) = token_row else {
            return Ok(ScanOutcome::not_detected());
        };
        if token_row.standard != Standard::Erc20 {
            return Ok(ScanOutcome::not_detected());
        }

        let balances = ctx.services.transformer.balance_by_account(ctx.token).await?;
        let negative: Vec<_> = balances
            .into_iter()
            .filter(|(account, balance)| {
                *account != token_row.deployer && *account != ctx.token && *balance < BigDecimal::zero()
            })
            .collect();

        if negative.is_empty() {
            return Ok(ScanOutcome::not_detected());
        }
        Ok(ScanOutcome::detected(json!({
            "accounts": negative.iter().map(|(a, _)| a.to_string()).collect::<Vec<_>>(),
        })))
    }
}
