use super::keys::ERC721_FALSE_TOTAL_SUPPLY;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use eth::types::Standard;
use serde_json::json;

/// §4.D #7, ERC-721 only. Only under-declaration is flagged — more
/// distinct holders than the contract admits to implies tokens were
/// minted outside the observed event stream.
pub struct Erc721FalseTotalSupply;

#[async_trait]
impl Module for Erc721FalseTotalSupply {
    fn key(&self) -> &'static str {
        ERC721_FALSE_TOTAL_SUPPLY
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let standard = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?.map(|t| t.standard)
        };
        if standard != Some(Standard::Erc721) {
            return Ok(ScanOutcome::not_detected());
        }

        let token = ctx.token;
        let block = ctx.block_number;
        let provider = ctx.services.provider.clone();
        let declared = ctx
            .services
            .memoizer
            .memo(token, "erc721_total_supply", vec![block.to_string()], move || async move {
                Ok(provider.total_supply(token, block).await)
            })
            .await?;
        let Some(declared) = declared else {
            // "totalSupply is implemented" memoized as false via the
            // cached `None` itself — nothing further to detect.
            return Ok(ScanOutcome::not_detected());
        };

        let balances = ctx.services.transformer.balance_by_account(ctx.token).await?;
        let actual = balances
            .into_iter()
            .filter(|(account, balance)| !crate::util::is_burn(*account) && *balance > BigDecimal::zero())
            .count();
        let declared_bd = declared.to_big_decimal();

        if BigDecimal::from(actual as i64) > declared_bd {
            return Ok(ScanOutcome::detected(json!({
                "declaredTotalSupply": declared.to_string(),
                "actualTotalSupply": actual,
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}
