use super::keys::TOKEN_IMPERSONATION;
use crate::module::{Module, ScanContext, ScanOutcome};
use crate::util::name_symbol_hash;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

/// §4.D #1. Hashes `"<name> (<symbol>)"` and flags this token if a known
/// record shares the hash but does not list this address among its
/// legitimate deployments.
pub struct TokenImpersonation;

#[async_trait]
impl Module for TokenImpersonation {
    fn key(&self) -> &'static str {
        TOKEN_IMPERSONATION
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let details = ctx
            .services
            .provider
            .get_contract_details(&[ctx.token])
            .await
            .get(&ctx.token)
            .cloned()
            .unwrap_or_default();
        let (Some(name), Some(symbol)) = (details.name, details.symbol) else {
            return Ok(ScanOutcome::not_detected());
        };
        let hash = name_symbol_hash(&name, &symbol);

        let known = ctx.services.known_tokens.known_tokens().await?;
        let leaders = ctx.services.leaderboard.leaders().await.unwrap_or_default();
        if leaders.contains(&ctx.token) {
            return Ok(ScanOutcome::not_detected());
        }

        for record in known {
            if record.name_hash == hash && !record.deployments.contains(&ctx.token) {
                return Ok(ScanOutcome::detected(json!({
                    "impersonated": record.deployments,
                    "name": name,
                    "symbol": symbol,
                })));
            }
        }
        Ok(ScanOutcome::not_detected())
    }
}
