use super::keys::OBSERVATION_TIME;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

/// §4.D #15. A token that has simply been watched long enough without
/// graduating to any other signal is retired from the watchlist.
pub struct ObservationTime;

#[async_trait]
impl Module for ObservationTime {
    fn key(&self) -> &'static str {
        OBSERVATION_TIME
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let token_row = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?
        };
        let Some(token_row) = token_row else {
            return Ok(ScanOutcome::not_detected());
        };

        let age = ctx.timestamp.saturating_sub(token_row.deployment_timestamp as u64);
        if age > ctx.services.config.observation_time {
            return Ok(ScanOutcome::detected(json!({ "ageSeconds": age })).interrupting());
        }
        Ok(ScanOutcome::not_detected())
    }
}
