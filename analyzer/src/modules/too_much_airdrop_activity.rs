use super::airdrop::AirdropMetadata;
use super::keys::{AIRDROP, TOKEN_IMPERSONATION, TOO_MUCH_AIRDROP_ACTIVITY};
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

/// §4.D #3. Only meaningful when Airdrop or TokenImpersonation already
/// fired; a defensive presence check covers the case where neither did
/// (§9 "Design notes").
pub struct TooMuchAirdropActivity;

#[async_trait]
impl Module for TooMuchAirdropActivity {
    fn key(&self) -> &'static str {
        TOO_MUCH_AIRDROP_ACTIVITY
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        if !ctx.context.detected(AIRDROP) && !ctx.context.detected(TOKEN_IMPERSONATION) {
            return Ok(ScanOutcome::not_detected());
        }
        let Some(outcome) = ctx.context.get(AIRDROP) else {
            return Ok(ScanOutcome::not_detected());
        };
        let Some(metadata) = outcome.metadata.as_ref() else {
            return Ok(ScanOutcome::not_detected());
        };
        let airdrop: AirdropMetadata = serde_json::from_value(metadata.clone())?;

        let duration = airdrop.end_time.saturating_sub(airdrop.start_time);
        let config = ctx.services.config;
        if duration > config.airdrop_duration_threshold && airdrop.receivers.len() > config.receivers_threshold {
            return Ok(ScanOutcome::detected(json!({
                "durationSeconds": duration,
                "receivers": airdrop.receivers.len(),
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}
