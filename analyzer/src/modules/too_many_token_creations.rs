use super::keys::TOO_MANY_TOKEN_CREATIONS;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

/// §4.D #10. A deployer that repeatedly spins up new token contracts in a
/// short span is a hallmark of spam-token factories.
pub struct TooManyTokenCreations;

#[async_trait]
impl Module for TooManyTokenCreations {
    fn key(&self) -> &'static str {
        TOO_MANY_TOKEN_CREATIONS
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let token_row = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?
        };
        let Some(token_row) = token_row else {
            return Ok(ScanOutcome::not_detected());
        };

        let mut deployments: Vec<u64> = {
            let mut store = ctx.services.store.lock().await;
            store
                .tokens()?
                .into_iter()
                .filter(|t| t.deployer == token_row.deployer)
                .map(|t| t.deployment_timestamp as u64)
                .collect()
        };
        deployments.sort();

        let config = ctx.services.config;
        let max_in_window = sliding_window_max_count(&deployments, config.creation_window);
        if max_in_window > config.token_creations_threshold {
            return Ok(ScanOutcome::detected(json!({
                "deployer": token_row.deployer.to_string(),
                "maxInWindow": max_in_window,
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}

fn sliding_window_max_count(sorted_timestamps: &[u64], window: u64) -> usize {
    let mut best = 0;
    let mut start = 0;
    for end in 0..sorted_timestamps.len() {
        while sorted_timestamps[end].saturating_sub(sorted_timestamps[start]) > window {
            start += 1;
        }
        best = best.max(end - start + 1);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_the_densest_window() {
        let deployments = vec![0, 1, 2, 100, 101];
        assert_eq!(sliding_window_max_count(&deployments, 5), 3);
    }
}
