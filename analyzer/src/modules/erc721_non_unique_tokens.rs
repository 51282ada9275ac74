use super::keys::ERC721_NON_UNIQUE_TOKENS;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use eth::types::{Standard, U256};
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde_json::json;
use std::collections::HashMap;

/// §4.D #6, ERC-721 only. Distinct tokenIds resolving to the same
/// `tokenURI` (or, failing that, the same metadata body) imply the
/// "unique collectible" premise of the standard is fake.
pub struct Erc721NonUniqueTokens;

#[async_trait]
impl Module for Erc721NonUniqueTokens {
    fn key(&self) -> &'static str {
        ERC721_NON_UNIQUE_TOKENS
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let standard = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?.map(|t| t.standard)
        };
        if standard != Some(Standard::Erc721) {
            return Ok(ScanOutcome::not_detected());
        }

        let mut token_ids: Vec<U256> = {
            let mut store = ctx.services.store.lock().await;
            let mut ids: Vec<U256> = store.erc721_transfer(ctx.token)?.into_iter().map(|e| e.token_id).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        if token_ids.is_empty() {
            return Ok(ScanOutcome::not_detected());
        }

        let config = ctx.services.config;
        if token_ids.len() > config.max_tokens_for_uri_sample {
            token_ids.shuffle(&mut thread_rng());
            token_ids.truncate(config.max_tokens_for_uri_sample);
        }

        let pairs: Vec<(eth::types::Address, U256)> = token_ids.iter().map(|id| (ctx.token, *id)).collect();
        let uris = ctx.services.provider.get_token_uris(&pairs).await;

        let mut by_uri: HashMap<String, Vec<U256>> = HashMap::new();
        for (token_id, uri) in token_ids.iter().zip(token_ids.iter().map(|id| uris.get(&(ctx.token, *id)).cloned().flatten())) {
            if let Some(uri) = uri {
                by_uri.entry(uri).or_default().push(*token_id);
            }
        }

        let duplicate_uri_groups: Vec<&Vec<U256>> = by_uri.values().filter(|ids| ids.len() >= 2).collect();
        if duplicate_uri_groups.len() >= config.min_duplicate_tokens {
            let duplicated_token_ids: Vec<String> =
                duplicate_uri_groups.iter().flat_map(|ids| ids.iter()).map(|id| id.to_string()).collect();
            return Ok(ScanOutcome::detected(json!({
                "duplicationType": "uri",
                "duplicatedTokenIds": duplicated_token_ids,
            })));
        }

        // URIs alone didn't clear the bar; resolve each URI's body and
        // group by its canonical JSON serialization instead (§4.D #6).
        // A fetch that ultimately fails after retries degrades this
        // module to not-detected rather than failing the scan — a prior
        // positive result is never overwritten by a transient outage.
        let mut by_metadata: HashMap<String, Vec<U256>> = HashMap::new();
        for (uri, ids) in &by_uri {
            let body = match ctx.services.metadata_fetcher.fetch(uri).await {
                Ok(body) => body,
                Err(_) => continue,
            };
            let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) else {
                continue;
            };
            by_metadata.entry(crate::util::canonical_json(&value)).or_default().extend(ids.iter().copied());
        }

        let duplicate_metadata_groups: Vec<&Vec<U256>> = by_metadata.values().filter(|ids| ids.len() >= 2).collect();
        if duplicate_metadata_groups.len() >= config.min_duplicate_tokens {
            let duplicated_token_ids: Vec<String> =
                duplicate_metadata_groups.iter().flat_map(|ids| ids.iter()).map(|id| id.to_string()).collect();
            return Ok(ScanOutcome::detected(json!({
                "duplicationType": "metadata",
                "duplicatedTokenIds": duplicated_token_ids,
            })));
        }

        Ok(ScanOutcome::not_detected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_grouping_ignores_field_order() {
        let a = serde_json::json!({"name": "n", "image": "i"});
        let b = serde_json::json!({"image": "i", "name": "n"});
        assert_eq!(crate::util::canonical_json(&a), crate::util::canonical_json(&b));
    }
}
