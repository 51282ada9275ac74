use super::keys::ERC721_MULTIPLE_OWNERS;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use eth::types::{Address, Standard, U256};
use serde_json::json;
use std::collections::HashMap;

/// §4.D #5, ERC-721 only. An on-chain "owner" re-assigned outside the
/// sequence of observed transfers implies the same tokenId was minted or
/// transferred to two different holders.
pub struct Erc721MultipleOwners;

#[async_trait]
impl Module for Erc721MultipleOwners {
    fn key(&self) -> &'static str {
        ERC721_MULTIPLE_OWNERS
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let standard = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?.map(|t| t.standard)
        };
        if standard != Some(Standard::Erc721) {
            return Ok(ScanOutcome::not_detected());
        }

        let events = {
            let mut store = ctx.services.store.lock().await;
            store.erc721_transfer(ctx.token)?
        };

        // Group by block, then by tokenId, ordered by (tx_index, log_index)
        // within each block (§4.D #5).
        let mut by_block: HashMap<i64, Vec<_>> = HashMap::new();
        for event in events {
            by_block.entry(event.meta.block_number).or_default().push(event);
        }

        let mut duplicated_token_ids: Vec<U256> = Vec::new();
        let mut duplicates_by_sender: HashMap<Address, usize> = HashMap::new();

        let mut blocks: Vec<i64> = by_block.keys().copied().collect();
        blocks.sort();
        for block in blocks {
            let mut by_token: HashMap<U256, Vec<_>> = HashMap::new();
            for event in &by_block[&block] {
                by_token.entry(event.token_id).or_default().push(event);
            }
            let mut confirmed_this_block = false;
            for (token_id, mut events) in by_token {
                events.sort_by_key(|e| (e.meta.tx_index, e.meta.log_index));
                for window in events.windows(2) {
                    let (prev, curr) = (window[0], window[1]);
                    let same_log = prev.meta.log_index == curr.meta.log_index && prev.meta.tx_index == curr.meta.tx_index;
                    if same_log || prev.to == curr.from {
                        continue;
                    }
                    // Only the first anomaly per block is confirmed on-chain
                    // (§4.D #5): subsequent candidates in the same block are
                    // assumed consistent with the confirmed one.
                    let confirmed = if confirmed_this_block {
                        true
                    } else {
                        let before = ctx.services.provider.owner_of(ctx.token, token_id, (block - 1).max(0) as u64).await;
                        let at = ctx.services.provider.owner_of(ctx.token, token_id, block as u64).await;
                        confirmed_this_block = true;
                        before.is_some() && before == at
                    };
                    if confirmed {
                        duplicated_token_ids.push(token_id);
                        *duplicates_by_sender.entry(curr.from).or_insert(0) += 1;
                    }
                }
            }
        }

        let config = ctx.services.config;
        let max_from_one_sender = duplicates_by_sender.values().copied().max().unwrap_or(0);
        let distinct_duplicated = duplicated_token_ids.len();
        if max_from_one_sender >= config.min_duplicated_tokens_from_same_sender
            || distinct_duplicated >= config.min_duplicated_tokens
        {
            return Ok(ScanOutcome::detected(json!({
                "duplicatedTokenIds": duplicated_token_ids.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
                "maxFromOneSender": max_from_one_sender,
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}
