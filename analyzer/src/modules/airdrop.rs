use super::keys::AIRDROP;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use eth::types::{Address, Bytes32, Standard};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};

/// §4.D #2, core signal. Externalized shape read back by every later
/// module that depends on Airdrop's findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirdropMetadata {
    pub senders: Vec<Address>,
    pub receivers: Vec<Address>,
    pub tx_hashes: Vec<Bytes32>,
    pub transfers: Vec<AirdropTransfer>,
    pub start_time: u64,
    pub end_time: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AirdropTransfer {
    pub receiver: Address,
    pub timestamp: u64,
}

struct RawTransfer {
    sender: Address,
    receiver: Address,
    tx_hash: Bytes32,
    timestamp: u64,
}

pub struct Airdrop;

#[async_trait]
impl Module for Airdrop {
    fn key(&self) -> &'static str {
        AIRDROP
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let raw = collect_raw_transfers(ctx).await?;
        let cache_key = raw.len().to_string();
        let token = ctx.token;
        let config = *ctx.services.config;
        let memoizer = ctx.services.memoizer.clone();
        let provider = ctx.services.provider.clone();

        let outcome = memoizer
            .memo(token, "airdrop", vec![cache_key], move || async move { detect(raw, config, provider).await })
            .await?;

        match outcome {
            Some(metadata) => Ok(ScanOutcome::detected(json!(metadata))),
            None => Ok(ScanOutcome::not_detected().interrupting()),
        }
    }
}

/// Every transfer-shaped event this token has emitted, annotated with the
/// initiating transaction's `from` and timestamp (§4.D #2: "the
/// transaction's `from`").
async fn collect_raw_transfers(ctx: &mut ScanContext<'_>) -> Result<Vec<RawTransfer>> {
    let standard = {
        let mut store = ctx.services.store.lock().await;
        store.token(ctx.token)?.map(|t| t.standard)
    };
    let transactions = ctx.services.transformer.transactions(ctx.token).await?;
    let mut by_hash = HashMap::new();
    for tx in &transactions {
        by_hash.insert(tx.hash, (tx.from, tx.block_timestamp as u64));
    }

    let mut out = Vec::new();
    let mut store = ctx.services.store.lock().await;
    match standard {
        Some(Standard::Erc20) => {
            for event in store.erc20_transfer(ctx.token)? {
                if event.value.to_string() == "0" {
                    continue;
                }
                if let Some(&(sender, timestamp)) = by_hash.get(&event.meta.tx_hash) {
                    out.push(RawTransfer { sender, receiver: event.to, tx_hash: event.meta.tx_hash, timestamp });
                }
            }
        }
        Some(Standard::Erc721) => {
            for event in store.erc721_transfer(ctx.token)? {
                if let Some(&(sender, timestamp)) = by_hash.get(&event.meta.tx_hash) {
                    out.push(RawTransfer { sender, receiver: event.to, tx_hash: event.meta.tx_hash, timestamp });
                }
            }
        }
        Some(Standard::Erc1155) => {
            for event in store.erc1155_transfer_single(ctx.token)? {
                if event.value.to_string() == "0" {
                    continue;
                }
                if let Some(&(sender, timestamp)) = by_hash.get(&event.meta.tx_hash) {
                    out.push(RawTransfer { sender, receiver: event.to, tx_hash: event.meta.tx_hash, timestamp });
                }
            }
            for event in store.erc1155_transfer_batch(ctx.token)? {
                if event.values.iter().all(|v| v.to_string() == "0") {
                    continue;
                }
                if let Some(&(sender, timestamp)) = by_hash.get(&event.meta.tx_hash) {
                    out.push(RawTransfer { sender, receiver: event.to, tx_hash: event.meta.tx_hash, timestamp });
                }
            }
        }
        None => {}
    }
    // "ignore claims": the initiating tx's sender receiving their own transfer.
    out.retain(|t| t.sender != t.receiver);
    Ok(out)
}

async fn detect(
    raw: Vec<RawTransfer>,
    config: crate::config::Config,
    provider: std::sync::Arc<dyn eth::rpc::EthNodeReading>,
) -> Result<Option<AirdropMetadata>> {
    let mut by_sender: HashMap<Address, Vec<&RawTransfer>> = HashMap::new();
    for t in &raw {
        by_sender.entry(t.sender).or_default().push(t);
    }

    let mut candidates = Vec::new();
    for (&sender, transfers) in &by_sender {
        let by_tx_max = {
            let mut per_tx: HashMap<Bytes32, HashSet<Address>> = HashMap::new();
            for t in transfers.iter() {
                per_tx.entry(t.tx_hash).or_default().insert(t.receiver);
            }
            per_tx.values().map(|s| s.len()).max().unwrap_or(0)
        };
        let windowed = crate::util::max_distinct_in_sliding_window(
            &transfers.iter().map(|t| (t.receiver, t.timestamp)).collect::<Vec<_>>(),
            config.airdrop_window,
        );
        if by_tx_max >= config.min_rx_per_tx || windowed > config.min_rx_per_sender {
            candidates.push(sender);
        }
    }

    let mut retained_senders = Vec::new();
    let mut retained_transfers: Vec<&RawTransfer> = Vec::new();
    for sender in candidates {
        let transfers = &by_sender[&sender];
        let receivers: Vec<Address> = transfers.iter().map(|t| t.receiver).collect::<HashSet<_>>().into_iter().collect();
        // The provider itself bounds concurrency to PROVIDER_CONCURRENCY (§5);
        // callers just issue the batch.
        let eoa_flags = provider.is_eoa(&receivers).await;
        let eoa_count = receivers.iter().filter(|r| *eoa_flags.get(r).unwrap_or(&false)).count();
        if eoa_count > config.min_rx_per_sender {
            retained_senders.push(sender);
            retained_transfers.extend(transfers.iter().copied());
        }
    }

    if retained_senders.is_empty() {
        return Ok(None);
    }

    let receivers: Vec<Address> = retained_transfers.iter().map(|t| t.receiver).collect::<HashSet<_>>().into_iter().collect();
    let tx_hashes: Vec<Bytes32> = retained_transfers.iter().map(|t| t.tx_hash).collect::<HashSet<_>>().into_iter().collect();
    let transfers: Vec<AirdropTransfer> = retained_transfers
        .iter()
        .map(|t| AirdropTransfer { receiver: t.receiver, timestamp: t.timestamp })
        .collect();
    let start_time = transfers.iter().map(|t| t.timestamp).min().unwrap_or(0);
    let end_time = transfers.iter().map(|t| t.timestamp).max().unwrap_or(0);

    Ok(Some(AirdropMetadata {
        senders: retained_senders,
        receivers,
        tx_hashes,
        transfers,
        start_time,
        end_time,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_are_excluded_before_grouping() {
        let a = Address::from(1u64);
        let raw = vec![RawTransfer { sender: a, receiver: a, tx_hash: 1u64.into(), timestamp: 0 }];
        let mut filtered = raw;
        filtered.retain(|t| t.sender != t.receiver);
        assert!(filtered.is_empty());
    }
}
