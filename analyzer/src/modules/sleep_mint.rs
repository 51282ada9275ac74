use super::airdrop::AirdropMetadata;
use super::keys::{AIRDROP, SLEEP_MINT};
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use eth::types::{Address, Bytes32, Standard};
use serde_json::json;
use std::collections::{HashMap, HashSet};

/// §4.D #9. A transfer whose transaction was initiated by a party other
/// than the token owner, and which the owner never approved, implies the
/// transfer was forged by a party that "put the owner to sleep".
pub struct SleepMint;

#[async_trait]
impl Module for SleepMint {
    fn key(&self) -> &'static str {
        SLEEP_MINT
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let Some(outcome) = ctx.context.get(AIRDROP) else {
            return Ok(ScanOutcome::not_detected());
        };
        let Some(metadata) = outcome.metadata.as_ref() else {
            return Ok(ScanOutcome::not_detected());
        };
        let airdrop: AirdropMetadata = serde_json::from_value(metadata.clone())?;
        let airdrop_txs: HashSet<Bytes32> = airdrop.tx_hashes.into_iter().collect();

        let token_row = {
            let mut store = ctx.services.store.lock().await;
            store.token(ctx.token)?
        };
        let Some(token_row) = token_row else {
            return Ok(ScanOutcome::not_detected());
        };

        let transactions = ctx.services.transformer.transactions(ctx.token).await?;
        let mut tx_senders: HashMap<Bytes32, Address> = HashMap::new();
        for tx in &transactions {
            tx_senders.insert(tx.hash, tx.from);
        }

        let direct_approvals = collect_direct_approvals(ctx, token_row.standard, &tx_senders).await?;

        let candidates = collect_candidates(ctx, token_row.standard, &airdrop_txs, &tx_senders, &direct_approvals, ctx.token, token_row.deployer).await?;

        let retained = if token_row.standard == Standard::Erc20 {
            filter_erc20_exceptions(ctx, candidates, ctx.services.config.sleep_mint_receivers_threshold, &transactions).await?
        } else {
            candidates
        };

        let distinct_receivers: HashSet<Address> = retained.iter().map(|c| c.receiver).collect();
        if distinct_receivers.len() > ctx.services.config.sleep_mint_receivers_threshold {
            return Ok(ScanOutcome::detected(json!({
                "receivers": distinct_receivers.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
            })));
        }
        Ok(ScanOutcome::not_detected())
    }
}

#[derive(Debug, Clone, Copy)]
struct SleepMintCandidate {
    tx_hash: Bytes32,
    owner: Address,
    sender: Address,
    receiver: Address,
    timestamp: u64,
}

/// Spenders each owner approved from a transaction the owner themselves
/// submitted (§4.D #9: "direct approvals"). Approvals submitted by a
/// third party ("passive") never authorize a sender on the owner's
/// behalf, so they are not retained here.
async fn collect_direct_approvals(
    ctx: &mut ScanContext<'_>,
    standard: Standard,
    tx_senders: &HashMap<Bytes32, Address>,
) -> Result<HashMap<Address, HashSet<Address>>> {
    let mut direct: HashMap<Address, HashSet<Address>> = HashMap::new();
    let mut store = ctx.services.store.lock().await;
    match standard {
        Standard::Erc20 => {
            for event in store.erc20_approval(ctx.token)? {
                if tx_senders.get(&event.meta.tx_hash) == Some(&event.owner) {
                    direct.entry(event.owner).or_default().insert(event.spender);
                }
            }
        }
        Standard::Erc721 => {
            for event in store.erc721_approval(ctx.token)? {
                if tx_senders.get(&event.meta.tx_hash) == Some(&event.owner) {
                    direct.entry(event.owner).or_default().insert(event.spender);
                }
            }
            for event in store.erc721_approval_for_all(ctx.token)? {
                if event.approved && tx_senders.get(&event.meta.tx_hash) == Some(&event.owner) {
                    direct.entry(event.owner).or_default().insert(event.operator);
                }
            }
        }
        Standard::Erc1155 => {
            for event in store.erc1155_approval_for_all(ctx.token)? {
                if event.approved && tx_senders.get(&event.meta.tx_hash) == Some(&event.owner) {
                    direct.entry(event.owner).or_default().insert(event.operator);
                }
            }
        }
    }
    Ok(direct)
}

async fn collect_candidates(
    ctx: &mut ScanContext<'_>,
    standard: Standard,
    airdrop_txs: &HashSet<Bytes32>,
    tx_senders: &HashMap<Bytes32, Address>,
    direct_approvals: &HashMap<Address, HashSet<Address>>,
    contract: Address,
    deployer: Address,
) -> Result<Vec<SleepMintCandidate>> {
    let burn = crate::util::burn_addresses();
    let mut out = Vec::new();
    let mut flag = |tx_hash: Bytes32, from: Address, to: Address, timestamp: u64, out: &mut Vec<SleepMintCandidate>| {
        if !airdrop_txs.contains(&tx_hash) {
            return;
        }
        let Some(&sender) = tx_senders.get(&tx_hash) else {
            return;
        };
        if from == Address::zero() {
            return;
        }
        if sender == from || sender == to {
            return;
        }
        if from == contract || from == deployer {
            return;
        }
        if burn.contains(&to) || to == deployer {
            return;
        }
        if direct_approvals.get(&from).map(|s| s.contains(&sender)).unwrap_or(false) {
            return;
        }
        out.push(SleepMintCandidate { tx_hash, owner: from, sender, receiver: to, timestamp });
    };

    let mut store = ctx.services.store.lock().await;
    let mut timestamps: HashMap<Bytes32, u64> = HashMap::new();
    match standard {
        Standard::Erc20 => {
            for event in store.erc20_transfer(ctx.token)? {
                let ts = *timestamps.entry(event.meta.tx_hash).or_insert(0);
                flag(event.meta.tx_hash, event.from, event.to, ts, &mut out);
            }
        }
        Standard::Erc721 => {
            for event in store.erc721_transfer(ctx.token)? {
                let ts = *timestamps.entry(event.meta.tx_hash).or_insert(0);
                flag(event.meta.tx_hash, event.from, event.to, ts, &mut out);
            }
        }
        Standard::Erc1155 => {
            for event in store.erc1155_transfer_single(ctx.token)? {
                let ts = *timestamps.entry(event.meta.tx_hash).or_insert(0);
                flag(event.meta.tx_hash, event.from, event.to, ts, &mut out);
            }
            for event in store.erc1155_transfer_batch(ctx.token)? {
                let ts = *timestamps.entry(event.meta.tx_hash).or_insert(0);
                flag(event.meta.tx_hash, event.from, event.to, ts, &mut out);
            }
        }
    }
    drop(store);

    // Resolve actual timestamps from the transaction list (§4.D #9's
    // Disperse-style exclusion needs real ordering, not insertion order).
    let transactions = ctx.services.transformer.transactions(ctx.token).await?;
    let mut tx_timestamps: HashMap<Bytes32, u64> = HashMap::new();
    for tx in transactions {
        tx_timestamps.insert(tx.hash, tx.block_timestamp as u64);
    }
    for candidate in &mut out {
        candidate.timestamp = tx_timestamps.get(&candidate.tx_hash).copied().unwrap_or(0);
    }
    Ok(out)
}

/// ERC-20-only exceptions (§4.D #9): aggregators legitimately fan out a
/// single owner's tokens to many receivers, so the additional checks
/// narrow candidates down to genuine sleep mints.
async fn filter_erc20_exceptions(
    ctx: &mut ScanContext<'_>,
    candidates: Vec<SleepMintCandidate>,
    receivers_threshold: usize,
    transactions: &[store::Transaction],
) -> Result<Vec<SleepMintCandidate>> {
    let mut by_group: HashMap<(Bytes32, Address), Vec<SleepMintCandidate>> = HashMap::new();
    for candidate in candidates {
        by_group.entry((candidate.tx_hash, candidate.owner)).or_default().push(candidate);
    }

    let mut retained = Vec::new();
    for ((_, owner), group) in by_group {
        let distinct_receivers: HashSet<Address> = group.iter().map(|c| c.receiver).collect();
        if distinct_receivers.len() <= receivers_threshold {
            continue;
        }
        let sender = group[0].sender;

        if ctx.services.provider.allowance(ctx.token, owner, sender).await.map(|a| a.to_string() != "0").unwrap_or(false) {
            continue;
        }

        let earliest = group.iter().map(|c| c.timestamp).min().unwrap_or(0);
        let sender_funded_owner_first = transactions
            .iter()
            .any(|tx| tx.from == sender && tx.to == Some(owner) && (tx.block_timestamp as u64) < earliest);
        if sender_funded_owner_first {
            continue;
        }

        if ctx.services.provider.pair_tokens(sender).await.is_some() {
            continue;
        }

        retained.extend(group);
    }
    Ok(retained)
}
