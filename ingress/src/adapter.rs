//! §4.G Ingress Adapter.

use crate::decode::{decode_log, DecodedEvent};
use crate::types::TxEvent;
use anyhow::Result;
use eth::types::Standard;
use providers::ContractTypeIdentifier;
use std::collections::HashMap;
use std::sync::Arc;
use store::{DataStore, TokenContract, TxRef};

/// Routes chain-feed transaction events into the store, identifying
/// newly deployed token contracts along the way. Holds no mutable state
/// of its own beyond the contract-type identifier: the watchlist it
/// needs is passed in by the caller (the orchestrator, which owns it).
pub struct Adapter {
    contract_type: Arc<dyn ContractTypeIdentifier>,
}

impl Adapter {
    pub fn new(contract_type: Arc<dyn ContractTypeIdentifier>) -> Self {
        Self { contract_type }
    }

    /// §4.G: identifies newly deployed recognized-standard contracts from
    /// the trace output (caller adds them to the store/watchlist), then
    /// forwards the transaction into `store` iff it is addressed to a
    /// watched token or carries a log emitted by one, decoding each log
    /// against its emitting contract's known standard.
    pub fn handle_tx(
        &self,
        store: &mut DataStore,
        watched: &HashMap<eth::types::Address, Standard>,
        event: &TxEvent,
    ) -> Result<Vec<TokenContract>> {
        let new_tokens = self.detect_new_tokens(event);

        let to_watched = event.details.to.map(|to| watched.contains_key(&to)).unwrap_or(false);
        let log_watched = event.logs.iter().any(|log| watched.contains_key(&log.address));
        if !to_watched && !log_watched {
            return Ok(new_tokens);
        }

        let tx_id = store.add_transaction(&event.details)?;
        for log in &event.logs {
            let Some(standard) = watched.get(&log.address) else {
                continue;
            };
            match decode_log(*standard, log) {
                Some(decoded) => self.insert_event(store, log.address, tx_id.into(), log.log_index, decoded)?,
                // §7 "Parse error on a log: silently ignore the log
                // (defensive against non-standard emitters that share
                // topic hashes)".
                None => tracing::debug!(contract = %log.address, log_index = log.log_index, "unrecognized log, ignoring"),
            }
        }
        Ok(new_tokens)
    }

    fn detect_new_tokens(&self, event: &TxEvent) -> Vec<TokenContract> {
        event
            .created_contracts
            .iter()
            .filter_map(|creation| {
                let standard = self.contract_type.identify(&creation.code)?;
                Some(TokenContract {
                    address: creation.address,
                    deployer: event.details.from,
                    deployment_block: event.details.block_number as i64,
                    deployment_timestamp: event.details.block_timestamp as i64,
                    standard,
                })
            })
            .collect()
    }

    fn insert_event(
        &self,
        store: &mut DataStore,
        contract: eth::types::Address,
        tx: TxRef,
        log_index: i32,
        event: DecodedEvent,
    ) -> Result<()> {
        match event {
            DecodedEvent::Erc20Transfer { from, to, value } => {
                store.add_erc20_transfer_event(contract, tx, log_index, from, to, value)
            }
            DecodedEvent::Erc20Approval { owner, spender, value } => {
                store.add_erc20_approval_event(contract, tx, log_index, owner, spender, value)
            }
            DecodedEvent::Erc721Transfer { from, to, token_id } => {
                store.add_erc721_transfer_event(contract, tx, log_index, from, to, token_id)
            }
            DecodedEvent::Erc721Approval { owner, spender, token_id } => {
                store.add_erc721_approval_event(contract, tx, log_index, owner, spender, token_id)
            }
            DecodedEvent::Erc721ApprovalForAll { owner, operator, approved } => {
                store.add_erc721_approval_for_all_event(contract, tx, log_index, owner, operator, approved)
            }
            DecodedEvent::Erc1155TransferSingle { operator, from, to, token_id, value } => {
                store.add_erc1155_transfer_single_event(contract, tx, log_index, operator, from, to, token_id, value)
            }
            DecodedEvent::Erc1155TransferBatch { operator, from, to, ids, values } => {
                store.add_erc1155_transfer_batch_event(contract, tx, log_index, operator, from, to, &ids, &values)
            }
            DecodedEvent::Erc1155ApprovalForAll { owner, operator, approved } => {
                store.add_erc1155_approval_for_all_event(contract, tx, log_index, owner, operator, approved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContractCreation, LogEntry};
    use eth::types::{Address, Bytes32, TxDetails, U256};
    use providers::SelectorHeuristicIdentifier;

    fn tx(hash: u64, to: Option<Address>, block: u64) -> TxDetails {
        TxDetails {
            hash: hash.into(),
            from: Address::from(1u64),
            to,
            selector: [0; 4],
            block_number: block,
            block_timestamp: block * 12,
            position: 0,
        }
    }

    fn topic_for_address(address: Address) -> Bytes32 {
        let mut word = [0u8; 32];
        word[12..32].copy_from_slice(address.as_bytes());
        Bytes32::from(word)
    }

    fn word_for_u256(value: u64) -> Vec<u8> {
        let mut word = [0u8; 32];
        word[24..32].copy_from_slice(&value.to_be_bytes());
        word.to_vec()
    }

    fn transfer_topic0() -> Bytes32 {
        Bytes32::from(keccak_hash::keccak("Transfer(address,address,uint256)".as_bytes()).0)
    }

    #[test]
    fn ignores_unwatched_transactions() {
        let mut store = DataStore::new(":memory:").unwrap();
        let adapter = Adapter::new(Arc::new(SelectorHeuristicIdentifier));
        let event = TxEvent { details: tx(1, Some(Address::from(42u64)), 5), logs: vec![], created_contracts: vec![] };
        let new_tokens = adapter.handle_tx(&mut store, &HashMap::new(), &event).unwrap();
        assert!(new_tokens.is_empty());
        assert!(store.transactions(Some(Address::from(42u64))).unwrap().is_empty());
    }

    #[test]
    fn routes_a_watched_erc20_transfer_into_the_store() {
        let mut store = DataStore::new(":memory:").unwrap();
        let adapter = Adapter::new(Arc::new(SelectorHeuristicIdentifier));
        let token = Address::from(42u64);
        let from = Address::from(7u64);
        let to = Address::from(8u64);
        let log = LogEntry {
            address: token,
            topics: vec![transfer_topic0(), topic_for_address(from), topic_for_address(to)],
            data: word_for_u256(500),
            log_index: 0,
        };
        let event = TxEvent { details: tx(2, Some(token), 10), logs: vec![log], created_contracts: vec![] };
        let mut watched = HashMap::new();
        watched.insert(token, Standard::Erc20);
        adapter.handle_tx(&mut store, &watched, &event).unwrap();

        let transfers = store.erc20_transfer(token).unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].value, U256::from(500u64));
    }

    #[test]
    fn detects_a_new_token_contract_from_trace_output() {
        let adapter = Adapter::new(Arc::new(SelectorHeuristicIdentifier));
        let mut bytecode = vec![0x60, 0x80];
        for selector in [[0xa9, 0x05, 0x9c, 0xbb], [0x70, 0xa0, 0x82, 0x31]] {
            bytecode.push(0x63);
            bytecode.extend_from_slice(&selector);
        }
        let event = TxEvent {
            details: tx(3, None, 11),
            logs: vec![],
            created_contracts: vec![ContractCreation { address: Address::from(99u64), code: bytecode }],
        };
        let new_tokens = adapter.detect_new_tokens(&event);
        assert_eq!(new_tokens.len(), 1);
        assert_eq!(new_tokens[0].standard, Standard::Erc20);
        assert_eq!(new_tokens[0].deployer, Address::from(1u64));
    }
}
