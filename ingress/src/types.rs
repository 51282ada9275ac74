//! §6 "Inputs (from chain feed, each record)": the raw shapes the
//! upstream chain reader hands to the ingress adapter. These are not
//! persisted as-is — they are consumed once by [`crate::Adapter`] and
//! reduced into the store's normalized schema (§3).

use eth::types::{Address, Bytes32, TxDetails};

/// One emitted log, pre-split into topics and data the way an RPC
/// `eth_getLogs`/trace response already presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<Bytes32>,
    pub data: Vec<u8>,
    pub log_index: i32,
}

/// A contract created within the transaction's trace, bytecode included
/// so [`providers::ContractTypeIdentifier`] can classify it without a
/// further round-trip (§4.G step 1-2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCreation {
    pub address: Address,
    pub code: Vec<u8>,
}

/// A transaction event as the chain feed presents it (§6): the
/// transaction itself, its logs, and any contracts its trace created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEvent {
    pub details: TxDetails,
    pub logs: Vec<LogEntry>,
    pub created_contracts: Vec<ContractCreation>,
}

/// §6 Block event: just enough for tick scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEvent {
    pub number: u64,
    pub timestamp: u64,
}
