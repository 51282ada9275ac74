//! Externalized event shapes: what `DataStore` read methods hand back to
//! callers (§3 "Event"), already resolved from integer ids to `Address`/
//! `Bytes32` and decimal strings to `U256`.

use eth::types::{Address, Bytes32, U256};
use serde::Serialize;

/// Fields every event carries regardless of standard/kind (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventMeta {
    pub contract: Address,
    pub tx_hash: Bytes32,
    pub block_number: i64,
    pub tx_index: i32,
    pub log_index: i32,
}

impl EventMeta {
    /// Total order used by every per-contract query (§3 "Invariants").
    pub fn order_key(&self) -> (i64, i32, i32) {
        (self.block_number, self.tx_index, self.log_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Erc20Transfer {
    pub meta: EventMeta,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Erc20Approval {
    pub meta: EventMeta,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Erc721Transfer {
    pub meta: EventMeta,
    pub from: Address,
    pub to: Address,
    pub token_id: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Erc721Approval {
    pub meta: EventMeta,
    pub owner: Address,
    pub spender: Address,
    pub token_id: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Erc721ApprovalForAll {
    pub meta: EventMeta,
    pub owner: Address,
    pub operator: Address,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Erc1155TransferSingle {
    pub meta: EventMeta,
    pub operator: Address,
    pub from: Address,
    pub to: Address,
    pub token_id: U256,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Erc1155TransferBatch {
    pub meta: EventMeta,
    pub operator: Address,
    pub from: Address,
    pub to: Address,
    pub ids: Vec<U256>,
    pub values: Vec<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Erc1155ApprovalForAll {
    pub meta: EventMeta,
    pub owner: Address,
    pub operator: Address,
    pub approved: bool,
}

/// A single token deployment (§3 "Token Contract").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenContract {
    pub address: Address,
    pub deployer: Address,
    pub deployment_block: i64,
    pub deployment_timestamp: i64,
    pub standard: eth::types::Standard,
}

/// A transaction as read back out of the store (§3 "Transaction").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub hash: Bytes32,
    pub from: Address,
    /// `None` reconstructs the `absent` recipient sentinel back to its
    /// external meaning (§9): contract-creation transactions.
    pub to: Option<Address>,
    pub selector: [u8; 4],
    pub block_number: i64,
    pub block_timestamp: i64,
    pub position: i32,
}
