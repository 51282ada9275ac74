use super::{Address, Bytes32};
use serde::{Deserialize, Serialize};

/// Recognized token standards (contract-type identification is an external
/// collaborator per spec §1; this enum is simply its output alphabet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Standard {
    Erc20,
    Erc721,
    Erc1155,
}

/// A transaction as surfaced by the chain feed (§6 Inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxDetails {
    pub hash: Bytes32,
    pub from: Address,
    /// `None` for contract-creation transactions; the store layer is the
    /// single place that maps this to the `ABSENT_RECIPIENT` sentinel (§9).
    pub to: Option<Address>,
    pub selector: [u8; 4],
    pub block_number: u64,
    pub block_timestamp: u64,
    pub position: u32,
}

/// A block header, just enough for tick scheduling and per-block joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockData {
    pub number: u64,
    pub timestamp: u64,
}

/// Name/symbol as read from a token contract (provider output).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractDetails {
    pub name: Option<String>,
    pub symbol: Option<String>,
}

/// Identifies a single NFT within an ERC-721/1155 contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId {
    pub contract: Address,
    pub token_id: super::U256,
}
