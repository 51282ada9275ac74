pub mod ethers_client;

use crate::types::{Address, BlockData, ContractDetails, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Narrow seam onto the chain: everything the analyzer's detector modules
/// need beyond what the ingress feed already supplies. Bounded-concurrency
/// batching is the implementation's job, not the caller's (§5).
#[async_trait]
pub trait EthNodeReading: Send + Sync {
    async fn get_blocks_for_range(&self, start: u64, end: u64) -> Result<HashMap<u64, BlockData>>;

    /// `true` in the result means the address has no code (an EOA).
    async fn is_eoa(&self, addresses: &[Address]) -> HashMap<Address, bool>;

    async fn get_contract_details(
        &self,
        addresses: &[Address],
    ) -> HashMap<Address, ContractDetails>;

    async fn get_token_uris(
        &self,
        tokens: &[(Address, U256)],
    ) -> HashMap<(Address, U256), Option<String>>;

    async fn owner_of(&self, contract: Address, token_id: U256, block: u64) -> Option<Address>;

    async fn total_supply(&self, contract: Address, block: u64) -> Option<U256>;

    async fn allowance(&self, contract: Address, owner: Address, spender: Address) -> Option<U256>;

    /// `Some((token0, token1))` iff the contract exposes both accessors,
    /// i.e. is plausibly a liquidity pair contract.
    async fn pair_tokens(&self, contract: Address) -> Option<(Address, Address)>;
}
