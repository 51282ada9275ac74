use super::EthNodeReading;
use crate::types::{Address, BlockData, ContractDetails, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::{
    middleware::Middleware,
    prelude::abigen,
    providers::{Http, Provider},
};
use futures::{stream, StreamExt};
use std::{collections::HashMap, sync::Arc, time::Duration};

abigen!(TokenView, "./src/abis/TokenView.json");

fn contract_at(address: Address, provider: Arc<Provider<Http>>) -> TokenView<Provider<Http>> {
    TokenView::new(ethers::types::Address::from(address.0 .0), provider)
}

/// Bounded-concurrency batch: at most `concurrency` futures in flight at
/// once, matching the PROVIDER_CONCURRENCY/FETCH_CONCURRENCY pools from §5.
async fn batched<I, T, F, Fut>(items: I, concurrency: usize, f: F) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    stream::iter(items)
        .map(f)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

/// Retries a fallible on-chain call with jittered back-off (§5, §7): up to
/// 3 attempts, 2-8s base delay. A revert carrying ABI-encoded error data is
/// not retried (it will never succeed).
async fn retry_get<T, F, Fut>(max_retries: u32, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                let message = err.to_string();
                let non_retryable = message.contains("revert");
                if non_retryable || attempt >= max_retries {
                    return Err(err);
                }
                let jitter = Duration::from_millis(200 * attempt as u64);
                let wait = Duration::from_secs(2) + jitter;
                tracing::debug!(
                    "rpc call failed (attempt {attempt}/{max_retries}): {message}, retrying in {wait:?}"
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

pub struct Client {
    provider: Arc<Provider<Http>>,
    /// Bound on concurrent outbound calls (PROVIDER_CONCURRENCY: 2 in
    /// production, 40 in development per §6).
    concurrency: usize,
}

impl Client {
    pub fn new(url: &str, concurrency: usize) -> Result<Self> {
        Ok(Self {
            provider: Arc::new(Provider::<Http>::try_from(url)?),
            concurrency,
        })
    }

    async fn get_block(&self, block: u64) -> Result<Option<BlockData>> {
        let provider = self.provider.clone();
        retry_get(3, || {
            let provider = provider.clone();
            async move {
                let res = provider.get_block(block).await?;
                Ok(res.map(|b| BlockData {
                    number: block,
                    timestamp: b.timestamp.as_u64(),
                }))
            }
        })
        .await
    }
}

#[async_trait]
impl EthNodeReading for Client {
    async fn get_blocks_for_range(&self, start: u64, end: u64) -> Result<HashMap<u64, BlockData>> {
        let results = batched(start..end, self.concurrency, |block| self.get_block(block)).await;
        let mut out = HashMap::new();
        for result in results {
            if let Some(block) = result? {
                out.insert(block.number, block);
            }
        }
        Ok(out)
    }

    async fn is_eoa(&self, addresses: &[Address]) -> HashMap<Address, bool> {
        let results = batched(addresses.iter().copied(), self.concurrency, |address| {
            let provider = self.provider.clone();
            async move {
                let code = provider
                    .get_code(ethers::types::Address::from(address.0 .0), None)
                    .await;
                (address, code.map(|c| c.0.is_empty()).unwrap_or(false))
            }
        })
        .await;
        results.into_iter().collect()
    }

    async fn get_contract_details(
        &self,
        addresses: &[Address],
    ) -> HashMap<Address, ContractDetails> {
        let results = batched(addresses.iter().copied(), self.concurrency, |address| async move {
            let contract = contract_at(address, self.provider.clone());
            let name = retry_get(3, || async { contract.name().call().await.map_err(|e| anyhow!(e.to_string())) })
                .await
                .ok();
            let symbol = retry_get(3, || async { contract.symbol().call().await.map_err(|e| anyhow!(e.to_string())) })
                .await
                .ok();
            (address, ContractDetails { name, symbol })
        })
        .await;
        results.into_iter().collect()
    }

    async fn get_token_uris(
        &self,
        tokens: &[(Address, U256)],
    ) -> HashMap<(Address, U256), Option<String>> {
        let results = batched(tokens.iter().copied(), self.concurrency, |(address, id)| async move {
            let contract = contract_at(address, self.provider.clone());
            let uri = retry_get(3, || async {
                contract
                    .token_uri(id.into())
                    .call()
                    .await
                    .map(|uri| uri.replace('\0', ""))
                    .map_err(|e| anyhow!(e.to_string()))
            })
            .await
            .ok();
            ((address, id), uri)
        })
        .await;
        results.into_iter().collect()
    }

    async fn owner_of(&self, contract: Address, token_id: U256, block: u64) -> Option<Address> {
        let bound = contract_at(contract, self.provider.clone());
        let owner = retry_get(3, || async {
            bound
                .owner_of(token_id.into())
                .block(block)
                .call()
                .await
                .map_err(|e| anyhow!(e.to_string()))
        })
        .await
        .ok()?;
        Some(Address::from(owner.0))
    }

    async fn total_supply(&self, contract: Address, block: u64) -> Option<U256> {
        let bound = contract_at(contract, self.provider.clone());
        let supply = retry_get(3, || async {
            bound
                .total_supply()
                .block(block)
                .call()
                .await
                .map_err(|e| anyhow!(e.to_string()))
        })
        .await
        .ok()?;
        Some(U256::from(supply))
    }

    async fn allowance(&self, contract: Address, owner: Address, spender: Address) -> Option<U256> {
        let bound = contract_at(contract, self.provider.clone());
        let value = retry_get(3, || async {
            bound
                .allowance(
                    ethers::types::Address::from(owner.0 .0),
                    ethers::types::Address::from(spender.0 .0),
                )
                .call()
                .await
                .map_err(|e| anyhow!(e.to_string()))
        })
        .await
        .ok()?;
        Some(U256::from(value))
    }

    async fn pair_tokens(&self, contract: Address) -> Option<(Address, Address)> {
        let bound = contract_at(contract, self.provider.clone());
        let token0 = retry_get(2, || async { bound.token_0().call().await.map_err(|e| anyhow!(e.to_string())) })
            .await
            .ok()?;
        let token1 = retry_get(2, || async { bound.token_1().call().await.map_err(|e| anyhow!(e.to_string())) })
            .await
            .ok()?;
        Some((Address::from(token0.0), Address::from(token1.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FREE_ETH_RPC: &str = "https://rpc.ankr.com/eth";

    fn test_client() -> Client {
        Client::new(FREE_ETH_RPC, 4).expect("client construction")
    }

    #[tokio::test]
    #[ignore = "hits a live node"]
    async fn get_block() {
        let client = test_client();
        let block = client.get_block(10_000_000).await.unwrap().unwrap();
        assert_eq!(block.number, 10_000_000);
    }

    #[test]
    fn client_construction_is_infallible_for_valid_url() {
        assert!(Client::new(FREE_ETH_RPC, 4).is_ok());
    }
}
