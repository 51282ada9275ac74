//! §4.C Data Transformer: pure derivations over the store. Does not
//! cache — callers memoize via the memoizer, keyed by block number, so
//! that re-scans within the same block share work (§4.C).

use anyhow::Result;
use bigdecimal::{BigDecimal, Zero};
use eth::types::{Address, Standard};
use std::collections::HashMap;
use std::sync::Arc;
use store::{DataStore, Transaction};
use tokio::sync::Mutex;

pub struct Transformer {
    store: Arc<Mutex<DataStore>>,
}

impl Transformer {
    pub fn new(store: Arc<Mutex<DataStore>>) -> Self {
        Self { store }
    }

    /// Net inbound-minus-outbound per account (§4.C). The zero address is
    /// excluded from both sides (it is where mints/burns "come from"/"go
    /// to", not an account whose holdings matter).
    pub async fn balance_by_account(&self, token: Address) -> Result<HashMap<Address, BigDecimal>> {
        let mut store = self.store.lock().await;
        let standard = store.token(token)?.map(|t| t.standard);
        let mut balances: HashMap<Address, BigDecimal> = HashMap::new();

        let mut credit = |balances: &mut HashMap<Address, BigDecimal>, account: Address, amount: &BigDecimal| {
            if account.is_zero_address() {
                return;
            }
            *balances.entry(account).or_insert_with(BigDecimal::zero) += amount;
        };
        let mut debit = |balances: &mut HashMap<Address, BigDecimal>, account: Address, amount: &BigDecimal| {
            if account.is_zero_address() {
                return;
            }
            *balances.entry(account).or_insert_with(BigDecimal::zero) -= amount;
        };

        match standard {
            Some(Standard::Erc20) => {
                for event in store.erc20_transfer(token)? {
                    let value = event.value.to_big_decimal();
                    debit(&mut balances, event.from, &value);
                    credit(&mut balances, event.to, &value);
                }
            }
            Some(Standard::Erc721) => {
                let one = BigDecimal::from(1);
                for event in store.erc721_transfer(token)? {
                    debit(&mut balances, event.from, &one);
                    credit(&mut balances, event.to, &one);
                }
            }
            Some(Standard::Erc1155) => {
                for event in store.erc1155_transfer_single(token)? {
                    let value = event.value.to_big_decimal();
                    debit(&mut balances, event.from, &value);
                    credit(&mut balances, event.to, &value);
                }
                for event in store.erc1155_transfer_batch(token)? {
                    let sum: BigDecimal = event.values.iter().map(|v| v.to_big_decimal()).sum();
                    debit(&mut balances, event.from, &sum);
                    credit(&mut balances, event.to, &sum);
                }
            }
            None => {}
        }
        Ok(balances)
    }

    /// Union of transactions directly addressed to the token with
    /// transactions carrying any event the token emitted (§4.C).
    pub async fn transactions(&self, token: Address) -> Result<Vec<Transaction>> {
        let mut store = self.store.lock().await;
        let mut by_hash = HashMap::new();
        for tx in store.transactions(Some(token))? {
            by_hash.insert(tx.hash, tx);
        }

        let mut hashes = Vec::new();
        hashes.extend(store.erc20_transfer(token)?.into_iter().map(|e| e.meta.tx_hash));
        hashes.extend(store.erc20_approval(token)?.into_iter().map(|e| e.meta.tx_hash));
        hashes.extend(store.erc721_transfer(token)?.into_iter().map(|e| e.meta.tx_hash));
        hashes.extend(store.erc721_approval(token)?.into_iter().map(|e| e.meta.tx_hash));
        hashes.extend(store.erc721_approval_for_all(token)?.into_iter().map(|e| e.meta.tx_hash));
        hashes.extend(store.erc1155_transfer_single(token)?.into_iter().map(|e| e.meta.tx_hash));
        hashes.extend(store.erc1155_transfer_batch(token)?.into_iter().map(|e| e.meta.tx_hash));
        hashes.extend(store.erc1155_approval_for_all(token)?.into_iter().map(|e| e.meta.tx_hash));

        for hash in hashes {
            if by_hash.contains_key(&hash) {
                continue;
            }
            if let Some(tx) = store.transaction_by_hash(hash)? {
                by_hash.insert(hash, tx);
            }
        }

        let mut out: Vec<Transaction> = by_hash.into_values().collect();
        out.sort_by_key(|tx| (tx.block_number, tx.position));
        Ok(out)
    }
}

trait IsZero {
    fn is_zero_address(&self) -> bool;
}

impl IsZero for Address {
    fn is_zero_address(&self) -> bool {
        *self == Address::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eth::types::{Standard, TxDetails, U256};
    use store::{TokenContract, TxRef};

    async fn seeded_store() -> Arc<Mutex<DataStore>> {
        let store = Arc::new(Mutex::new(DataStore::new(":memory:").unwrap()));
        store
    }

    #[tokio::test]
    async fn erc20_balances_exclude_zero_address_both_ways() {
        let store = seeded_store().await;
        let token = Address::from(1u64);
        {
            let mut guard = store.lock().await;
            guard
                .add_token(&TokenContract {
                    address: token,
                    deployer: Address::from(99u64),
                    deployment_block: 1,
                    deployment_timestamp: 1,
                    standard: Standard::Erc20,
                })
                .unwrap();
            let tx_id = guard
                .add_transaction(&TxDetails {
                    hash: 1u64.into(),
                    from: Address::from(2u64),
                    to: Some(token),
                    selector: [0; 4],
                    block_number: 1,
                    block_timestamp: 1,
                    position: 0,
                })
                .unwrap();
            guard
                .add_erc20_transfer_event(token, TxRef::Id(tx_id), 0, Address::zero(), Address::from(3u64), U256::from(100u64))
                .unwrap();
            guard
                .add_erc20_transfer_event(token, TxRef::Id(tx_id), 1, Address::from(3u64), Address::zero(), U256::from(30u64))
                .unwrap();
        }
        let transformer = Transformer::new(store);
        let balances = transformer.balance_by_account(token).await.unwrap();
        assert!(!balances.contains_key(&Address::zero()));
        assert_eq!(balances[&Address::from(3u64)], BigDecimal::from(70));
    }
}
