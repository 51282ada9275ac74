use crate::side_input::RefreshingJson;
use anyhow::Result;
use async_trait::async_trait;
use eth::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoneypotVerdict {
    pub is_honeypot: bool,
    pub metadata: Option<serde_json::Value>,
}

/// §9: "narrow asynchronous interface" — `isHoneypot(address, blockNumber)
/// → bool+metadata`. The real production implementation calls a paid
/// honeypot-detection API; this crate only owns the seam and a seed-list
/// fallback (§6 `honeypots.json`).
#[async_trait]
pub trait HoneypotOracle: Send + Sync {
    async fn is_honeypot(&self, address: Address, block_number: u64) -> Result<HoneypotVerdict>;
}

/// Consults the `honeypots.json` seed set (§6). Does not call out to any
/// live service — swap in a real oracle client behind the same trait for
/// production (§9).
pub struct StaticHoneypotOracle {
    inner: RefreshingJson<HashSet<Address>>,
}

impl StaticHoneypotOracle {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: RefreshingJson::new(path.as_ref(), HashSet::new),
        }
    }
}

#[async_trait]
impl HoneypotOracle for StaticHoneypotOracle {
    async fn is_honeypot(&self, address: Address, _block_number: u64) -> Result<HoneypotVerdict> {
        let seed = self.inner.get()?;
        Ok(HoneypotVerdict {
            is_honeypot: seed.contains(&address),
            metadata: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flags_addresses_in_the_seed_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("honeypots.json");
        let addr = Address::from(42u64);
        std::fs::write(&path, serde_json::to_string(&vec![addr]).unwrap()).unwrap();
        let oracle = StaticHoneypotOracle::new(&path);
        assert!(oracle.is_honeypot(addr, 0).await.unwrap().is_honeypot);
        assert!(!oracle.is_honeypot(Address::from(1u64), 0).await.unwrap().is_honeypot);
    }
}
