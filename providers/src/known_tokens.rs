use crate::side_input::RefreshingJson;
use anyhow::Result;
use async_trait::async_trait;
use eth::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One well-known token's identity and where it is legitimately deployed
/// (§4.D TokenImpersonation, §9 "Honeypot / token-list providers").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Hash of `"<normalized name> (<normalized symbol>)"` (§4.D #1).
    pub name_hash: String,
    pub deployments: Vec<Address>,
}

#[async_trait]
pub trait KnownTokenList: Send + Sync {
    async fn known_tokens(&self) -> Result<Vec<TokenRecord>>;
}

/// Reads `tokens.json` (§6), a read-only side input maintained outside
/// the core.
pub struct StaticTokenList {
    inner: RefreshingJson<Vec<TokenRecord>>,
}

impl StaticTokenList {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: RefreshingJson::new(path.as_ref(), Vec::new),
        }
    }
}

#[async_trait]
impl KnownTokenList for StaticTokenList {
    async fn known_tokens(&self) -> Result<Vec<TokenRecord>> {
        self.inner.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_empty_list() {
        let list = StaticTokenList::new("/nonexistent/tokens.json");
        assert!(list.known_tokens().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_records_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(
            &path,
            serde_json::json!([{
                "name_hash": "abc123",
                "deployments": ["0x0000000000000000000000000000000000000001"],
            }])
            .to_string(),
        )
        .unwrap();
        let list = StaticTokenList::new(&path);
        let records = list.known_tokens().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name_hash, "abc123");
    }
}
