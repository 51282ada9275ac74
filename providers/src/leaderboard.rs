use crate::side_input::RefreshingJson;
use anyhow::Result;
use async_trait::async_trait;
use eth::types::Address;
use std::collections::HashSet;
use std::path::Path;

/// Naming-authority leaderboard (§6 `leaders.json`): addresses of tokens
/// a trusted external authority has already vetted. Supplemented feature
/// (SPEC_FULL §4): the analyzer is not required to consult this, but it
/// is the natural false-positive guard for TokenImpersonation that the
/// distilled spec's prose implies by naming the side input without
/// saying what reads it.
#[async_trait]
pub trait Leaderboard: Send + Sync {
    async fn leaders(&self) -> Result<HashSet<Address>>;
}

pub struct StaticLeaderboard {
    inner: RefreshingJson<HashSet<Address>>,
}

impl StaticLeaderboard {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: RefreshingJson::new(path.as_ref(), HashSet::new),
        }
    }
}

#[async_trait]
impl Leaderboard for StaticLeaderboard {
    async fn leaders(&self) -> Result<HashSet<Address>> {
        self.inner.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_empty_set() {
        let board = StaticLeaderboard::new("/nonexistent/leaders.json");
        assert!(board.leaders().await.unwrap().is_empty());
    }
}
