//! The chain reader is explicitly out of scope (§1 Non-goals): "the
//! chain reader that feeds block and transaction events to the system."
//! This trait is the seam the outer loop polls; the binary ships no
//! production implementation, the same way `providers::HoneypotOracle`
//! ships no real oracle.

use anyhow::Result;
use ingress::TxEvent;

#[async_trait::async_trait]
pub trait ChainFeed: Send + Sync {
    /// Returns newly observed transactions (§6 "Inputs") since the last
    /// poll, along with the block they arrived in.
    async fn poll(&mut self) -> Result<Vec<TxEvent>>;
}

/// Idles forever without producing events. Lets the binary boot and run
/// its tick loop end-to-end without a real feed wired in.
pub struct NullChainFeed;

#[async_trait::async_trait]
impl ChainFeed for NullChainFeed {
    async fn poll(&mut self) -> Result<Vec<TxEvent>> {
        Ok(Vec::new())
    }
}
