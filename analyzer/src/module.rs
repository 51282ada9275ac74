use crate::context::AnalysisContext;
use crate::services::AnalysisServices;
use anyhow::Result;
use async_trait::async_trait;
use eth::types::Address;
use serde_json::Value;

/// Per-scan, per-module working set (§4.D module contract). Borrows the
/// scan's context mutably and the process-wide services by reference —
/// `AnalysisServices` is all `Arc`, so cloning it is cheap if a module
/// needs to hold it across an `.await` boundary of its own.
pub struct ScanContext<'a> {
    pub token: Address,
    pub timestamp: u64,
    pub block_number: u64,
    pub context: &'a mut AnalysisContext,
    pub services: &'a AnalysisServices,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub detected: bool,
    pub metadata: Option<Value>,
    /// Halts the remaining pipeline for this scan (§4.D).
    pub interrupt: bool,
}

impl ScanOutcome {
    pub fn not_detected() -> Self {
        Self::default()
    }

    pub fn detected(metadata: impl Into<Option<Value>>) -> Self {
        Self {
            detected: true,
            metadata: metadata.into(),
            interrupt: false,
        }
    }

    pub fn interrupting(mut self) -> Self {
        self.interrupt = true;
        self
    }
}

/// §4.D: "a module interface with a single `scan` method and a static
/// key" (§9 Design notes). Modules never mutate storage and never
/// propagate errors up the pipeline on their own account — a module that
/// fails internally should catch it and return `not_detected()`; `scan`
/// returning `Err` is reserved for the handful of cases the orchestrator
/// treats as a failed task (§7).
#[async_trait]
pub trait Module: Send + Sync {
    fn key(&self) -> &'static str;

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome>;

    /// Externalizes a module's metadata for the verdict stream / the
    /// comparator (§4.E, §9 "order-sensitive" note). Default: identity.
    fn simplify_metadata(&self, metadata: &Value) -> Value {
        metadata.clone()
    }
}
