use serde_json::Value;
use std::collections::HashMap;

/// §3 "Analysis Context": an ephemeral map from *module key* (stable
/// string) to `{detected, metadata?}`. Created per scan, populated in
/// module order, discarded after interpretation produces the
/// externalized *short* form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleOutcome {
    pub detected: bool,
    pub metadata: Option<Value>,
}

impl ModuleOutcome {
    pub fn not_detected() -> Self {
        Self::default()
    }

    pub fn detected(metadata: impl Into<Option<Value>>) -> Self {
        Self {
            detected: true,
            metadata: metadata.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    outcomes: HashMap<&'static str, ModuleOutcome>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &'static str, outcome: ModuleOutcome) {
        self.outcomes.insert(key, outcome);
    }

    /// Defensive presence check (§9 "Design notes"): modules reading a
    /// prerequisite's result never panic on its absence.
    pub fn get(&self, key: &str) -> Option<&ModuleOutcome> {
        self.outcomes.get(key)
    }

    pub fn detected(&self, key: &str) -> bool {
        self.get(key).map(|o| o.detected).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ModuleOutcome)> {
        self.outcomes.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
