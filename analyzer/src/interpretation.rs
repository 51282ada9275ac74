//! §4.D "Public interpretation over the context": the handful of boolean
//! and confidence derivations every released analysis carries, computed
//! once the fixed module battery has finished (or interrupted).

use crate::context::AnalysisContext;
use crate::modules::keys::{
    AIRDROP, ERC721_FALSE_TOTAL_SUPPLY, ERC721_MULTIPLE_OWNERS, ERC721_NON_UNIQUE_TOKENS, HIGH_ACTIVITY,
    HONEYPOT_SHARE_DOMINANCE, LOW_ACTIVITY_AFTER_AIRDROP, OBSERVATION_TIME, PHISHING_METADATA, SILENT_MINT, SLEEP_MINT,
    TOKEN_IMPERSONATION, TOO_MANY_HONEYPOT_OWNERS, TOO_MANY_TOKEN_CREATIONS, TOO_MUCH_AIRDROP_ACTIVITY,
};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpretation {
    pub is_phishing: bool,
    pub is_spam: bool,
    pub is_finalized: bool,
    pub confidence: f64,
}

/// §4.D: derives `isPhishing`/`isSpam`/`isFinalized`/`confidence` purely
/// from the populated context — no I/O, deterministic in the present
/// metadata only (§8 "Interpretation monotonicity under evidence").
pub fn interpret(context: &AnalysisContext) -> Interpretation {
    let is_phishing = context.detected(PHISHING_METADATA);
    let token_impersonation = context.detected(TOKEN_IMPERSONATION);
    let high_activity = context.detected(HIGH_ACTIVITY);

    let airdrop_co_signal = context.detected(AIRDROP)
        && [
            ERC721_MULTIPLE_OWNERS,
            ERC721_FALSE_TOTAL_SUPPLY,
            ERC721_NON_UNIQUE_TOKENS,
            TOO_MUCH_AIRDROP_ACTIVITY,
            TOO_MANY_TOKEN_CREATIONS,
            TOO_MANY_HONEYPOT_OWNERS,
            HONEYPOT_SHARE_DOMINANCE,
            PHISHING_METADATA,
            SLEEP_MINT,
            LOW_ACTIVITY_AFTER_AIRDROP,
        ]
        .into_iter()
        .any(|key| context.detected(key));

    let mut is_spam = is_phishing || token_impersonation || airdrop_co_signal;
    if high_activity {
        is_spam = false;
    }

    let is_finalized = [OBSERVATION_TIME, HIGH_ACTIVITY, PHISHING_METADATA, TOO_MUCH_AIRDROP_ACTIVITY]
        .into_iter()
        .any(|key| context.detected(key));

    let confidence = confidence(context, token_impersonation);

    Interpretation {
        is_phishing,
        is_spam,
        is_finalized,
        confidence,
    }
}

fn confidence(context: &AnalysisContext, token_impersonation: bool) -> f64 {
    let mut confidence: f64 = if token_impersonation { 0.75 } else { 0.6 };

    // Excludes SilentMint and Airdrop: they are corroborating signals,
    // not independent indicators of intent (§4.D).
    let indicator_count = context
        .iter()
        .filter(|(key, outcome)| outcome.detected && *key != SILENT_MINT && *key != AIRDROP)
        .count();
    if indicator_count >= 3 {
        confidence += 0.35;
    } else if indicator_count == 2 {
        confidence += 0.15;
    }

    if let Some(outcome) = context.get(AIRDROP) {
        if let Some(metadata) = &outcome.metadata {
            if let Some(receivers) = metadata.get("receivers").and_then(|v| v.as_array()) {
                if receivers.len() >= 1000 {
                    confidence *= 1.2;
                } else if receivers.len() >= 100 {
                    confidence *= 1.1;
                }
            }
        }
    }

    if let Some(outcome) = context.get(PHISHING_METADATA) {
        if let Some(metadata) = &outcome.metadata {
            if let Some(max_text_length) = metadata.get("maxTextLength").and_then(|v| v.as_u64()) {
                if max_text_length > 2000 {
                    confidence *= 0.8;
                }
            }
            if let Some(hosts) = metadata.get("hosts").and_then(|v| v.as_array()) {
                if hosts.len() > 1 {
                    confidence *= (0.8 / (hosts.len() as f64 - 1.0)).max(0.15);
                }
            }
        }
    }

    if let Some(outcome) = context.get(HIGH_ACTIVITY) {
        if let Some(metadata) = &outcome.metadata {
            let senders = metadata
                .get("uniqueSenders")
                .or_else(|| metadata.get("windowedUniqueSenders"))
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            if senders >= 300 {
                confidence *= 0.8;
            }
        }
    }

    confidence.min(1.0)
}

/// The externalized per-module `detected` key-set (§9 "order-sensitive"
/// note: `compare` and any downstream diffing only ever see this short
/// form, never the raw per-scan metadata).
pub fn detected_keys(externalized: &Value) -> BTreeSet<String> {
    let Some(map) = externalized.as_object() else {
        return BTreeSet::new();
    };
    map.iter()
        .filter(|(_, value)| value.get("detected").and_then(Value::as_bool).unwrap_or(false))
        .map(|(key, _)| key.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Comparison {
    pub is_updated: bool,
    pub is_changed: bool,
}

/// §4.D "Comparison": `isUpdated` on any module's `detected` flag
/// changing or `confidence` changing — the four `Interpretation` fields
/// alone under-count this (two different co-signals can swap while
/// `confidence`'s excluded-count and every other field stay put), so the
/// externalized per-module `detected` key-set is compared too.
pub fn compare(curr: &Interpretation, curr_detected: &BTreeSet<String>, prev: Option<(&Interpretation, &BTreeSet<String>)>) -> Comparison {
    let Some((prev, prev_detected)) = prev else {
        return Comparison {
            is_updated: true,
            is_changed: curr.is_spam,
        };
    };
    Comparison {
        is_updated: curr != prev || curr_detected != prev_detected,
        is_changed: curr.is_spam != prev.is_spam,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModuleOutcome;

    #[test]
    fn high_activity_forces_is_spam_false() {
        let mut context = AnalysisContext::new();
        context.record(PHISHING_METADATA, ModuleOutcome::detected(serde_json::json!({"urls": ["evil.xyz"]})));
        context.record(HIGH_ACTIVITY, ModuleOutcome::detected(None::<serde_json::Value>));
        let interpretation = interpret(&context);
        assert!(!interpretation.is_spam);
        assert!(interpretation.is_finalized);
    }

    #[test]
    fn token_impersonation_alone_is_spam_with_higher_base_confidence() {
        let mut context = AnalysisContext::new();
        context.record(TOKEN_IMPERSONATION, ModuleOutcome::detected(None::<serde_json::Value>));
        let interpretation = interpret(&context);
        assert!(interpretation.is_spam);
        assert!(interpretation.confidence >= 0.75);
    }

    #[test]
    fn compare_flags_spam_flip() {
        let mut spam = AnalysisContext::new();
        spam.record(TOKEN_IMPERSONATION, ModuleOutcome::detected(None::<serde_json::Value>));
        let spam_interpretation = interpret(&spam);
        let not_spam = interpret(&AnalysisContext::new());
        let spam_detected = BTreeSet::from([TOKEN_IMPERSONATION.to_string()]);
        let not_spam_detected = BTreeSet::new();

        let comparison = compare(&spam_interpretation, &spam_detected, Some((&not_spam, &not_spam_detected)));
        assert!(comparison.is_changed);
        assert!(comparison.is_updated);
    }

    #[test]
    fn compare_flags_update_when_detected_keys_change_but_fields_match() {
        let prev_detected = BTreeSet::from(["sleep_mint".to_string()]);
        let curr_detected = BTreeSet::from(["low_activity_after_airdrop".to_string()]);
        let interpretation = Interpretation { is_phishing: false, is_spam: true, is_finalized: false, confidence: 0.7 };

        let comparison = compare(&interpretation, &curr_detected, Some((&interpretation, &prev_detected)));
        assert!(comparison.is_updated, "swapping one co-signal for another must still be reported as an update");
        assert!(!comparison.is_changed);
    }
}
