//! §6 "Outputs (verdict stream)": the five release-time records, and the
//! transition logic ("compares with prior verdict per token, emits
//! new/update/remove") that drives them from `analyzer::compare`.

use analyzer::{compare, detected_keys, AnalysisResult};
use eth::types::Address;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Verdict {
    #[serde(rename = "spam-new")]
    SpamNew { token: Address, analysis: Value, confidence: f64, indicators: Vec<String> },
    #[serde(rename = "spam-update")]
    SpamUpdate { token: Address, analysis: Value, confidence: f64, added: Vec<String>, removed: Vec<String> },
    #[serde(rename = "spam-remove")]
    SpamRemove { token: Address },
    #[serde(rename = "phishing-new")]
    PhishingNew { token: Address, urls: Vec<String> },
    #[serde(rename = "phishing-remove")]
    PhishingRemove { token: Address },
    #[serde(rename = "finalized")]
    Finalized { token: Address },
}

/// Something that can receive a released verdict. The default
/// implementation logs via `tracing`; a real delivery channel
/// (webhook, queue, ...) is external per §1's Non-goals, but this
/// gives the core a typed seam to call either way.
#[async_trait::async_trait]
pub trait VerdictSink: Send + Sync {
    async fn emit(&self, verdict: Verdict);
}

#[derive(Default)]
pub struct TracingVerdictSink;

#[async_trait::async_trait]
impl VerdictSink for TracingVerdictSink {
    async fn emit(&self, verdict: Verdict) {
        match serde_json::to_string(&verdict) {
            Ok(json) => tracing::info!(verdict = %json, "verdict"),
            Err(err) => tracing::warn!(error = %err, "failed to serialize verdict"),
        }
    }
}

/// Derives the verdicts for one release (§6): zero or more of spam
/// new/update/remove, phishing new/remove (independent of spam), and a
/// finalize marker.
pub fn verdicts_for(token: Address, curr: &AnalysisResult, prev: Option<&AnalysisResult>) -> Vec<Verdict> {
    let mut verdicts = Vec::new();
    let prev_interpretation = prev.map(|result| &result.interpretation);
    let curr_detected = detected_keys(&curr.externalized);
    let prev_detected = prev.map(|result| detected_keys(&result.externalized));
    let prev_pair = prev.zip(prev_detected.as_ref()).map(|(result, detected)| (&result.interpretation, detected));
    let comparison = compare(&curr.interpretation, &curr_detected, prev_pair);

    if comparison.is_changed {
        if curr.interpretation.is_spam {
            verdicts.push(Verdict::SpamNew {
                token,
                analysis: curr.externalized.clone(),
                confidence: curr.interpretation.confidence,
                indicators: curr_detected.iter().cloned().collect(),
            });
        } else {
            verdicts.push(Verdict::SpamRemove { token });
        }
    } else if curr.interpretation.is_spam && comparison.is_updated {
        let prev_keys = prev_detected.unwrap_or_default();
        let added: Vec<String> = curr_detected.difference(&prev_keys).cloned().collect();
        let removed: Vec<String> = prev_keys.difference(&curr_detected).cloned().collect();
        verdicts.push(Verdict::SpamUpdate {
            token,
            analysis: curr.externalized.clone(),
            confidence: curr.interpretation.confidence,
            added,
            removed,
        });
    }

    let was_phishing = prev_interpretation.map(|i| i.is_phishing).unwrap_or(false);
    if curr.interpretation.is_phishing && !was_phishing {
        verdicts.push(Verdict::PhishingNew { token, urls: phishing_urls(&curr.externalized) });
    } else if was_phishing && !curr.interpretation.is_phishing {
        verdicts.push(Verdict::PhishingRemove { token });
    }

    if curr.interpretation.is_finalized && !prev_interpretation.map(|i| i.is_finalized).unwrap_or(false) {
        verdicts.push(Verdict::Finalized { token });
    }

    verdicts
}

fn phishing_urls(externalized: &Value) -> Vec<String> {
    externalized
        .get("phishing_metadata")
        .and_then(|outcome| outcome.get("metadata"))
        .and_then(|metadata| metadata.get("urls"))
        .and_then(Value::as_array)
        .map(|urls| urls.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer::Interpretation;
    use serde_json::json;

    fn result(is_spam: bool, is_finalized: bool, externalized: Value) -> AnalysisResult {
        AnalysisResult {
            token: Address::from(1u64),
            externalized,
            interpretation: Interpretation { is_phishing: false, is_spam, is_finalized, confidence: 0.7 },
        }
    }

    #[test]
    fn new_spam_token_emits_spam_new() {
        let curr = result(true, false, json!({"token_impersonation": {"detected": true, "metadata": null}}));
        let verdicts = verdicts_for(Address::from(1u64), &curr, None);
        assert!(matches!(verdicts[0], Verdict::SpamNew { .. }));
    }

    #[test]
    fn spam_flag_flipping_off_emits_spam_remove() {
        let prev = result(true, false, json!({}));
        let curr = result(false, false, json!({}));
        let verdicts = verdicts_for(Address::from(1u64), &curr, Some(&prev));
        assert!(matches!(verdicts[0], Verdict::SpamRemove { .. }));
    }

    #[test]
    fn staying_spam_with_a_new_indicator_emits_spam_update_with_added() {
        let prev = result(true, false, json!({"token_impersonation": {"detected": true, "metadata": null}}));
        let curr = result(
            true,
            false,
            json!({
                "token_impersonation": {"detected": true, "metadata": null},
                "airdrop": {"detected": true, "metadata": null},
            }),
        );
        let verdicts = verdicts_for(Address::from(1u64), &curr, Some(&prev));
        match &verdicts[0] {
            Verdict::SpamUpdate { added, removed, .. } => {
                assert_eq!(added, &vec!["airdrop".to_string()]);
                assert!(removed.is_empty());
            }
            other => panic!("expected SpamUpdate, got {other:?}"),
        }
    }

    #[test]
    fn finalized_is_a_one_shot_marker() {
        let curr = result(false, true, json!({}));
        let verdicts = verdicts_for(Address::from(1u64), &curr, None);
        assert!(verdicts.iter().any(|v| matches!(v, Verdict::Finalized { .. })));
    }
}
