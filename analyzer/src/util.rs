use eth::types::Address;
use serde_json::Value;
use std::collections::BTreeMap;

/// Burn-address set (§3 "Deletion" / glossary "Burn address"): all-zero
/// and the conventional `…dead` constant.
pub fn burn_addresses() -> [Address; 2] {
    eth::types::BURN_ADDRESSES
}

pub fn is_burn(address: Address) -> bool {
    burn_addresses().contains(&address)
}

/// "lower-case, collapse whitespace, strip non-alphanumeric" (§4.D #1).
pub fn normalize_token_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_space = false;
    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_was_space = false;
        } else if ch.is_whitespace() && !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim().to_string()
}

/// `keccak256("<normalized name> (<normalized symbol>)")`, hex-encoded
/// (§4.D #1).
pub fn name_symbol_hash(name: &str, symbol: &str) -> String {
    let normalized = format!("{} ({})", normalize_token_text(name), normalize_token_text(symbol));
    format!("{:#x}", keccak_hash::keccak(normalized.as_bytes()))
}

/// Largest count of distinct receivers within any `window`-wide slice of
/// a sender's chronologically ordered (receiver, timestamp) transfers
/// (§4.D #2 Airdrop, #4 LowActivityAfterAirdrop use the same shape of
/// computation over different data).
pub fn max_distinct_in_sliding_window<T: Eq + std::hash::Hash + Copy>(
    events: &[(T, u64)],
    window: u64,
) -> usize {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|(_, t)| *t);
    let mut best = 0;
    let mut start = 0;
    for end in 0..sorted.len() {
        while sorted[end].1.saturating_sub(sorted[start].1) > window {
            start += 1;
        }
        let distinct: std::collections::HashSet<T> = sorted[start..=end].iter().map(|(id, _)| *id).collect();
        best = best.max(distinct.len());
    }
    best
}

/// Stable serialization of a JSON value for grouping purposes (§4.D #6:
/// "group by canonical JSON serialization") — object keys sorted
/// recursively, since `serde_json::Value`'s default map is insertion
/// ordered and two semantically identical bodies can otherwise hash
/// differently depending on field order.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&sort_keys(value)).unwrap_or_default()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map.iter().map(|(k, v)| (k.clone(), sort_keys(v))).collect();
            serde_json::to_value(sorted).unwrap_or(Value::Null)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_whitespace_and_punctuation() {
        assert_eq!(normalize_token_text("  Free-AirDrop!! Token  "), "free airdrop token");
    }

    #[test]
    fn sliding_window_counts_distinct_within_span() {
        let events = vec![(1, 0u64), (2, 1), (3, 100), (4, 101)];
        // window of 2: {1,2} and {3,4} are the only groups within span.
        assert_eq!(max_distinct_in_sliding_window(&events, 2), 2);
        // window covering everything: all 4 distinct receivers.
        assert_eq!(max_distinct_in_sliding_window(&events, 1000), 4);
    }

    #[test]
    fn canonical_json_ignores_key_order() {
        let a = serde_json::json!({"name": "x", "image": "ipfs://y"});
        let b = serde_json::json!({"image": "ipfs://y", "name": "x"});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }
}
