use super::keys::PHISHING_METADATA;
use crate::module::{Module, ScanContext, ScanOutcome};
use anyhow::Result;
use async_trait::async_trait;
use eth::types::{Standard, U256};
use regex::Regex;
use serde_json::json;
use std::collections::HashSet;

const PHISHING_KEYWORDS: &[&str] =
    &["visit", "claim", "reward", "rewards", "airdrop", "giveaway", "bonus", "free", "gift", "prize", "winner"];

/// §4.D #11. Token `name`/`symbol` (and NFT descriptions) that steer a
/// viewer to an off-chain URL, tolerant of obfuscated schemes/dots.
pub struct PhishingMetadata;

#[async_trait]
impl Module for PhishingMetadata {
    fn key(&self) -> &'static str {
        PHISHING_METADATA
    }

    async fn scan(&self, ctx: &mut ScanContext<'_>) -> Result<ScanOutcome> {
        let details = ctx.services.provider.get_contract_details(&[ctx.token]).await.get(&ctx.token).cloned().unwrap_or_default();

        let mut texts: Vec<String> = Vec::new();
        if let Some(name) = details.name {
            texts.push(name);
        }
        if let Some(symbol) = details.symbol {
            texts.push(symbol);
        }
        if let Some(description) = sample_description(ctx).await {
            texts.push(description);
        }

        let config = ctx.services.config;
        let url_pattern = Regex::new(r"(?i)(?:https?://|www\.)?[a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)*\.[a-z]{2,}(?:/[^\s]*)?")?;
        let dollar_amount = Regex::new(r"[$€£¥₿]\s?\d")?;
        let max_text_length = texts.iter().map(|t| t.chars().count()).max().unwrap_or(0);
        let mut urls = Vec::new();
        let mut hosts: HashSet<String> = HashSet::new();
        for text in &texts {
            if text.chars().count() > config.phishing_description_budget {
                continue;
            }
            let normalized = deobfuscate(text);
            let has_keyword = contains_keyword(&normalized, &dollar_amount);
            for candidate in url_pattern.find_iter(&normalized) {
                let url = candidate.as_str().to_string();
                let host = extract_host(&url);
                if ctx.services.marketplaces.is_marketplace_domain(&host) {
                    continue;
                }
                let is_short_url = ctx.services.short_urls.is_short_url_domain(&host);
                if has_keyword || is_short_url {
                    hosts.insert(host);
                    urls.push(url);
                }
            }
        }

        if urls.is_empty() {
            return Ok(ScanOutcome::not_detected());
        }
        Ok(ScanOutcome::detected(json!({
            "urls": urls,
            "hosts": hosts.into_iter().collect::<Vec<_>>(),
            "maxTextLength": max_text_length,
        })))
    }
}

/// Best-effort NFT description: samples one minted tokenId's metadata
/// body. Any failure (no tokens yet, fetch error, non-JSON body) simply
/// means no description text to inspect — this module never fails the
/// scan over it.
async fn sample_description(ctx: &mut ScanContext<'_>) -> Option<String> {
    let standard = {
        let mut store = ctx.services.store.lock().await;
        store.token(ctx.token).ok()?.map(|t| t.standard)
    };
    if standard != Some(Standard::Erc721) {
        return None;
    }
    let token_id: U256 = {
        let mut store = ctx.services.store.lock().await;
        store.erc721_transfer(ctx.token).ok()?.first().map(|e| e.token_id)?
    };
    let uris = ctx.services.provider.get_token_uris(&[(ctx.token, token_id)]).await;
    let uri = uris.get(&(ctx.token, token_id)).cloned().flatten()?;
    let body = ctx.services.metadata_fetcher.fetch(&uri).await.ok()?;
    let value: serde_json::Value = serde_json::from_slice(&body).ok()?;
    value.get("description")?.as_str().map(|s| s.to_string())
}

/// Undoes common obfuscation tricks before URL/keyword matching (§4.D
/// #11: "tolerates obfuscations `[.]`, `[dot]`, and bracketed/escaped
/// schemes").
fn deobfuscate(text: &str) -> String {
    let mut out = text.to_lowercase();
    for pattern in ["[.]", "(.)", "{.}", "[dot]", "(dot)", "{dot}"] {
        out = out.replace(pattern, ".");
    }
    out = out.replace("hxxps", "https").replace("hxxp", "http");
    for pattern in ["[http]", "(http)", "[https]", "(https)"] {
        out = out.replace(pattern, pattern.trim_matches(|c| c == '[' || c == ']' || c == '(' || c == ')'));
    }
    out
}

fn contains_keyword(text: &str, dollar_amount: &Regex) -> bool {
    PHISHING_KEYWORDS.iter().any(|kw| text.contains(kw)) || dollar_amount.is_match(text)
}

fn extract_host(url: &str) -> String {
    let without_scheme = url.trim_start_matches("https://").trim_start_matches("http://").trim_start_matches("www.");
    without_scheme.split('/').next().unwrap_or(without_scheme).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deobfuscates_bracketed_dots() {
        assert_eq!(deobfuscate("visit site[.]cc"), "visit site.cc");
    }

    #[test]
    fn detects_keywords_case_insensitively() {
        let dollar_amount = Regex::new(r"[$€£¥₿]\s?\d").unwrap();
        assert!(contains_keyword("claim your reward", &dollar_amount));
        assert!(!contains_keyword("a perfectly normal name", &dollar_amount));
    }

    #[test]
    fn extracts_host_without_scheme_or_path() {
        assert_eq!(extract_host("https://www.evil.xyz/claim"), "evil.xyz");
    }
}
