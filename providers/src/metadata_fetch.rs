//! §4.D #6 Erc721NonUniqueTokens / #11 PhishingMetadata need the raw body
//! behind a tokenURI. HTTP metadata fetches are one of §5's named
//! suspension points and are retried with jittered back-off like the
//! chain provider's RPC calls (`eth::rpc::ethers_client`); this is the
//! narrow external seam for that (§9: "implementations outside the core
//! can be swapped").

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

/// Fetches the raw bytes behind a tokenURI, resolving `ipfs://` through a
/// gateway and decoding `data:` URLs with inline (optionally base64)
/// bodies in place, matching the teacher's `data_url`/`ipfs` module
/// split but generalized to "just give me the bytes".
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

fn normalize_uri(uri: &str) -> String {
    if let Some(rest) = uri.strip_prefix("ipfs://") {
        format!("{IPFS_GATEWAY}{}", rest.trim_start_matches("ipfs/"))
    } else {
        uri.to_string()
    }
}

fn decode_data_url(uri: &str) -> Option<Result<Vec<u8>>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, body) = rest.split_once(',')?;
    if header.ends_with(";base64") {
        Some(
            base64::engine::general_purpose::STANDARD
                .decode(body)
                .map_err(|err| anyhow!("invalid base64 data url: {err}")),
        )
    } else {
        Some(Ok(urlencoding_decode(body).into_bytes()))
    }
}

/// Minimal percent-decoding, enough for `data:` URLs without pulling in
/// a whole URL-encoding crate for one call site.
fn urlencoding_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(value) = u8::from_str_radix(std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or(""), 16) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

async fn retry<T, F, Fut>(max_retries: u32, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= max_retries {
                    return Err(err);
                }
                let jitter = Duration::from_millis(200 * attempt as u64);
                tokio::time::sleep(Duration::from_secs(2) + jitter).await;
            }
        }
    }
}

/// `reqwest`-backed implementation. Bounded concurrency across many URIs
/// is the caller's job (§5 FETCH_CONCURRENCY); this type only owns a
/// single fetch.
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl Default for HttpMetadataFetcher {
    fn default() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client construction"),
        }
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        if let Some(decoded) = decode_data_url(uri) {
            return decoded;
        }
        let url = normalize_uri(uri);
        let client = &self.client;
        retry(3, || {
            let url = url.clone();
            async move {
                let response = client.get(&url).send().await?;
                let bytes = response.error_for_status()?.bytes().await?;
                Ok(bytes.to_vec())
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_ipfs_scheme() {
        assert_eq!(normalize_uri("ipfs://bafy123/1.json"), format!("{IPFS_GATEWAY}bafy123/1.json"));
        assert_eq!(normalize_uri("https://example.com/1.json"), "https://example.com/1.json");
    }

    #[tokio::test]
    async fn decodes_plain_data_url() {
        let fetcher = HttpMetadataFetcher::default();
        let bytes = fetcher.fetch("data:application/json,%7B%22a%22%3A1%7D").await.unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn decodes_base64_data_url() {
        let fetcher = HttpMetadataFetcher::default();
        let body = base64::engine::general_purpose::STANDARD.encode(br#"{"a":1}"#);
        let uri = format!("data:application/json;base64,{body}");
        let bytes = fetcher.fetch(&uri).await.unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"a":1}"#);
    }
}
