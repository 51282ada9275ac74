use std::collections::HashSet;

/// §4.D #11 PhishingMetadata: "the URL shares its host with a known
/// short-URL domain". A fixed, synchronous list — unlike the other
/// providers this needs no I/O, so it is not behind an async trait.
pub trait ShortUrlDomains: Send + Sync {
    fn is_short_url_domain(&self, host: &str) -> bool;
}

/// Common link-shortener domains. Not exhaustive; the point is the seam,
/// not the list (§9: "implementations outside the core can be swapped").
pub struct StaticShortUrlDomains {
    domains: HashSet<&'static str>,
}

impl Default for StaticShortUrlDomains {
    fn default() -> Self {
        Self {
            domains: [
                "bit.ly", "tinyurl.com", "t.co", "goo.gl", "is.gd", "ow.ly", "buff.ly", "cutt.ly",
                "rebrand.ly", "shorturl.at", "rb.gy", "linktr.ee", "bit.do", "s.id", "t.ly",
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl ShortUrlDomains for StaticShortUrlDomains {
    fn is_short_url_domain(&self, host: &str) -> bool {
        self.domains.contains(host.trim_start_matches("www."))
    }
}

/// Well-known NFT marketplace domains, excluded from PhishingMetadata
/// (§4.D #11: "well-known marketplace domains" are never flagged).
pub struct StaticMarketplaceDomains {
    domains: HashSet<&'static str>,
}

impl Default for StaticMarketplaceDomains {
    fn default() -> Self {
        Self {
            domains: ["opensea.io", "looksrare.org", "blur.io", "rarible.com", "magiceden.io"]
                .into_iter()
                .collect(),
        }
    }
}

impl StaticMarketplaceDomains {
    pub fn is_marketplace_domain(&self, host: &str) -> bool {
        self.domains.contains(host.trim_start_matches("www."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_shorteners() {
        let domains = StaticShortUrlDomains::default();
        assert!(domains.is_short_url_domain("bit.ly"));
        assert!(domains.is_short_url_domain("www.bit.ly"));
        assert!(!domains.is_short_url_domain("example.com"));
    }

    #[test]
    fn recognizes_marketplaces() {
        let domains = StaticMarketplaceDomains::default();
        assert!(domains.is_marketplace_domain("opensea.io"));
        assert!(!domains.is_marketplace_domain("evil.xyz"));
    }
}
