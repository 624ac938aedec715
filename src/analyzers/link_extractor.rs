// Finds the trading pair a set of posts points at.
//
// Recognised link shapes, checked in this order for every link:
//   dexscreener.com/<chain>/<pair>                         -> pair
//   app.uniswap.org/[#/]swap?...outputCurrency=0x..        -> token (chain= param, default ethereum)
//   pancakeswap.finance/swap?...outputCurrency=0x..        -> token (chain= param, default bsc)
//   dextools.io/app/[lang/]<chain>/pair-explorer/<pair>    -> pair

use regex::Regex;

use crate::models::{DexPairReference, PostRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMatch {
    /// The link names the pool directly
    Pair(DexPairReference),
    /// The link names a token; its pool still has to be looked up
    Token { chain: String, address: String },
}

pub struct LinkExtractor {
    dex_screener: Regex,
    uniswap: Regex,
    pancakeswap: Regex,
    dextools: Regex,
    output_currency: Regex,
    chain_param: Regex,
    bare_address: Regex,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            dex_screener: Regex::new(r"(?i)^https?://(?:www\.)?dexscreener\.com/([a-z0-9-]+)/([a-z0-9]{32,})")
                .expect("static regex"),
            uniswap: Regex::new(r"(?i)^https?://app\.uniswap\.org/(?:#/)?swap\?").expect("static regex"),
            pancakeswap: Regex::new(r"(?i)^https?://(?:www\.)?pancakeswap\.finance/swap\?").expect("static regex"),
            dextools: Regex::new(
                r"(?i)^https?://(?:www\.)?dextools\.io/app/(?:[a-z]{2}/)?([a-z0-9-]+)/pair-explorer/([a-z0-9]{32,})",
            )
            .expect("static regex"),
            output_currency: Regex::new(r"(?i)[?&]outputCurrency=(0x[a-f0-9]{40})\b").expect("static regex"),
            chain_param: Regex::new(r"(?i)[?&]chain=([a-z_]+)").expect("static regex"),
            bare_address: Regex::new(r"\b0x[a-fA-F0-9]{40}\b").expect("static regex"),
        }
    }

    /// Classify one URL, or `None` if it is not an exchange link.
    pub fn match_link(&self, link: &str) -> Option<LinkMatch> {
        let link = link.trim();

        if let Some(caps) = self.dex_screener.captures(link) {
            return Some(LinkMatch::Pair(DexPairReference::new(
                caps[1].to_ascii_lowercase(),
                &caps[2],
            )));
        }

        if self.uniswap.is_match(link) {
            return self.swap_token(link, "ethereum");
        }

        if self.pancakeswap.is_match(link) {
            return self.swap_token(link, "bsc");
        }

        if let Some(caps) = self.dextools.captures(link) {
            return Some(LinkMatch::Pair(DexPairReference::new(
                dextools_chain(&caps[1].to_ascii_lowercase()),
                &caps[2],
            )));
        }

        None
    }

    fn swap_token(&self, link: &str, default_chain: &str) -> Option<LinkMatch> {
        let address = self.output_currency.captures(link)?[1].to_string();
        let chain = self
            .chain_param
            .captures(link)
            .map(|caps| swap_chain(&caps[1].to_ascii_lowercase()))
            .unwrap_or_else(|| default_chain.to_string());

        Some(LinkMatch::Token { chain, address })
    }

    /// First exchange link across all posts, scanning posts and their links in order.
    pub fn first_link_match(&self, posts: &[PostRecord]) -> Option<LinkMatch> {
        posts
            .iter()
            .flat_map(|post| post.links.iter())
            .find_map(|link| self.match_link(link))
    }

    /// Distinct `0x` addresses mentioned in post text, in order of first appearance.
    pub fn text_addresses(&self, posts: &[PostRecord]) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();

        for post in posts {
            for m in self.bare_address.find_iter(&post.text) {
                let address = m.as_str();
                if !found.iter().any(|a| a.eq_ignore_ascii_case(address)) {
                    found.push(address.to_string());
                }
            }
        }

        found
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn dextools_chain(slug: &str) -> String {
    match slug {
        "ether" => "ethereum",
        "bnb" => "bsc",
        other => other,
    }
    .to_string()
}

fn swap_chain(param: &str) -> String {
    match param {
        "mainnet" | "eth" => "ethereum",
        "bnb" => "bsc",
        "matic" => "polygon",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEPE_PAIR: &str = "0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f";
    const PEPE_TOKEN: &str = "0x6982508145454Ce325dDbE47a25d4ec3d2311933";

    fn post(text: &str, links: &[&str]) -> PostRecord {
        PostRecord::new(text, links.iter().map(|l| l.to_string()).collect(), None)
    }

    #[test]
    fn dexscreener_link_is_a_direct_pair() {
        let extractor = LinkExtractor::new();
        let link = format!("https://dexscreener.com/ethereum/{}", PEPE_PAIR);

        assert_eq!(
            extractor.match_link(&link),
            Some(LinkMatch::Pair(DexPairReference::new("ethereum", PEPE_PAIR)))
        );
    }

    #[test]
    fn dexscreener_non_pair_pages_are_ignored() {
        let extractor = LinkExtractor::new();
        assert_eq!(extractor.match_link("https://dexscreener.com/ethereum"), None);
        assert_eq!(extractor.match_link("https://dexscreener.com/watchlist/abc"), None);
    }

    #[test]
    fn uniswap_link_yields_token_with_chain() {
        let extractor = LinkExtractor::new();

        assert_eq!(
            extractor.match_link(&format!("https://app.uniswap.org/#/swap?outputCurrency={}", PEPE_TOKEN)),
            Some(LinkMatch::Token {
                chain: "ethereum".to_string(),
                address: PEPE_TOKEN.to_string()
            })
        );
        assert_eq!(
            extractor.match_link(&format!(
                "https://app.uniswap.org/swap?chain=base&inputCurrency=ETH&outputCurrency={}",
                PEPE_TOKEN
            )),
            Some(LinkMatch::Token {
                chain: "base".to_string(),
                address: PEPE_TOKEN.to_string()
            })
        );
    }

    #[test]
    fn pancakeswap_link_defaults_to_bsc() {
        let extractor = LinkExtractor::new();

        assert_eq!(
            extractor.match_link(&format!("https://pancakeswap.finance/swap?outputCurrency={}", PEPE_TOKEN)),
            Some(LinkMatch::Token {
                chain: "bsc".to_string(),
                address: PEPE_TOKEN.to_string()
            })
        );
    }

    #[test]
    fn swap_link_without_output_currency_is_ignored() {
        let extractor = LinkExtractor::new();
        assert_eq!(extractor.match_link("https://app.uniswap.org/#/swap?inputCurrency=ETH"), None);
    }

    #[test]
    fn dextools_chain_slugs_are_mapped() {
        let extractor = LinkExtractor::new();

        assert_eq!(
            extractor.match_link(&format!("https://www.dextools.io/app/en/ether/pair-explorer/{}", PEPE_PAIR)),
            Some(LinkMatch::Pair(DexPairReference::new("ethereum", PEPE_PAIR)))
        );
        assert_eq!(
            extractor.match_link(&format!("https://www.dextools.io/app/bnb/pair-explorer/{}", PEPE_PAIR)),
            Some(LinkMatch::Pair(DexPairReference::new("bsc", PEPE_PAIR)))
        );
    }

    #[test]
    fn first_match_in_scan_order_wins() {
        let extractor = LinkExtractor::new();
        let posts = vec![
            post("no links here", &[]),
            post(
                "two charts",
                &[
                    "https://t.co/whatever",
                    "https://dexscreener.com/ethereum/0xABC0000000000000000000000000000000000001",
                    "https://dexscreener.com/bsc/0xABC0000000000000000000000000000000000002",
                ],
            ),
            post(
                "older",
                &["https://dexscreener.com/polygon/0xABC0000000000000000000000000000000000003"],
            ),
        ];

        assert_eq!(
            extractor.first_link_match(&posts),
            Some(LinkMatch::Pair(DexPairReference::new(
                "ethereum",
                "0xABC0000000000000000000000000000000000001"
            )))
        );
    }

    #[test]
    fn text_addresses_are_deduplicated_in_order() {
        let extractor = LinkExtractor::new();
        let posts = vec![
            post(&format!("CA: {} 🚀", PEPE_TOKEN), &[]),
            post(&format!("again {} and {}", PEPE_TOKEN.to_lowercase(), PEPE_PAIR), &[]),
            post("0x1234 is too short", &[]),
        ];

        assert_eq!(extractor.text_addresses(&posts), vec![PEPE_TOKEN, PEPE_PAIR]);
    }
}
