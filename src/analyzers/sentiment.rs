use log::info;

use crate::models::{MarketMood, NewsTone, PostRecord, SentimentReport};

const BULLISH_TERMS: &[&str] = &[
    "moon", "mooning", "pump", "pumping", "bullish", "ath", "breakout", "rally", "lfg", "wagmi",
    "10x", "100x", "1000x", "gem", "buy", "buying", "bought", "accumulate", "accumulating", "hodl",
    "green", "higher", "send", "sending", "🚀", "📈", "💎",
];

const BEARISH_TERMS: &[&str] = &[
    "dump", "dumping", "dumped", "bearish", "crash", "crashing", "rekt", "sell", "selling", "sold",
    "dip", "red", "bleeding", "down", "lower", "ngmi", "short", "exit", "📉",
];

const POSITIVE_NEWS_TERMS: &[&str] = &[
    "partnership", "partner", "listing", "listed", "launch", "launched", "live", "audit", "audited",
    "milestone", "announce", "announcement", "integration", "upgrade", "release", "released",
    "burn", "burned", "verified", "doxxed", "renounced", "locked",
];

const NEGATIVE_NEWS_TERMS: &[&str] = &[
    "rug", "rugged", "rugpull", "scam", "hack", "hacked", "exploit", "exploited", "delay",
    "delayed", "delist", "delisted", "lawsuit", "sec", "fud", "honeypot", "drained", "warning",
    "vulnerability", "paused", "investigation",
];

/// Keyword-count sentiment over a handful of posts. Deterministic for a given input.
pub struct SentimentAnalyzer;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TermCounts {
    bullish: usize,
    bearish: usize,
    positive_news: usize,
    negative_news: usize,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, posts: &[PostRecord]) -> SentimentReport {
        let counts = posts.iter().fold(TermCounts::default(), |mut acc, post| {
            for token in tokenize(&post.text) {
                let token = token.as_str();
                if BULLISH_TERMS.contains(&token) {
                    acc.bullish += 1;
                }
                if BEARISH_TERMS.contains(&token) {
                    acc.bearish += 1;
                }
                if POSITIVE_NEWS_TERMS.contains(&token) {
                    acc.positive_news += 1;
                }
                if NEGATIVE_NEWS_TERMS.contains(&token) {
                    acc.negative_news += 1;
                }
            }
            acc
        });

        let report = SentimentReport {
            overall: mood(
                counts.bullish + counts.positive_news,
                counts.bearish + counts.negative_news,
            ),
            price: mood(counts.bullish, counts.bearish),
            news: tone(counts.positive_news, counts.negative_news),
        };

        info!(
            "🎭 Sentiment over {} posts: {:?} (bull={}, bear={}, +news={}, -news={})",
            posts.len(),
            report.overall,
            counts.bullish,
            counts.bearish,
            counts.positive_news,
            counts.negative_news
        );

        report
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased words plus the signal emoji, punctuation stripped.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() {
            word.extend(c.to_lowercase());
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if matches!(c, '🚀' | '📈' | '📉' | '💎') {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }

    tokens
}

/// Net balance of positive vs negative hits, in [-1, 1].
fn balance(positive: usize, negative: usize) -> Option<f64> {
    let total = positive + negative;
    if total == 0 {
        return None;
    }
    Some((positive as f64 - negative as f64) / total as f64)
}

fn mood(positive: usize, negative: usize) -> MarketMood {
    let strong = positive + negative >= 3;

    match balance(positive, negative) {
        Some(net) if net >= 0.6 && strong => MarketMood::VeryBullish,
        Some(net) if net > 0.2 => MarketMood::Bullish,
        Some(net) if net <= -0.6 && strong => MarketMood::VeryBearish,
        Some(net) if net < -0.2 => MarketMood::Bearish,
        _ => MarketMood::Neutral,
    }
}

fn tone(positive: usize, negative: usize) -> NewsTone {
    match balance(positive, negative) {
        Some(net) if net > 0.2 => NewsTone::Positive,
        Some(net) if net < -0.2 => NewsTone::Negative,
        _ => NewsTone::Neutral,
    }
}
