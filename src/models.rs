// src/models.rs
// Everything here lives for one request at most. Nothing is persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

pub const DEFAULT_HISTORICAL_DAYS: u32 = 7;
pub const MAX_HISTORICAL_DAYS: u32 = 365;
pub const PRE_LAUNCH_MESSAGE: &str = "pair not found, possibly pre-launch";
pub const NO_POSTS_MESSAGE: &str = "could not fetch posts";

/// One post scraped from a profile timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub text: String,
    /// Outbound links in the order they appear in the post
    pub links: Vec<String>,
    #[serde(serialize_with = "date_or_empty")]
    pub date: Option<DateTime<Utc>>,
}

impl PostRecord {
    pub fn new(text: impl Into<String>, links: Vec<String>, date: Option<DateTime<Utc>>) -> Self {
        Self {
            text: text.into(),
            links,
            date,
        }
    }
}

fn date_or_empty<S: Serializer>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&date.to_rfc3339()),
        None => serializer.serialize_str(""),
    }
}

/// A liquidity pool on a specific chain, as named by DexScreener chain ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DexPairReference {
    pub chain: String,
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
}

impl DexPairReference {
    pub fn new(chain: impl Into<String>, pair_address: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            pair_address: pair_address.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenMarketSnapshot {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "priceUSD")]
    pub price_usd: Decimal,
    /// FDV reported by the pair, used as market cap
    #[serde(rename = "marketCap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "liquidityUSD")]
    pub liquidity_usd: Option<f64>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<f64>,
    #[serde(rename = "pairCreatedAt")]
    pub pair_created_at: Option<DateTime<Utc>>,
    pub chain: String,
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
    #[serde(rename = "dexId")]
    pub dex_id: String,
    pub url: String,
}

/// One daily OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketMood {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewsTone {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentimentReport {
    pub overall: MarketMood,
    pub price: MarketMood,
    pub news: NewsTone,
}

/// Market snapshot plus whichever enrichments were requested and succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenReport {
    #[serde(flatten)]
    pub snapshot: TokenMarketSnapshot,
    #[serde(rename = "historicalData", skip_serializing_if = "Option::is_none")]
    pub historical_data: Option<Vec<HistoricalPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub include_historical_data: bool,
    pub historical_days: u32,
    pub include_sentiment: bool,
}

impl AnalysisOptions {
    pub fn new(include_historical_data: bool, historical_days: Option<u32>, include_sentiment: bool) -> Self {
        let historical_days = historical_days
            .unwrap_or(DEFAULT_HISTORICAL_DAYS)
            .clamp(1, MAX_HISTORICAL_DAYS);

        Self {
            include_historical_data,
            historical_days,
            include_sentiment,
        }
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new(false, None, false)
    }
}

/// Terminal state of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Found(Box<TokenReport>),
    /// Posts were read but no tradable pair could be located yet
    PreLaunch,
    Failed { message: String },
}

impl AnalysisOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        AnalysisOutcome::Failed {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, AnalysisOutcome::Failed { .. })
    }

    pub fn report(&self) -> Option<&TokenReport> {
        match self {
            AnalysisOutcome::Found(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct OutcomeBody<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(flatten)]
    report: Option<&'a TokenReport>,
}

impl Serialize for AnalysisOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            AnalysisOutcome::Found(report) => OutcomeBody {
                success: true,
                message: None,
                report: Some(report),
            },
            AnalysisOutcome::PreLaunch => OutcomeBody {
                success: true,
                message: Some(PRE_LAUNCH_MESSAGE),
                report: None,
            },
            AnalysisOutcome::Failed { message } => OutcomeBody {
                success: false,
                message: Some(message),
                report: None,
            },
        };
        body.serialize(serializer)
    }
}
