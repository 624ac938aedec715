// Daily candles for a pool. DexScreener has no public history endpoint, so
// this goes to GeckoTerminal, which keys pools by its own network ids.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::info;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{DexPairReference, HistoricalPoint};

const SERVICE: &str = "GeckoTerminal";

#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// Up to `days` daily candles, oldest first.
    async fn daily_history(&self, pair: &DexPairReference, days: u32) -> AnalyzerResult<Vec<HistoricalPoint>>;
}

pub struct GeckoTerminalClient {
    client: Client,
    base_url: String,
}

impl GeckoTerminalClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// DexScreener chain id -> GeckoTerminal network id
fn network_id(chain: &str) -> &str {
    match chain {
        "ethereum" => "eth",
        "polygon" => "polygon_pos",
        "avalanche" => "avax",
        other => other,
    }
}

#[async_trait]
impl PriceHistorySource for GeckoTerminalClient {
    async fn daily_history(&self, pair: &DexPairReference, days: u32) -> AnalyzerResult<Vec<HistoricalPoint>> {
        let url = format!(
            "{}/networks/{}/pools/{}/ohlcv/day",
            self.base_url,
            network_id(&pair.chain),
            pair.pair_address
        );

        info!("🕰️ Fetching {} days of history for {} on {}", days, pair.pair_address, pair.chain);

        let response = self
            .client
            .get(&url)
            .query(&[("aggregate", "1".to_string()), ("limit", days.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnalyzerError::Upstream {
                service: SERVICE,
                status: response.status(),
            });
        }

        let body: OhlcvResponse = response.json().await?;
        let mut points = body
            .data
            .attributes
            .ohlcv_list
            .into_iter()
            .map(|[ts, open, high, low, close, volume]| -> AnalyzerResult<HistoricalPoint> {
                let timestamp = Utc
                    .timestamp_opt(ts as i64, 0)
                    .single()
                    .ok_or_else(|| AnalyzerError::Parse(format!("candle timestamp {}", ts)))?;
                Ok(HistoricalPoint {
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                })
            })
            .collect::<AnalyzerResult<Vec<_>>>()?;

        if points.is_empty() {
            return Err(AnalyzerError::NoData(format!("no candles for pool {}", pair.pair_address)));
        }

        // API returns newest first
        points.sort_by_key(|p| p.timestamp);
        let keep = days as usize;
        if points.len() > keep {
            points.drain(..points.len() - keep);
        }

        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct OhlcvResponse {
    data: OhlcvData,
}

#[derive(Debug, Deserialize)]
struct OhlcvData {
    attributes: OhlcvAttributes,
}

#[derive(Debug, Deserialize)]
struct OhlcvAttributes {
    /// [unix seconds, open, high, low, close, volume]
    ohlcv_list: Vec<[f64; 6]>,
}
