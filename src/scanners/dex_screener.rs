// Market data for a resolved pair, straight from the DexScreener public API.
//
// Two lookups are used:
//   GET /latest/dex/pairs/{chain}/{pair}         -> price, liquidity, volume, fdv
//   GET /token-pairs/v1/{chain}/{tokenAddress}   -> pools trading a token

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::{debug, info};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::models::{DexPairReference, TokenMarketSnapshot};

const SERVICE: &str = "DexScreener";

/// Anything that can price a pair and list the pairs trading a token.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn pair_snapshot(&self, pair: &DexPairReference) -> AnalyzerResult<TokenMarketSnapshot>;

    /// Pair addresses for `token_address` on `chain`, in the order the API ranks them.
    async fn token_pairs(&self, chain: &str, token_address: &str) -> AnalyzerResult<Vec<String>>;
}

pub struct DexScreenerClient {
    client: Client,
    base_url: String,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl DexScreenerClient {
    pub fn new(client: Client, base_url: &str, requests_per_minute: u32) -> Self {
        let limiter = NonZeroU32::new(requests_per_minute).map(|rpm| RateLimiter::direct(Quota::per_minute(rpm)));

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AnalyzerResult<T> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!("🌐 GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AnalyzerError::Upstream {
                service: SERVICE,
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataSource for DexScreenerClient {
    async fn pair_snapshot(&self, pair: &DexPairReference) -> AnalyzerResult<TokenMarketSnapshot> {
        let url = format!(
            "{}/latest/dex/pairs/{}/{}",
            self.base_url, pair.chain, pair.pair_address
        );

        info!("📈 Fetching market data for {} on {}", pair.pair_address, pair.chain);

        let response: PairsResponse = self.get_json(&url).await?;
        let dex_pair = response
            .pairs
            .and_then(|pairs| pairs.into_iter().next())
            .or(response.pair)
            .ok_or_else(|| AnalyzerError::NoData(format!("no market data for pair {}", pair.pair_address)))?;

        dex_pair.into_snapshot()
    }

    async fn token_pairs(&self, chain: &str, token_address: &str) -> AnalyzerResult<Vec<String>> {
        let url = format!("{}/token-pairs/v1/{}/{}", self.base_url, chain, token_address);

        let pairs: Vec<DexPair> = self.get_json(&url).await?;

        Ok(pairs
            .into_iter()
            .filter(|p| p.chain_id.eq_ignore_ascii_case(chain))
            .map(|p| p.pair_address)
            .collect())
    }
}

// DEX Screener API Response Types
#[derive(Debug, Deserialize)]
struct PairsResponse {
    pairs: Option<Vec<DexPair>>,
    pair: Option<DexPair>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexPair {
    chain_id: String,
    #[serde(default)]
    dex_id: String,
    #[serde(default)]
    url: String,
    pair_address: String,
    base_token: Option<BaseToken>,
    price_usd: Option<String>,
    fdv: Option<f64>,
    market_cap: Option<f64>,
    liquidity: Option<Liquidity>,
    volume: Option<Volume>,
    /// Milliseconds since the epoch
    pair_created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    name: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    h24: Option<f64>,
}

impl DexPair {
    fn into_snapshot(self) -> AnalyzerResult<TokenMarketSnapshot> {
        let base_token = self
            .base_token
            .ok_or_else(|| AnalyzerError::NoData(format!("pair {} has no base token", self.pair_address)))?;

        let raw_price = self
            .price_usd
            .ok_or_else(|| AnalyzerError::NoData(format!("pair {} has no USD price", self.pair_address)))?;
        let price_usd = Decimal::from_str(&raw_price)
            .or_else(|_| Decimal::from_scientific(&raw_price))
            .map_err(|_| AnalyzerError::Parse(format!("price '{}'", raw_price)))?;

        Ok(TokenMarketSnapshot {
            name: base_token.name,
            symbol: base_token.symbol,
            price_usd,
            market_cap: self.fdv.or(self.market_cap),
            liquidity_usd: self.liquidity.and_then(|l| l.usd),
            volume_24h: self.volume.and_then(|v| v.h24),
            pair_created_at: self
                .pair_created_at
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            chain: self.chain_id,
            pair_address: self.pair_address,
            dex_id: self.dex_id,
            url: self.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_client, spawn_stub};
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn pepe_pair() -> Value {
        json!({
            "chainId": "ethereum",
            "dexId": "uniswap",
            "url": "https://dexscreener.com/ethereum/0xa43fe16908251ee70ef74718545e4fe6c5ccec9f",
            "pairAddress": "0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f",
            "baseToken": { "address": "0x6982508145454Ce325dDbE47a25d4ec3d2311933", "name": "Pepe", "symbol": "PEPE" },
            "quoteToken": { "address": "0xC02a", "name": "Wrapped Ether", "symbol": "WETH" },
            "priceNative": "0.000000003",
            "priceUsd": "0.00001021",
            "liquidity": { "usd": 38000000.5, "base": 1.0, "quote": 2.0 },
            "volume": { "h24": 12500000.0, "h6": 1.0 },
            "fdv": 4290000000.0,
            "marketCap": 4200000000.0,
            "pairCreatedAt": 1681387283000i64
        })
    }

    async fn stub() -> String {
        let app = Router::new()
            .route(
                "/latest/dex/pairs/:chain/:pair",
                get(|Path((chain, pair)): Path<(String, String)>| async move {
                    match (chain.as_str(), pair.as_str()) {
                        ("ethereum", "0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f") => {
                            Json(json!({ "schemaVersion": "1.0.0", "pairs": [pepe_pair()] }))
                        }
                        ("ethereum", "0xlegacy") => Json(json!({ "pair": pepe_pair() })),
                        ("ethereum", "0xnoprice") => {
                            let mut pair = pepe_pair();
                            pair.as_object_mut().unwrap().remove("priceUsd");
                            Json(json!({ "pairs": [pair] }))
                        }
                        _ => Json(json!({ "schemaVersion": "1.0.0", "pairs": null, "pair": null })),
                    }
                }),
            )
            .route(
                "/token-pairs/v1/:chain/:token",
                get(|Path((chain, _token)): Path<(String, String)>| async move {
                    if chain == "ethereum" {
                        let mut other = pepe_pair();
                        other["pairAddress"] = json!("0xsecond");
                        Json(json!([pepe_pair(), other]))
                    } else {
                        Json(json!([]))
                    }
                }),
            )
            .route("/broken/latest/dex/pairs/:chain/:pair", get(|| async { StatusCode::TOO_MANY_REQUESTS }));

        spawn_stub(app).await
    }

    #[tokio::test]
    async fn pair_snapshot_maps_fields() {
        let base = stub().await;
        let client = DexScreenerClient::new(http_client(), &base, 0);

        let snapshot = client
            .pair_snapshot(&DexPairReference::new("ethereum", "0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f"))
            .await
            .unwrap();

        assert_eq!(snapshot.name, "Pepe");
        assert_eq!(snapshot.symbol, "PEPE");
        assert_eq!(snapshot.price_usd, Decimal::from_str("0.00001021").unwrap());
        // fdv wins over marketCap
        assert_eq!(snapshot.market_cap, Some(4_290_000_000.0));
        assert_eq!(snapshot.liquidity_usd, Some(38_000_000.5));
        assert_eq!(snapshot.volume_24h, Some(12_500_000.0));
        assert_eq!(snapshot.dex_id, "uniswap");
        assert_eq!(snapshot.chain, "ethereum");
        assert_eq!(
            snapshot.pair_created_at.unwrap().timestamp_millis(),
            1_681_387_283_000
        );
    }

    #[tokio::test]
    async fn legacy_single_pair_shape_is_accepted() {
        let base = stub().await;
        let client = DexScreenerClient::new(http_client(), &base, 300);

        let snapshot = client
            .pair_snapshot(&DexPairReference::new("ethereum", "0xlegacy"))
            .await
            .unwrap();
        assert_eq!(snapshot.symbol, "PEPE");
    }

    #[tokio::test]
    async fn missing_pair_is_no_data() {
        let base = stub().await;
        let client = DexScreenerClient::new(http_client(), &base, 0);

        let err = client
            .pair_snapshot(&DexPairReference::new("ethereum", "0xunknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::NoData(_)));
    }

    #[tokio::test]
    async fn missing_price_is_no_data() {
        let base = stub().await;
        let client = DexScreenerClient::new(http_client(), &base, 0);

        let err = client
            .pair_snapshot(&DexPairReference::new("ethereum", "0xnoprice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::NoData(_)));
    }

    #[tokio::test]
    async fn http_error_status_is_upstream_error() {
        let base = stub().await;
        let client = DexScreenerClient::new(http_client(), &format!("{}/broken/", base), 0);

        let err = client
            .pair_snapshot(&DexPairReference::new("ethereum", "0xanything"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Upstream { status, .. } if status == reqwest::StatusCode::TOO_MANY_REQUESTS
        ));
    }

    #[tokio::test]
    async fn token_pairs_keep_api_order() {
        let base = stub().await;
        let client = DexScreenerClient::new(http_client(), &base, 0);

        let pairs = client
            .token_pairs("ethereum", "0x6982508145454Ce325dDbE47a25d4ec3d2311933")
            .await
            .unwrap();
        assert_eq!(pairs, vec!["0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f", "0xsecond"]);

        let none = client
            .token_pairs("bsc", "0x6982508145454Ce325dDbE47a25d4ec3d2311933")
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
