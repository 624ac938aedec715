// src/config.rs
// Everything can be overridden from the environment (or a .env file), e.g.
//   TOKEN_ANALYZER__SERVER__BIND_ADDRESS=0.0.0.0:8080
//   TOKEN_ANALYZER__UPSTREAM__REQUESTS_PER_MINUTE=120
//   TOKEN_ANALYZER__ANALYSIS__FALLBACK_CHAINS=ethereum,base

use anyhow::Result;
use ::config::builder::DefaultState;
use ::config::{ConfigBuilder, Environment};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "TOKEN_ANALYZER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// DexScreener API root
    pub dex_screener_url: String,

    /// GeckoTerminal API root, used for daily candles
    pub gecko_terminal_url: String,

    /// Server-rendered profile mirror (Nitter-compatible markup)
    pub profile_mirror_url: String,

    pub timeout_secs: u64,
    pub user_agent: String,

    /// DexScreener quota; 0 disables client-side limiting
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How many recent posts to scan per handle
    pub max_posts: usize,

    /// Chains probed, in order, for a bare 0x address found in post text
    pub fallback_chains: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_environment(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("analysis.fallback_chains")
                .try_parsing(true),
        )
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let config = defaults()?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    let builder = ::config::Config::builder()
        .set_default("server.bind_address", "0.0.0.0:3001")?
        .set_default("upstream.dex_screener_url", "https://api.dexscreener.com")?
        .set_default("upstream.gecko_terminal_url", "https://api.geckoterminal.com/api/v2")?
        .set_default("upstream.profile_mirror_url", "https://nitter.net")?
        .set_default("upstream.timeout_secs", 30)?
        .set_default("upstream.user_agent", "TokenAnalyzer/0.1")?
        .set_default("upstream.requests_per_minute", 300)?
        .set_default("analysis.max_posts", 10)?
        .set_default("analysis.fallback_chains", vec!["ethereum", "bsc", "polygon"])?;

    Ok(builder)
}
