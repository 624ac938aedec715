// src/main.rs
use anyhow::Result;
use log::{error, info};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

mod analyzers;
mod api;
mod config;
mod error;
mod models;
mod scanners;
mod utils;

#[cfg(test)]
mod test_support;

use crate::analyzers::token_analyzer::TokenAnalyzer;
use crate::config::Config;
use crate::scanners::dex_screener::DexScreenerClient;
use crate::scanners::gecko_terminal::GeckoTerminalClient;
use crate::scanners::profile_posts::ProfileScraper;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("🚀 Starting Token Analyzer");

    // Load configuration
    let config = Config::load()?;
    info!("✅ Configuration loaded");

    // One HTTP client shared by every upstream
    let client = Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_secs))
        .user_agent(config.upstream.user_agent.as_str())
        .build()?;

    let posts = Arc::new(ProfileScraper::new(client.clone(), &config.upstream.profile_mirror_url));
    let market = Arc::new(DexScreenerClient::new(
        client.clone(),
        &config.upstream.dex_screener_url,
        config.upstream.requests_per_minute,
    ));
    let history = Arc::new(GeckoTerminalClient::new(client, &config.upstream.gecko_terminal_url));

    let analyzer = Arc::new(TokenAnalyzer::new(posts, market, history, &config.analysis));
    info!(
        "✅ Analyzer ready (max {} posts, fallback chains: {})",
        config.analysis.max_posts,
        config.analysis.fallback_chains.join(", ")
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    info!("🔥 Listening on {}", listener.local_addr()?);

    axum::serve(listener, api::routes(analyzer))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Token Analyzer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
