use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;

use crate::analyzers::link_extractor::{LinkExtractor, LinkMatch};
use crate::analyzers::sentiment::SentimentAnalyzer;
use crate::config::AnalysisConfig;
use crate::error::AnalyzerResult;
use crate::models::{
    AnalysisOptions, AnalysisOutcome, DexPairReference, PostRecord, TokenReport, NO_POSTS_MESSAGE,
};
use crate::scanners::dex_screener::MarketDataSource;
use crate::scanners::gecko_terminal::PriceHistorySource;
use crate::scanners::profile_posts::PostSource;
use crate::utils::{format_number, normalize_identifier};

pub const MISSING_IDENTIFIER_MESSAGE: &str = "Token identifier is required";

/// Handle-or-name in, market snapshot out.
///
/// Every data source is injected, so one analyzer can be shared across
/// requests and tests can swap in canned upstreams.
pub struct TokenAnalyzer {
    posts: Arc<dyn PostSource>,
    market: Arc<dyn MarketDataSource>,
    history: Arc<dyn PriceHistorySource>,
    extractor: LinkExtractor,
    sentiment: SentimentAnalyzer,
    max_posts: usize,
    fallback_chains: Vec<String>,
}

impl TokenAnalyzer {
    pub fn new(
        posts: Arc<dyn PostSource>,
        market: Arc<dyn MarketDataSource>,
        history: Arc<dyn PriceHistorySource>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            posts,
            market,
            history,
            extractor: LinkExtractor::new(),
            sentiment: SentimentAnalyzer::new(),
            max_posts: config.max_posts.max(1),
            fallback_chains: config.fallback_chains.clone(),
        }
    }

    /// Main analysis function. Never returns an error: every failure becomes
    /// a `Failed` outcome with a readable message.
    pub async fn analyze_token(&self, identifier: &str, options: AnalysisOptions) -> AnalysisOutcome {
        let handle = normalize_identifier(identifier);
        if handle.is_empty() {
            return AnalysisOutcome::failed(MISSING_IDENTIFIER_MESSAGE);
        }

        info!("🔬 Starting analysis of @{}", handle);

        match self.run(handle, options).await {
            Ok(outcome) => {
                match &outcome {
                    AnalysisOutcome::Found(report) => info!(
                        "📊 Analysis complete for @{}: {} ({}) on {}",
                        handle, report.snapshot.symbol, report.snapshot.name, report.snapshot.chain
                    ),
                    AnalysisOutcome::PreLaunch => info!("🌱 No pair yet for @{}, possibly pre-launch", handle),
                    AnalysisOutcome::Failed { message } => warn!("❌ Analysis failed for @{}: {}", handle, message),
                }
                outcome
            }
            Err(e) => {
                warn!("❌ Analysis failed for @{}: {}", handle, e);
                AnalysisOutcome::failed(e.to_string())
            }
        }
    }

    async fn run(&self, handle: &str, options: AnalysisOptions) -> AnalyzerResult<AnalysisOutcome> {
        // 1. POSTS
        let posts = match self.posts.fetch_recent_posts(handle, self.max_posts).await {
            Ok(posts) if !posts.is_empty() => posts,
            Ok(_) => {
                warn!("No posts returned for @{}", handle);
                return Ok(AnalysisOutcome::failed(NO_POSTS_MESSAGE));
            }
            Err(e) => {
                warn!("Failed to fetch posts for @{}: {}", handle, e);
                return Ok(AnalysisOutcome::failed(NO_POSTS_MESSAGE));
            }
        };

        // 2. PAIR DISCOVERY
        let Some(pair) = self.resolve_pair(&posts).await else {
            return Ok(AnalysisOutcome::PreLaunch);
        };
        info!("🎯 Using pair {} on {}", pair.pair_address, pair.chain);

        // 3. MARKET DATA (fatal on failure)
        let snapshot = self.market.pair_snapshot(&pair).await?;
        info!(
            "💧 {} liquidity ${}, 24h volume ${}",
            snapshot.symbol,
            format_number(snapshot.liquidity_usd.unwrap_or_default()),
            format_number(snapshot.volume_24h.unwrap_or_default())
        );

        // 4. HISTORY (optional, degrades to absent)
        let historical_data = if options.include_historical_data {
            match self.history.daily_history(&pair, options.historical_days).await {
                Ok(points) => Some(points),
                Err(e) => {
                    warn!("Historical data unavailable for {}: {}", pair.pair_address, e);
                    None
                }
            }
        } else {
            None
        };

        // 5. SENTIMENT (optional, local)
        let sentiment = options
            .include_sentiment
            .then(|| self.sentiment.analyze(&posts));

        Ok(AnalysisOutcome::Found(Box::new(TokenReport {
            snapshot,
            historical_data,
            sentiment,
        })))
    }

    /// Links first (first match wins), then the first bare address in post
    /// text probed across the fallback chains.
    async fn resolve_pair(&self, posts: &[PostRecord]) -> Option<DexPairReference> {
        if let Some(link_match) = self.extractor.first_link_match(posts) {
            return match link_match {
                LinkMatch::Pair(pair) => Some(pair),
                LinkMatch::Token { chain, address } => self
                    .find_pair_address_from_token(&chain, &address)
                    .await
                    .map(|pair_address| DexPairReference::new(chain, pair_address)),
            };
        }

        let address = self.extractor.text_addresses(posts).into_iter().next()?;
        for chain in &self.fallback_chains {
            if let Some(pair_address) = self.find_pair_address_from_token(chain, &address).await {
                return Some(DexPairReference::new(chain.as_str(), pair_address));
            }
        }

        None
    }

    /// First pool trading `token_address` on `chain`. Lookup errors count as "none".
    pub async fn find_pair_address_from_token(&self, chain: &str, token_address: &str) -> Option<String> {
        match self.market.token_pairs(chain, token_address).await {
            Ok(pairs) => pairs.into_iter().next(),
            Err(e) => {
                warn!("Pair lookup for {} on {} failed: {}", token_address, chain, e);
                None
            }
        }
    }

    /// Analyze several identifiers concurrently. Results keep input order and
    /// each slot carries its own outcome, so one failure never sinks the batch.
    pub async fn compare_tokens(&self, identifiers: &[String], options: AnalysisOptions) -> Vec<AnalysisOutcome> {
        info!("⚖️ Comparing {} tokens", identifiers.len());

        let results = join_all(identifiers.iter().map(|id| self.analyze_token(id, options))).await;

        let priced = results.iter().filter(|r| r.report().is_some()).count();
        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!("⚖️ Comparison done: {} priced, {} failed", priced, failed);

        results
    }
}
