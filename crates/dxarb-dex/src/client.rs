//! HTTP client for the DEX aggregator.
//!
//! Every request passes through the shared [`RequestThrottle`] and the
//! bounded retry wrapper. The aggregate scan methods never fail: each query
//! that errors is logged and skipped, and the scan returns whatever the rest
//! produced.

use crate::config::{DexConfig, RosterEntry};
use crate::error::{DexError, DexResult};
use crate::pairs::PairSet;
use crate::throttle::RequestThrottle;
use crate::wire::{parse_boosted, parse_pairs, BoostedToken, PairsResponse};
use dxarb_core::{with_retry, ChainId, MarketPair, RetryPolicy, WatchToken};
use dxarb_telemetry::Metrics;
use futures_util::future::join_all;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Client for the DEX aggregator API.
pub struct DexClient {
    client: Client,
    config: DexConfig,
    throttle: Arc<RequestThrottle>,
    retry: RetryPolicy,
}

impl DexClient {
    /// Create a client from configuration.
    pub fn new(config: DexConfig) -> DexResult<Self> {
        let throttle = Arc::new(RequestThrottle::new(
            config.min_spacing(),
            config.window_max_requests,
            Duration::from_secs(config.window_secs),
        ));
        Self::with_throttle(config, throttle)
    }

    /// Create a client sharing an existing throttle.
    pub fn with_throttle(config: DexConfig, throttle: Arc<RequestThrottle>) -> DexResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DexError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let retry = RetryPolicy::linear(config.max_attempts, config.retry_delay());

        Ok(Self {
            client,
            config,
            throttle,
            retry,
        })
    }

    pub fn config(&self) -> &DexConfig {
        &self.config
    }

    /// Full-text pair search.
    pub async fn search_pairs(&self, query: &str) -> DexResult<Vec<MarketPair>> {
        let url = format!("{}/dex/search", self.config.base_url);
        let response: PairsResponse = self.get_json("search", &url, &[("q", query)]).await?;
        Ok(parse_pairs(response))
    }

    /// Highest-liquidity pair for a token, preferring pairs on `chain`.
    pub async fn token_pair(&self, chain: &ChainId, address: &str) -> DexResult<Option<MarketPair>> {
        let url = format!("{}/dex/tokens/{}", self.config.base_url, address);
        let response: PairsResponse = match self.get_json("token", &url, &[]).await {
            Ok(r) => r,
            Err(DexError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let pairs = parse_pairs(response);
        let on_chain: Vec<&MarketPair> = pairs.iter().filter(|p| &p.chain == chain).collect();
        let candidates = if on_chain.is_empty() {
            pairs.iter().collect()
        } else {
            on_chain
        };

        Ok(candidates
            .into_iter()
            .max_by_key(|p| p.liquidity_usd)
            .cloned())
    }

    /// Latest boosted tokens. `Ok(None)` when the feed is not offered (404).
    pub async fn boosted_tokens(&self) -> DexResult<Option<Vec<BoostedToken>>> {
        let url = self.config.boosts_url.clone();
        match self.get_json::<serde_json::Value>("boosts", &url, &[]).await {
            Ok(value) => Ok(Some(parse_boosted(value))),
            Err(DexError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Aggregate candidates: roster queries, then the boosted feed or its
    /// trending fallback. Deduplicated by pair address.
    pub async fn fetch_candidate_pairs(&self) -> Vec<MarketPair> {
        let started = Instant::now();
        let mut set = PairSet::new();

        for entry in &self.config.roster {
            set.extend(self.roster_pairs(entry).await);
        }
        set.extend(self.primary_feed_pairs().await);

        self.finish_scan(set, started, false)
    }

    /// Same as [`fetch_candidate_pairs`](Self::fetch_candidate_pairs) with the
    /// roster chains queried in parallel. Fan-out is one task per roster
    /// entry; all of them share this client's throttle.
    pub async fn fetch_candidate_pairs_concurrent(&self) -> Vec<MarketPair> {
        let started = Instant::now();
        let mut set = PairSet::new();

        let per_chain = join_all(self.config.roster.iter().map(|e| self.roster_pairs(e))).await;
        for pairs in per_chain {
            set.extend(pairs);
        }
        set.extend(self.primary_feed_pairs().await);

        self.finish_scan(set, started, true)
    }

    /// Look up each watchlist token in turn, pausing between lookups.
    pub async fn fetch_watchlist(&self, watchlist: &[WatchToken]) -> Vec<MarketPair> {
        let mut set = PairSet::new();
        for (idx, token) in watchlist.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.config.watchlist_delay()).await;
            }
            match self.token_pair(&token.chain, &token.address).await {
                Ok(Some(pair)) => {
                    set.insert(pair);
                }
                Ok(None) => debug!(symbol = %token.symbol, "Watchlist token has no pairs"),
                Err(e) => warn!(symbol = %token.symbol, error = %e, "Watchlist lookup failed"),
            }
        }
        info!(count = set.len(), "Watchlist pairs fetched");
        set.into_capped(self.config.max_pairs)
    }

    async fn roster_pairs(&self, entry: &RosterEntry) -> Vec<MarketPair> {
        let mut out = Vec::new();
        for term in &entry.seed_terms {
            match self.search_pairs(term).await {
                Ok(pairs) => out.extend(pairs.into_iter().filter(|p| p.chain == entry.chain)),
                Err(e) => warn!(chain = %entry.chain, term = %term, error = %e, "Roster query failed"),
            }
        }
        debug!(chain = %entry.chain, count = out.len(), "Roster chain scanned");
        out
    }

    async fn primary_feed_pairs(&self) -> Vec<MarketPair> {
        match self.boosted_tokens().await {
            Ok(Some(tokens)) if !tokens.is_empty() => self.boosted_pairs(tokens).await,
            Ok(_) => {
                info!("Boosted feed unavailable, using trending search");
                self.trending_pairs().await
            }
            Err(e) => {
                warn!(error = %e, "Boosted feed failed, using trending search");
                self.trending_pairs().await
            }
        }
    }

    async fn boosted_pairs(&self, tokens: Vec<BoostedToken>) -> Vec<MarketPair> {
        let mut out = Vec::new();
        for token in tokens.into_iter().take(self.config.max_boosted_tokens) {
            let chain = ChainId::new(&token.chain_id);
            match self.token_pair(&chain, &token.token_address).await {
                Ok(Some(pair)) => out.push(pair),
                Ok(None) => {}
                Err(e) => {
                    warn!(token = %token.token_address, error = %e, "Boosted token lookup failed")
                }
            }
        }
        out
    }

    async fn trending_pairs(&self) -> Vec<MarketPair> {
        let mut out = Vec::new();
        for term in &self.config.trending_terms {
            if out.len() >= self.config.trending_cap {
                break;
            }
            match self.search_pairs(term).await {
                Ok(pairs) => out.extend(pairs.into_iter().take(self.config.trending_per_term)),
                Err(e) => warn!(term = %term, error = %e, "Trending query failed"),
            }
        }
        out.truncate(self.config.trending_cap);
        out
    }

    fn finish_scan(&self, set: PairSet, started: Instant, concurrent: bool) -> Vec<MarketPair> {
        let pairs = set.into_capped(self.config.max_pairs);
        info!(
            count = pairs.len(),
            concurrent,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Candidate pairs fetched"
        );
        pairs
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> DexResult<T> {
        let started = Instant::now();
        let result = with_retry(&self.retry, op, || async move {
            self.throttle.acquire().await;

            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| DexError::Transport(format!("{op}: {e}")))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(DexError::NotFound(url.to_string()));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DexError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            response
                .json::<T>()
                .await
                .map_err(|e| DexError::Parse(format!("{op}: {e}")))
        })
        .await;

        Metrics::request_latency("dex", op, started.elapsed().as_secs_f64() * 1000.0);
        result.map_err(DexError::from)
    }
}
