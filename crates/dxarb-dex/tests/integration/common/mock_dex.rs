//! Mock DEX aggregator for integration tests.
//!
//! Serves canned search, token and boosted-feed responses and records every
//! request path it sees.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dxarb_dex::DexConfig;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How the boosted feed answers.
#[derive(Debug, Clone)]
pub enum BoostsMode {
    Feed(Value),
    NotFound,
    ServerError,
}

pub struct MockDexState {
    search: Mutex<HashMap<String, Value>>,
    tokens: Mutex<HashMap<String, Value>>,
    boosts: Mutex<BoostsMode>,
    search_failures_left: AtomicU32,
    hits: Mutex<Vec<String>>,
}

/// A mock aggregator bound to an ephemeral port.
pub struct MockDexServer {
    addr: SocketAddr,
    state: Arc<MockDexState>,
    handle: JoinHandle<()>,
}

impl MockDexServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockDexState {
            search: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            boosts: Mutex::new(BoostsMode::NotFound),
            search_failures_left: AtomicU32::new(0),
            hits: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/latest/dex/search", get(search))
            .route("/latest/dex/tokens/{address}", get(token))
            .route("/token-boosts/latest/v1", get(boosts))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Client config pointing at this server with fast timings.
    pub fn config(&self) -> DexConfig {
        DexConfig {
            base_url: format!("http://{}/latest", self.addr),
            boosts_url: format!("http://{}/token-boosts/latest/v1", self.addr),
            timeout_secs: 5,
            min_spacing_ms: 0,
            window_max_requests: 0,
            retry_delay_ms: 1,
            roster: Vec::new(),
            trending_terms: Vec::new(),
            watchlist_delay_ms: 1,
            ..DexConfig::default()
        }
    }

    pub fn set_search(&self, query: &str, pairs: Vec<Value>) {
        self.state
            .search
            .lock()
            .insert(query.to_string(), json!({ "pairs": pairs }));
    }

    pub fn set_token(&self, address: &str, pairs: Vec<Value>) {
        self.state
            .tokens
            .lock()
            .insert(address.to_string(), json!({ "pairs": pairs }));
    }

    pub fn set_boosts(&self, mode: BoostsMode) {
        *self.state.boosts.lock() = mode;
    }

    /// Make the next `n` search requests answer HTTP 500.
    pub fn fail_next_searches(&self, n: u32) {
        self.state.search_failures_left.store(n, Ordering::SeqCst);
    }

    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().clone()
    }

    pub fn hit_count(&self, prefix: &str) -> usize {
        self.hits().iter().filter(|h| h.starts_with(prefix)).count()
    }
}

impl Drop for MockDexServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Aggregator-shaped pair JSON.
pub fn pair_json(chain: &str, pair_address: &str, symbol: &str, liquidity_usd: f64) -> Value {
    json!({
        "chainId": chain,
        "dexId": "uniswap",
        "pairAddress": pair_address,
        "baseToken": {
            "address": format!("0x{}", symbol.to_lowercase()),
            "name": symbol,
            "symbol": symbol
        },
        "quoteToken": {"address": "0xquote", "symbol": "WETH"},
        "priceUsd": "1.00",
        "liquidity": {"usd": liquidity_usd},
        "volume": {"h24": 100000.0},
        "priceChange": {"h24": 1.5}
    })
}

async fn search(
    State(state): State<Arc<MockDexState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let q = params.get("q").cloned().unwrap_or_default();
    state.hits.lock().push(format!("search:{q}"));

    let failing = state
        .search_failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response();
    }

    let body = state
        .search
        .lock()
        .get(&q)
        .cloned()
        .unwrap_or_else(|| json!({ "pairs": [] }));
    Json(body).into_response()
}

async fn token(State(state): State<Arc<MockDexState>>, Path(address): Path<String>) -> Response {
    state.hits.lock().push(format!("token:{address}"));
    match state.tokens.lock().get(&address).cloned() {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn boosts(State(state): State<Arc<MockDexState>>) -> Response {
    state.hits.lock().push("boosts".to_string());
    let mode = state.boosts.lock().clone();
    match mode {
        BoostsMode::Feed(body) => Json(body).into_response(),
        BoostsMode::NotFound => StatusCode::NOT_FOUND.into_response(),
        BoostsMode::ServerError => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
