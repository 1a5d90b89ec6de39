//! Mock exchange REST server.
//!
//! Answers in the exchange's `{rc, mc, result}` envelope, checks request
//! signatures on private endpoints with a fixed secret, and records every
//! request it receives.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dxarb_cex::signer::{hmac_sha256_hex, RequestSigner, API_KEY_HEADER};
use dxarb_cex::{ApiCredentials, CexConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const API_KEY: &str = "test-key";
pub const SECRET: &str = "test-secret";

pub struct MockXtState {
    symbols: Mutex<Value>,
    tickers: Mutex<HashMap<String, Value>>,
    depth: Mutex<HashMap<String, Value>>,
    balances: Mutex<Value>,
    ticker_failures_left: AtomicU32,
    order_status: Mutex<StatusCode>,
    orders: Mutex<Vec<BTreeMap<String, String>>>,
    hits: Mutex<Vec<String>>,
}

pub struct MockXtServer {
    addr: SocketAddr,
    state: Arc<MockXtState>,
    handle: JoinHandle<()>,
}

impl MockXtServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockXtState {
            symbols: Mutex::new(json!({"rc": 0, "result": {"symbols": []}})),
            tickers: Mutex::new(HashMap::new()),
            depth: Mutex::new(HashMap::new()),
            balances: Mutex::new(json!({"rc": 0, "result": {"assets": []}})),
            ticker_failures_left: AtomicU32::new(0),
            order_status: Mutex::new(StatusCode::OK),
            orders: Mutex::new(Vec::new()),
            hits: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v4/public/symbol", get(symbols))
            .route("/v4/public/ticker/price", get(ticker))
            .route("/v4/public/depth", get(depth))
            .route("/v4/balances", get(balances))
            .route("/v4/order", post(order))
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

    pub fn config(&self) -> CexConfig {
        CexConfig {
            base_url: format!("http://{}", self.addr),
            timeout_secs: 5,
            retry_delay_ms: 1,
            ..CexConfig::default()
        }
    }

    pub fn credentials() -> ApiCredentials {
        ApiCredentials::new(API_KEY, SECRET)
    }

    pub fn set_symbols(&self, body: Value) {
        *self.state.symbols.lock() = body;
    }

    /// Raw envelope returned for `symbol`.
    pub fn set_ticker(&self, symbol: &str, body: Value) {
        self.state.tickers.lock().insert(symbol.to_string(), body);
    }

    pub fn set_depth(&self, symbol: &str, body: Value) {
        self.state.depth.lock().insert(symbol.to_string(), body);
    }

    pub fn set_balances(&self, body: Value) {
        *self.state.balances.lock() = body;
    }

    pub fn fail_next_tickers(&self, n: u32) {
        self.state.ticker_failures_left.store(n, Ordering::SeqCst);
    }

    pub fn set_order_status(&self, status: StatusCode) {
        *self.state.order_status.lock() = status;
    }

    pub fn orders(&self) -> Vec<BTreeMap<String, String>> {
        self.state.orders.lock().clone()
    }

    pub fn hit_count(&self, prefix: &str) -> usize {
        self.state
            .hits
            .lock()
            .iter()
            .filter(|h| h.starts_with(prefix))
            .count()
    }
}

impl Drop for MockXtServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn signature_ok(headers: &HeaderMap, params: &BTreeMap<String, String>) -> bool {
    if headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return false;
    }
    let mut unsigned = params.clone();
    let Some(signature) = unsigned.remove("signature") else {
        return false;
    };
    unsigned.contains_key("timestamp")
        && hmac_sha256_hex(SECRET, &RequestSigner::canonical_query(&unsigned)).unwrap() == signature
}

fn auth_failure() -> Response {
    Json(json!({"rc": 1, "mc": "AUTH_001", "result": null})).into_response()
}

async fn symbols(State(state): State<Arc<MockXtState>>) -> Response {
    state.hits.lock().push("symbols".to_string());
    Json(state.symbols.lock().clone()).into_response()
}

async fn ticker(
    State(state): State<Arc<MockXtState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let symbol = params.get("symbol").cloned().unwrap_or_default();
    state.hits.lock().push(format!("ticker:{symbol}"));

    let failing = state
        .ticker_failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response();
    }

    let body = state
        .tickers
        .lock()
        .get(&symbol)
        .cloned()
        .unwrap_or_else(|| json!({"rc": 1, "mc": "SYMBOL_001", "result": null}));
    Json(body).into_response()
}

async fn depth(
    State(state): State<Arc<MockXtState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let symbol = params.get("symbol").cloned().unwrap_or_default();
    let limit = params.get("limit").cloned().unwrap_or_default();
    state.hits.lock().push(format!("depth:{symbol}:{limit}"));
    let body = state
        .depth
        .lock()
        .get(&symbol)
        .cloned()
        .unwrap_or_else(|| json!({"rc": 1, "mc": "SYMBOL_001", "result": null}));
    Json(body).into_response()
}

async fn balances(
    State(state): State<Arc<MockXtState>>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    state.hits.lock().push("balances".to_string());
    if !signature_ok(&headers, &params) {
        return auth_failure();
    }
    Json(state.balances.lock().clone()).into_response()
}

async fn order(
    State(state): State<Arc<MockXtState>>,
    headers: HeaderMap,
    Json(params): Json<BTreeMap<String, String>>,
) -> Response {
    state.hits.lock().push("order".to_string());
    let status = *state.order_status.lock();
    if status != StatusCode::OK {
        return (status, "order gateway error").into_response();
    }
    if !signature_ok(&headers, &params) {
        return auth_failure();
    }
    state.orders.lock().push(params);
    Json(json!({"rc": 0, "result": {"orderId": 987654321}})).into_response()
}
