//! HTTP server implementation using axum.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use dxarb_telemetry::Metrics;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::DashboardConfig;
use crate::state::DashboardState;
use crate::types::{HealthResponse, StatusResponse, TradesResponse};

const DEFAULT_TRADE_LIMIT: usize = 50;
const MAX_TRADE_LIMIT: usize = 1000;

/// Shared application state for axum handlers.
#[derive(Clone)]
struct AppState {
    dashboard: DashboardState,
    config: DashboardConfig,
}

#[derive(Debug, Deserialize)]
struct TradesQuery {
    limit: Option<usize>,
}

/// Create the axum router.
pub fn create_router(dashboard: DashboardState, config: DashboardConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(get_status))
        .route("/api/trades", get(get_trades))
        .route("/metrics", get(get_metrics))
        .layer(cors)
        .with_state(AppState { dashboard, config })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, Response> {
    authorize(&state, &headers)?;
    Ok(Json(state.dashboard.status()))
}

async fn get_trades(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TradesQuery>,
) -> Result<Json<TradesResponse>, Response> {
    authorize(&state, &headers)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TRADE_LIMIT)
        .min(MAX_TRADE_LIMIT);
    Ok(Json(state.dashboard.trades(limit)))
}

async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        Metrics::render(),
    )
        .into_response()
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    if state.config.auth_enabled() && !check_basic_auth(headers, &state.config) {
        return Err(unauthorized_response());
    }
    Ok(())
}

/// Check basic authentication.
fn check_basic_auth(headers: &HeaderMap, config: &DashboardConfig) -> bool {
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Basic "))
    else {
        return false;
    };

    let Some(decoded) = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    decoded == format!("{}:{}", config.username, config.password)
}

/// Create an unauthorized response.
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"dxarb\"")],
        "Unauthorized",
    )
        .into_response()
}

/// Run the dashboard HTTP server until the listener fails.
pub async fn run_server(
    dashboard: DashboardState,
    config: DashboardConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = config.socket_addr();
    info!(%addr, auth = config.auth_enabled(), "Starting dashboard server");

    let app = create_router(dashboard, config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
