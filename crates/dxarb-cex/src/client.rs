//! HTTP client for the XT-style v4 REST API.
//!
//! Public endpoints need no credentials. Private endpoints are signed per
//! attempt so every retry carries a fresh timestamp.

use crate::config::CexConfig;
use crate::error::{CexError, CexResult, SubmitError};
use crate::signer::{ApiCredentials, RequestSigner, API_KEY_HEADER};
use crate::wire::{
    normalize_balances, normalize_depth, normalize_symbols, normalize_ticker, order_params,
    Envelope, RawBalances, RawDepth, RawOrderResult, SymbolsResult,
};
use dxarb_core::{
    with_retry, Balances, CexQuote, OrderAck, OrderBook, OrderRequest, RetryPolicy, SymbolInfo,
    TradingSwitch,
};
use dxarb_telemetry::Metrics;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Client for the exchange REST API.
pub struct CexClient {
    client: Client,
    config: CexConfig,
    signer: Option<RequestSigner>,
    switch: Arc<TradingSwitch>,
    retry: RetryPolicy,
}

impl CexClient {
    /// Create a client. Without credentials, private calls are unavailable.
    pub fn new(
        config: CexConfig,
        credentials: Option<ApiCredentials>,
        switch: Arc<TradingSwitch>,
    ) -> CexResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CexError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        if credentials.is_none() {
            warn!("CEX credentials not configured, private endpoints disabled");
        }

        let retry = RetryPolicy::linear(config.max_attempts, config.retry_delay());

        Ok(Self {
            client,
            config,
            signer: credentials.map(RequestSigner::new),
            switch,
            retry,
        })
    }

    pub fn config(&self) -> &CexConfig {
        &self.config
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    /// Instrument catalog.
    pub async fn fetch_symbols(&self) -> CexResult<Vec<SymbolInfo>> {
        let result: Option<SymbolsResult> = self
            .get("symbols", "/v4/public/symbol", BTreeMap::new(), false)
            .await?;
        let symbols = normalize_symbols(result);
        debug!(count = symbols.len(), "Symbol catalog fetched");
        Ok(symbols)
    }

    /// Last price for `symbol`. A symbol the exchange rejects is absent.
    pub async fn fetch_ticker(&self, symbol: &str) -> CexResult<Option<CexQuote>> {
        let params = BTreeMap::from([("symbol".to_string(), symbol.to_string())]);
        let result = self
            .get::<serde_json::Value>("ticker", "/v4/public/ticker/price", params, false)
            .await;
        match result {
            Ok(result) => Ok(normalize_ticker(symbol, result)),
            Err(CexError::Api { code, message }) => {
                debug!(symbol, code, message = %message, "Ticker rejected");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Depth snapshot. A rejected symbol or an empty book is absent.
    pub async fn fetch_order_book(&self, symbol: &str, depth: u32) -> CexResult<Option<OrderBook>> {
        let params = BTreeMap::from([
            ("symbol".to_string(), symbol.to_string()),
            ("limit".to_string(), depth.to_string()),
        ]);
        match self.get::<RawDepth>("depth", "/v4/public/depth", params, false).await {
            Ok(result) => Ok(normalize_depth(result)),
            Err(CexError::Api { code, message }) => {
                debug!(symbol, code, message = %message, "Depth rejected");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Account balances, `None` without credentials.
    pub async fn fetch_balances(&self) -> CexResult<Option<Balances>> {
        if self.signer.is_none() {
            return Ok(None);
        }
        let result: Option<RawBalances> =
            self.get("balances", "/v4/balances", BTreeMap::new(), true).await?;
        Ok(Some(normalize_balances(result)))
    }

    /// Submit an order.
    ///
    /// Returns `Ok(None)` without touching the network while live trading is
    /// off. Retries only when the connection could not be established.
    pub async fn submit_order(&self, request: &OrderRequest) -> CexResult<Option<OrderAck>> {
        if !self.switch.is_enabled() {
            info!(
                symbol = %request.symbol,
                side = %request.side,
                "Live trading disabled, order not sent"
            );
            return Ok(None);
        }
        let signer = self.signer.as_ref().ok_or(CexError::MissingCredentials)?;

        let url = format!("{}/v4/order", self.config.base_url);
        let params = order_params(request);
        let started = Instant::now();

        let result = with_retry(&self.retry, "place_order", || {
            let params = params.clone();
            let url = url.as_str();
            async move {
                let body = signer
                    .sign_params(params, chrono::Utc::now().timestamp_millis())
                    .map_err(SubmitError)?;
                let builder = self
                    .client
                    .post(url)
                    .header(API_KEY_HEADER, signer.api_key())
                    .json(&body);
                self.send::<RawOrderResult>("place_order", builder)
                    .await
                    .map_err(SubmitError)
            }
        })
        .await;

        Metrics::request_latency("cex", "place_order", started.elapsed().as_secs_f64() * 1000.0);

        let raw = result.map_err(CexError::from)?;
        let order_id = raw
            .as_ref()
            .and_then(RawOrderResult::order_id)
            .ok_or_else(|| CexError::Parse("order accepted without orderId".to_string()))?;

        info!(
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            order_id = %order_id,
            "Order placed"
        );

        Ok(Some(OrderAck {
            order_id,
            client_order_id: request.client_order_id.clone(),
        }))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        op: &'static str,
        path: &str,
        params: BTreeMap<String, String>,
        signed: bool,
    ) -> CexResult<Option<T>> {
        let url = format!("{}{}", self.config.base_url, path);
        let started = Instant::now();

        let result = with_retry(&self.retry, op, || {
            let params = params.clone();
            let url = url.as_str();
            async move {
                let builder = match (&self.signer, signed) {
                    (Some(signer), true) => {
                        let query =
                            signer.sign_params(params, chrono::Utc::now().timestamp_millis())?;
                        self.client
                            .get(url)
                            .header(API_KEY_HEADER, signer.api_key())
                            .query(&query)
                    }
                    (None, true) => return Err(CexError::MissingCredentials),
                    (_, false) => self.client.get(url).query(&params),
                };
                self.send::<T>(op, builder).await
            }
        })
        .await;

        Metrics::request_latency("cex", op, started.elapsed().as_secs_f64() * 1000.0);
        result.map_err(CexError::from)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        op: &str,
        builder: RequestBuilder,
    ) -> CexResult<Option<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| CexError::from_reqwest(op, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CexError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| CexError::Parse(format!("{op}: {e}")))?;
        envelope.into_result()
    }
}
