//! Latest block / slot per configured chain.
//!
//! EVM endpoints are asked `eth_blockNumber`, Solana endpoints `getSlot`.
//! Probing is best effort: a failed endpoint keeps its last known head.

use crate::config::ChainHeadConfig;
use crate::error::{AppError, AppResult};
use dxarb_core::ChainId;
use dxarb_telemetry::Metrics;
use futures_util::future::join_all;
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

pub struct ChainHeadProbe {
    client: Client,
    endpoints: Vec<(ChainId, String)>,
    heads: RwLock<BTreeMap<String, u64>>,
}

impl ChainHeadProbe {
    pub fn new(config: &ChainHeadConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Rpc(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoints: config.endpoints(),
            heads: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn chains(&self) -> Vec<ChainId> {
        self.endpoints.iter().map(|(c, _)| c.clone()).collect()
    }

    /// Probe every endpoint concurrently and return the updated heads.
    pub async fn refresh(&self) -> BTreeMap<String, u64> {
        let results = join_all(
            self.endpoints
                .iter()
                .map(|(chain, url)| async move { (chain, self.fetch_head(chain, url).await) }),
        )
        .await;

        let mut heads = self.heads.write();
        for (chain, result) in results {
            match result {
                Ok(head) => {
                    debug!(chain = %chain, head, "Chain head");
                    heads.insert(chain.to_string(), head);
                }
                Err(e) => warn!(chain = %chain, error = %e, "Chain head probe failed"),
            }
        }
        heads.clone()
    }

    /// Last known head per chain.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.heads.read().clone()
    }

    pub async fn fetch_head(&self, chain: &ChainId, url: &str) -> AppResult<u64> {
        let method = if chain.is_evm() {
            "eth_blockNumber"
        } else {
            "getSlot"
        };
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": []});

        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Rpc(format!("{method}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Rpc(format!("{method}: HTTP {status}")));
        }
        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| AppError::Rpc(format!("{method}: {e}")))?;
        Metrics::request_latency("rpc", method, started.elapsed().as_secs_f64() * 1000.0);

        if let Some(error) = rpc.error {
            return Err(AppError::Rpc(format!("{method}: {error}")));
        }
        rpc.result
            .as_ref()
            .and_then(parse_head)
            .ok_or_else(|| AppError::Rpc(format!("{method}: unexpected result {:?}", rpc.result)))
    }
}

/// `"0x12a05f2"` (EVM quantity) or a plain number (Solana slot).
fn parse_head(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    }
}
