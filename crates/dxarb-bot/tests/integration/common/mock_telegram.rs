//! Mock Telegram Bot API and chain RPC server.
//!
//! Serves `sendMessage`, `getUpdates` and `answerCallbackQuery` under
//! `/bot{TOKEN}/`, plus a JSON-RPC endpoint at `/rpc` answering
//! `eth_blockNumber` and `getSlot`. Every request body is recorded.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use dxarb_bot::{ChainHeadConfig, TelegramConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "123:test-token";
pub const CHAT_ID: i64 = 4242;

#[derive(Default)]
pub struct MockTelegramState {
    pending_updates: Mutex<Vec<Value>>,
    sent: Mutex<Vec<Value>>,
    update_requests: Mutex<Vec<Value>>,
    answered: Mutex<Vec<String>>,
    failing: AtomicBool,
}

pub struct MockTelegramServer {
    addr: SocketAddr,
    state: Arc<MockTelegramState>,
    handle: JoinHandle<()>,
}

impl MockTelegramServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockTelegramState::default());

        let app = Router::new()
            .route(&format!("/bot{TOKEN}/sendMessage"), post(send_message))
            .route(&format!("/bot{TOKEN}/getUpdates"), post(get_updates))
            .route(
                &format!("/bot{TOKEN}/answerCallbackQuery"),
                post(answer_callback_query),
            )
            .route("/rpc", post(rpc))
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

    pub fn config(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: TOKEN.to_string(),
            chat_id: CHAT_ID.to_string(),
            api_base: format!("http://{}", self.addr),
            poll_timeout_secs: 0,
            request_timeout_secs: 5,
        }
    }

    pub fn chain_config(&self) -> ChainHeadConfig {
        let url = format!("http://{}/rpc", self.addr);
        ChainHeadConfig {
            rpc: BTreeMap::from([
                ("ethereum".to_string(), url.clone()),
                ("solana".to_string(), url),
            ]),
            timeout_secs: 5,
        }
    }

    /// Queue a text message for the next `getUpdates`.
    pub fn push_message(&self, update_id: i64, chat_id: i64, text: &str) {
        self.state.pending_updates.lock().push(json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "chat": {"id": chat_id, "type": "private"},
                "text": text,
            },
        }));
    }

    /// Queue an inline button press for the next `getUpdates`.
    pub fn push_callback(&self, update_id: i64, chat_id: i64, data: &str) {
        self.state.pending_updates.lock().push(json!({
            "update_id": update_id,
            "callback_query": {
                "id": format!("cb-{update_id}"),
                "data": data,
                "message": {
                    "message_id": 1,
                    "chat": {"id": chat_id, "type": "private"},
                },
            },
        }));
    }

    /// Answer every method with `ok: false`.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// `sendMessage` bodies, in order.
    pub fn sent(&self) -> Vec<Value> {
        self.state.sent.lock().clone()
    }

    /// `getUpdates` bodies, in order.
    pub fn update_requests(&self) -> Vec<Value> {
        self.state.update_requests.lock().clone()
    }

    pub fn answered(&self) -> Vec<String> {
        self.state.answered.lock().clone()
    }
}

impl Drop for MockTelegramServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn failure() -> Json<Value> {
    Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}))
}

async fn send_message(
    State(state): State<Arc<MockTelegramState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    state.sent.lock().push(body);
    Json(json!({"ok": true, "result": {"message_id": 1}}))
}

async fn get_updates(
    State(state): State<Arc<MockTelegramState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.update_requests.lock().push(body);
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    let updates: Vec<Value> = state.pending_updates.lock().drain(..).collect();
    Json(json!({"ok": true, "result": updates}))
}

async fn answer_callback_query(
    State(state): State<Arc<MockTelegramState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if let Some(id) = body["callback_query_id"].as_str() {
        state.answered.lock().push(id.to_string());
    }
    Json(json!({"ok": true, "result": true}))
}

async fn rpc(Json(body): Json<Value>) -> Json<Value> {
    let result = match body["method"].as_str() {
        Some("eth_blockNumber") => json!("0x12a05f2"),
        Some("getSlot") => json!(250_000_000u64),
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "error": {"code": -32601, "message": "Method not found"},
            }))
        }
    };
    Json(json!({"jsonrpc": "2.0", "id": body["id"], "result": result}))
}
