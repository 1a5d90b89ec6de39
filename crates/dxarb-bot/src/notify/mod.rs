//! Outbound notifications.
//!
//! The scan loop only sees the [`Notifier`] seam. Delivery is best effort:
//! a failed send is logged and counted, never propagated.

mod message;
mod telegram;

pub use message::{escape_html, format_usd, HeartbeatSummary, Notification};
pub(crate) use message::{chain_heads_line, on_off};
pub use telegram::{
    CallbackQuery, Chat, IncomingMessage, InlineButton, InlineKeyboard, TelegramClient,
    TelegramNotifier, Update,
};

use dxarb_core::BoxFuture;
use dxarb_telemetry::Metrics;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub trait Notifier: Send + Sync {
    /// Deliver one notification. Returns whether it was delivered.
    fn send<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, bool>;
}

/// Arc wrapper for Notifier trait objects.
pub type DynNotifier = Arc<dyn Notifier>;

/// Writes notifications to the log. Used when Telegram is not configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            info!(kind = notification.kind(), text = %notification.render(), "Notification");
            Metrics::notification(notification.kind(), true);
            true
        })
    }
}

/// Keeps every notification in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends report failure (they are still recorded).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Notifications of one kind, in send order.
    pub fn of_kind(&self, kind: &str) -> Vec<Notification> {
        self.sent
            .lock()
            .iter()
            .filter(|n| n.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn send<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.sent.lock().push(notification.clone());
            !self.failing.load(Ordering::SeqCst)
        })
    }
}
