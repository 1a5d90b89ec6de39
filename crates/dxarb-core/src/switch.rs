//! Live-trading kill switch.
//!
//! One instance is shared (behind `Arc`) by the scan loop, the CEX adapter
//! and the command loop. Reads and flips are single atomic operations, so a
//! toggle from the command loop can never be lost to a concurrent read-modify-
//! write elsewhere.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Global on/off switch for order submission.
#[derive(Debug)]
pub struct TradingSwitch {
    enabled: AtomicBool,
    changed_at: Mutex<Option<DateTime<Utc>>>,
}

impl TradingSwitch {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            changed_at: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Set the switch. Returns the previous state.
    pub fn set(&self, enabled: bool) -> bool {
        let previous = self.enabled.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            self.mark_changed(enabled);
        }
        previous
    }

    /// Flip the switch. Returns the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::AcqRel);
        self.mark_changed(enabled);
        enabled
    }

    /// When the switch last changed at runtime.
    #[must_use]
    pub fn changed_at(&self) -> Option<DateTime<Utc>> {
        *self.changed_at.lock()
    }

    fn mark_changed(&self, enabled: bool) {
        *self.changed_at.lock() = Some(Utc::now());
        warn!(enabled, "Live trading switch changed");
    }
}

impl Default for TradingSwitch {
    fn default() -> Self {
        Self::new(false)
    }
}
