//! Read-only view of the state files.
//!
//! Used by processes that must not write state, such as the status surface.
//! Reads the files on every call.

use crate::files::{read_json, POSITIONS_FILE, STATS_FILE, TRADES_FILE};
use dxarb_core::{BotStats, Position, TradeRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StateReader {
    dir: PathBuf,
}

impl StateReader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn stats(&self) -> Option<BotStats> {
        read_json(&self.dir.join(STATS_FILE))
    }

    pub fn trades(&self) -> Vec<TradeRecord> {
        read_json(&self.dir.join(TRADES_FILE)).unwrap_or_default()
    }

    /// The last `n` trades, newest first.
    pub fn latest_trades(&self, n: usize) -> Vec<TradeRecord> {
        let mut trades = self.trades();
        trades.reverse();
        trades.truncate(n);
        trades
    }

    pub fn positions(&self) -> BTreeMap<String, Position> {
        read_json(&self.dir.join(POSITIONS_FILE)).unwrap_or_default()
    }
}
