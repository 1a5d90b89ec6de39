//! Trade, position and statistics store.
//!
//! `trades.json` is the durable record. A trade is committed to memory only
//! after that file is rewritten, so a failed write leaves disk and memory at
//! the previous state. Positions are derived from the trades: they are
//! rebuilt at open and `positions.json` is a snapshot for read-only views.
//! A trades file that exists but cannot be loaded stops `open` instead of
//! being replaced.

use crate::error::{PersistenceError, PersistenceResult};
use crate::files::{
    load_json, read_json, write_json_atomic, POSITIONS_FILE, STATS_FILE, TRADES_FILE,
};
use dxarb_core::{BotStats, Position, TradeRecord};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Default)]
struct StoreState {
    trades: Vec<TradeRecord>,
    positions: BTreeMap<String, Position>,
    order_ids: HashSet<String>,
}

pub struct StateStore {
    dir: PathBuf,
    state: Mutex<StoreState>,
}

impl StateStore {
    /// Open the store in `dir`, creating it if needed and loading any
    /// existing trades. Fails when `trades.json` exists but is unreadable.
    pub fn open(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let trades: Vec<TradeRecord> = load_json(&dir.join(TRADES_FILE))?.unwrap_or_default();
        let mut positions = BTreeMap::new();
        for trade in &trades {
            apply_trade(&mut positions, trade);
        }
        let order_ids = trades.iter().map(|t| t.order_id.clone()).collect();

        info!(
            dir = %dir.display(),
            trades = trades.len(),
            positions = positions.len(),
            "State store opened"
        );

        Ok(Self {
            dir,
            state: Mutex::new(StoreState {
                trades,
                positions,
                order_ids,
            }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record an accepted order and update its symbol's position.
    ///
    /// Rejects a record whose order id is already stored.
    pub fn append_trade(&self, record: TradeRecord) -> PersistenceResult<()> {
        let mut state = self.state.lock();
        if state.order_ids.contains(&record.order_id) {
            return Err(PersistenceError::DuplicateTrade(record.order_id));
        }

        let mut trades = state.trades.clone();
        trades.push(record.clone());
        write_json_atomic(&self.dir.join(TRADES_FILE), &trades)?;

        debug!(order_id = %record.order_id, symbol = %record.symbol, "Trade persisted");
        apply_trade(&mut state.positions, &record);
        state.order_ids.insert(record.order_id);
        state.trades = trades;

        // Rebuilt from trades at open; a stale snapshot is repaired by the
        // next append.
        if let Err(e) = write_json_atomic(&self.dir.join(POSITIONS_FILE), &state.positions) {
            warn!(error = %e, "Failed to write positions snapshot");
        }
        Ok(())
    }

    pub fn trades(&self) -> Vec<TradeRecord> {
        self.state.lock().trades.clone()
    }

    /// The last `n` trades, oldest first.
    pub fn recent_trades(&self, n: usize) -> Vec<TradeRecord> {
        let state = self.state.lock();
        let skip = state.trades.len().saturating_sub(n);
        state.trades[skip..].to_vec()
    }

    pub fn trade_count(&self) -> usize {
        self.state.lock().trades.len()
    }

    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.state.lock().positions.clone()
    }

    pub fn position(&self, symbol: &str) -> Option<Position> {
        self.state.lock().positions.get(symbol).cloned()
    }

    pub fn save_stats(&self, stats: &BotStats) -> PersistenceResult<()> {
        let _state = self.state.lock();
        write_json_atomic(&self.dir.join(STATS_FILE), stats)
    }

    pub fn load_stats(&self) -> Option<BotStats> {
        read_json(&self.dir.join(STATS_FILE))
    }
}

fn apply_trade(positions: &mut BTreeMap<String, Position>, trade: &TradeRecord) {
    let position = positions
        .entry(trade.symbol.clone())
        .or_insert_with(|| Position::new(&trade.symbol));
    position.apply_fill(trade.side, trade.quantity);
    position.updated_at = trade.timestamp;
}
