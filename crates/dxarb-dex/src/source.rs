//! Pair source trait used by the scan loop.
//!
//! Keeps the orchestrator independent of the HTTP client so scans can be
//! driven from fixtures in tests.

use crate::client::DexClient;
use dxarb_core::{BoxFuture, MarketPair};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Where candidate pairs come from.
pub trait PairSource: Send + Sync {
    /// Candidate pairs for one cycle. Never fails; empty means nothing usable.
    fn candidate_pairs(&self, concurrent: bool) -> BoxFuture<'_, Vec<MarketPair>>;

    /// Narrow fallback used when the candidate scan is empty.
    fn watchlist_pairs(&self) -> BoxFuture<'_, Vec<MarketPair>>;
}

/// Arc wrapper for PairSource trait objects.
pub type DynPairSource = Arc<dyn PairSource>;

impl PairSource for DexClient {
    fn candidate_pairs(&self, concurrent: bool) -> BoxFuture<'_, Vec<MarketPair>> {
        Box::pin(async move {
            if concurrent {
                self.fetch_candidate_pairs_concurrent().await
            } else {
                self.fetch_candidate_pairs().await
            }
        })
    }

    fn watchlist_pairs(&self) -> BoxFuture<'_, Vec<MarketPair>> {
        Box::pin(async move { self.fetch_watchlist(&self.config().watchlist).await })
    }
}

/// Mock pair source for testing.
#[derive(Debug, Default)]
pub struct MockPairSource {
    candidates: Mutex<Vec<MarketPair>>,
    watchlist: Mutex<Vec<MarketPair>>,
    candidate_calls: AtomicU32,
    watchlist_calls: AtomicU32,
}

impl MockPairSource {
    pub fn new(candidates: Vec<MarketPair>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
            ..Default::default()
        }
    }

    pub fn set_candidates(&self, pairs: Vec<MarketPair>) {
        *self.candidates.lock() = pairs;
    }

    pub fn set_watchlist(&self, pairs: Vec<MarketPair>) {
        *self.watchlist.lock() = pairs;
    }

    pub fn candidate_calls(&self) -> u32 {
        self.candidate_calls.load(Ordering::SeqCst)
    }

    pub fn watchlist_calls(&self) -> u32 {
        self.watchlist_calls.load(Ordering::SeqCst)
    }
}

impl PairSource for MockPairSource {
    fn candidate_pairs(&self, _concurrent: bool) -> BoxFuture<'_, Vec<MarketPair>> {
        Box::pin(async move {
            self.candidate_calls.fetch_add(1, Ordering::SeqCst);
            self.candidates.lock().clone()
        })
    }

    fn watchlist_pairs(&self) -> BoxFuture<'_, Vec<MarketPair>> {
        Box::pin(async move {
            self.watchlist_calls.fetch_add(1, Ordering::SeqCst);
            self.watchlist.lock().clone()
        })
    }
}
