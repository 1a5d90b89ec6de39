//! Cached instrument catalog.
//!
//! One catalog fetch serves every pair of a scan cycle. A failed refresh
//! keeps serving the previous copy; with no copy at all the catalog is
//! empty and every lookup falls through to the naming convention.

use crate::api::DynCexApi;
use dxarb_core::SymbolInfo;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct Snapshot {
    symbols: Arc<Vec<SymbolInfo>>,
    fetched_at: Instant,
}

pub struct SymbolCatalog {
    api: DynCexApi,
    ttl: Duration,
    current: RwLock<Option<Snapshot>>,
    refresh: Mutex<()>,
}

impl SymbolCatalog {
    pub fn new(api: DynCexApi, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Current catalog, refreshed when older than the TTL.
    pub async fn get(&self) -> Arc<Vec<SymbolInfo>> {
        if let Some(fresh) = self.fresh() {
            return fresh;
        }

        // Single refresh at a time; late arrivals reuse its result.
        let _guard = self.refresh.lock().await;
        if let Some(fresh) = self.fresh() {
            return fresh;
        }

        match self.api.symbols().await {
            Ok(symbols) => {
                debug!(count = symbols.len(), "Symbol catalog refreshed");
                let symbols = Arc::new(symbols);
                *self.current.write() = Some(Snapshot {
                    symbols: Arc::clone(&symbols),
                    fetched_at: Instant::now(),
                });
                symbols
            }
            Err(e) => {
                warn!(error = %e, "Symbol catalog refresh failed");
                self.current
                    .read()
                    .as_ref()
                    .map(|s| Arc::clone(&s.symbols))
                    .unwrap_or_default()
            }
        }
    }

    /// Drop the cached copy so the next `get` refetches.
    pub fn invalidate(&self) {
        *self.current.write() = None;
    }

    pub fn len(&self) -> usize {
        self.current.read().as_ref().map_or(0, |s| s.symbols.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh(&self) -> Option<Arc<Vec<SymbolInfo>>> {
        let current = self.current.read();
        current
            .as_ref()
            .filter(|s| s.fetched_at.elapsed() < self.ttl)
            .map(|s| Arc::clone(&s.symbols))
    }
}
