//! Exchange seam used by the pipeline.

use crate::client::CexClient;
use crate::error::{CexError, CexResult};
use dxarb_core::{
    Balances, BookLevel, BoxFuture, CexQuote, OrderAck, OrderBook, OrderRequest, Price, Size,
    SymbolInfo, TradingSwitch,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Exchange operations the scanner and executor depend on.
pub trait CexApi: Send + Sync {
    fn symbols(&self) -> BoxFuture<'_, CexResult<Vec<SymbolInfo>>>;

    /// `Ok(None)` when the symbol has no usable price.
    fn ticker<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, CexResult<Option<CexQuote>>>;

    fn order_book<'a>(
        &'a self,
        symbol: &'a str,
        depth: u32,
    ) -> BoxFuture<'a, CexResult<Option<OrderBook>>>;

    /// `Ok(None)` when no credentials are configured.
    fn balances(&self) -> BoxFuture<'_, CexResult<Option<Balances>>>;

    /// `Ok(None)` when live trading is disabled; nothing is sent.
    fn place_order<'a>(
        &'a self,
        request: &'a OrderRequest,
    ) -> BoxFuture<'a, CexResult<Option<OrderAck>>>;
}

/// Arc wrapper for CexApi trait objects.
pub type DynCexApi = Arc<dyn CexApi>;

impl CexApi for CexClient {
    fn symbols(&self) -> BoxFuture<'_, CexResult<Vec<SymbolInfo>>> {
        Box::pin(self.fetch_symbols())
    }

    fn ticker<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, CexResult<Option<CexQuote>>> {
        Box::pin(self.fetch_ticker(symbol))
    }

    fn order_book<'a>(
        &'a self,
        symbol: &'a str,
        depth: u32,
    ) -> BoxFuture<'a, CexResult<Option<OrderBook>>> {
        Box::pin(self.fetch_order_book(symbol, depth))
    }

    fn balances(&self) -> BoxFuture<'_, CexResult<Option<Balances>>> {
        Box::pin(self.fetch_balances())
    }

    fn place_order<'a>(
        &'a self,
        request: &'a OrderRequest,
    ) -> BoxFuture<'a, CexResult<Option<OrderAck>>> {
        Box::pin(self.submit_order(request))
    }
}

/// In-memory exchange for testing.
///
/// Symbols are matched case-insensitively. A symbol with a price but no
/// explicit book gets a tight two-sided book around that price.
pub struct MockCex {
    symbols: Mutex<Vec<SymbolInfo>>,
    prices: Mutex<HashMap<String, Price>>,
    books: Mutex<HashMap<String, Option<OrderBook>>>,
    unavailable: Mutex<HashSet<String>>,
    balances: Mutex<Option<Balances>>,
    switch: Arc<TradingSwitch>,
    orders: Mutex<Vec<OrderRequest>>,
    order_delay: Mutex<Duration>,
    reject_orders: AtomicBool,
    next_order_id: AtomicU64,
    ticker_calls: AtomicU32,
    symbols_calls: AtomicU32,
}

impl MockCex {
    pub fn new(switch: Arc<TradingSwitch>) -> Self {
        Self {
            symbols: Mutex::new(Vec::new()),
            prices: Mutex::new(HashMap::new()),
            books: Mutex::new(HashMap::new()),
            unavailable: Mutex::new(HashSet::new()),
            balances: Mutex::new(None),
            switch,
            orders: Mutex::new(Vec::new()),
            order_delay: Mutex::new(Duration::ZERO),
            reject_orders: AtomicBool::new(false),
            next_order_id: AtomicU64::new(1),
            ticker_calls: AtomicU32::new(0),
            symbols_calls: AtomicU32::new(0),
        }
    }

    pub fn set_symbols(&self, symbols: Vec<SymbolInfo>) {
        *self.symbols.lock() = symbols;
    }

    pub fn set_price(&self, symbol: &str, price: Price) {
        self.prices.lock().insert(symbol.to_uppercase(), price);
    }

    /// Explicit book, or `None` to report the book as absent.
    pub fn set_book(&self, symbol: &str, book: Option<OrderBook>) {
        self.books.lock().insert(symbol.to_uppercase(), book);
    }

    /// Make the ticker for `symbol` fail as exhausted retries.
    pub fn set_unavailable(&self, symbol: &str) {
        self.unavailable.lock().insert(symbol.to_uppercase());
    }

    pub fn set_balances(&self, balances: Option<Balances>) {
        *self.balances.lock() = balances;
    }

    /// Hold each order submission for `delay` before acknowledging.
    pub fn set_order_delay(&self, delay: Duration) {
        *self.order_delay.lock() = delay;
    }

    pub fn reject_orders(&self, reject: bool) {
        self.reject_orders.store(reject, Ordering::SeqCst);
    }

    /// Orders that reached the exchange.
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().clone()
    }

    pub fn ticker_calls(&self) -> u32 {
        self.ticker_calls.load(Ordering::SeqCst)
    }

    pub fn symbols_calls(&self) -> u32 {
        self.symbols_calls.load(Ordering::SeqCst)
    }

    fn synthetic_book(price: Price) -> OrderBook {
        let tick = price.inner() / Decimal::from(1000);
        let size = Size::new(Decimal::from(10_000));
        OrderBook {
            bids: vec![BookLevel {
                price: Price::new(price.inner() - tick),
                size,
            }],
            asks: vec![BookLevel {
                price: Price::new(price.inner() + tick),
                size,
            }],
        }
    }
}

impl CexApi for MockCex {
    fn symbols(&self) -> BoxFuture<'_, CexResult<Vec<SymbolInfo>>> {
        Box::pin(async move {
            self.symbols_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.symbols.lock().clone())
        })
    }

    fn ticker<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, CexResult<Option<CexQuote>>> {
        Box::pin(async move {
            self.ticker_calls.fetch_add(1, Ordering::SeqCst);
            let key = symbol.to_uppercase();
            if self.unavailable.lock().contains(&key) {
                return Err(CexError::Unavailable {
                    attempts: 3,
                    message: format!("ticker {symbol} down"),
                });
            }
            let price = self.prices.lock().get(&key).copied();
            Ok(price.map(|p| CexQuote::new(symbol, p)))
        })
    }

    fn order_book<'a>(
        &'a self,
        symbol: &'a str,
        _depth: u32,
    ) -> BoxFuture<'a, CexResult<Option<OrderBook>>> {
        Box::pin(async move {
            let key = symbol.to_uppercase();
            if let Some(book) = self.books.lock().get(&key) {
                return Ok(book.clone());
            }
            let price = self.prices.lock().get(&key).copied();
            Ok(price.map(Self::synthetic_book))
        })
    }

    fn balances(&self) -> BoxFuture<'_, CexResult<Option<Balances>>> {
        Box::pin(async move { Ok(self.balances.lock().clone()) })
    }

    fn place_order<'a>(
        &'a self,
        request: &'a OrderRequest,
    ) -> BoxFuture<'a, CexResult<Option<OrderAck>>> {
        Box::pin(async move {
            if !self.switch.is_enabled() {
                return Ok(None);
            }
            let delay = *self.order_delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.reject_orders.load(Ordering::SeqCst) {
                return Err(CexError::Api {
                    code: 2,
                    message: "ORDER_REJECTED".to_string(),
                });
            }
            self.orders.lock().push(request.clone());
            let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
            Ok(Some(OrderAck {
                order_id: format!("mock-{id}"),
                client_order_id: request.client_order_id.clone(),
            }))
        })
    }
}
