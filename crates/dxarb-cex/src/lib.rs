//! CEX adapter and symbol resolution for dxarb.
//!
//! - `CexClient`: XT-style v4 REST client (catalog, ticker, depth, balances, orders)
//! - `RequestSigner`: HMAC-SHA256 over the sorted query string
//! - `CexApi`: dyn-compatible seam used by the pipeline, with `MockCex` for tests
//! - `SymbolCatalog`: TTL cache of the instrument list
//! - `SymbolResolver`: DEX token identity to CEX symbol candidate

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod resolver;
pub mod signer;
pub mod wire;

pub use api::{CexApi, DynCexApi, MockCex};
pub use catalog::SymbolCatalog;
pub use client::CexClient;
pub use config::CexConfig;
pub use error::{CexError, CexResult};
pub use resolver::{ResolveMethod, ResolvedSymbol, SymbolResolver};
pub use signer::{ApiCredentials, RequestSigner};
