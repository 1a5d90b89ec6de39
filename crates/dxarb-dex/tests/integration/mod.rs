//! Integration tests for dxarb-dex.
//!
//! These tests run the real `DexClient` against a local HTTP server:
//! - Roster aggregation and dedup
//! - Boosted feed with trending fallback
//! - Retry exhaustion and throttling

pub mod common;
