//! DEX client integration tests.
//!
//! Runs `DexClient` against the mock aggregator:
//! - Roster queries are chain-filtered and deduplicated
//! - A missing boosted feed falls back to trending search
//! - Retries are bounded and surface as `Unavailable`

mod integration;
use integration::common::mock_dex::{pair_json, BoostsMode, MockDexServer};

use dxarb_core::ChainId;
use dxarb_dex::{DexClient, DexConfig, DexError, RosterEntry};
use serde_json::json;
use std::time::{Duration, Instant};

fn client(config: DexConfig) -> DexClient {
    DexClient::new(config).unwrap()
}

#[tokio::test]
async fn test_roster_pairs_are_chain_filtered_and_deduplicated() {
    let server = MockDexServer::start().await;
    server.set_search(
        "WETH",
        vec![
            pair_json("ethereum", "0xAAA", "PEPE", 50_000.0),
            pair_json("bsc", "0xBBB", "CAKE", 50_000.0),
        ],
    );
    server.set_search(
        "USDT",
        vec![
            pair_json("ethereum", "0xaaa", "PEPE", 50_000.0),
            pair_json("ethereum", "0xCCC", "SHIB", 50_000.0),
        ],
    );

    let mut config = server.config();
    config.roster = vec![RosterEntry::new("ethereum", &["WETH", "USDT"])];
    let pairs = client(config).fetch_candidate_pairs().await;

    let addresses: Vec<_> = pairs.iter().map(|p| p.dedup_key()).collect();
    assert_eq!(addresses, vec!["0xaaa", "0xccc"]);
    assert!(pairs.iter().all(|p| p.chain == ChainId::new("ethereum")));
}

#[tokio::test]
async fn test_missing_boosted_feed_falls_back_to_trending() {
    let server = MockDexServer::start().await;
    server.set_boosts(BoostsMode::NotFound);
    let many: Vec<_> = (0..7)
        .map(|i| pair_json("ethereum", &format!("0x{i:03}"), "PEPE", 20_000.0))
        .collect();
    server.set_search("PEPE", many);

    let mut config = server.config();
    config.trending_terms = vec!["PEPE".to_string()];
    let pairs = client(config).fetch_candidate_pairs().await;

    assert_eq!(pairs.len(), 5);
    assert_eq!(server.hit_count("boosts"), 1);
    assert_eq!(server.hit_count("search:PEPE"), 1);
}

#[tokio::test]
async fn test_boosted_feed_resolves_best_pair_on_chain() {
    let server = MockDexServer::start().await;
    server.set_boosts(BoostsMode::Feed(json!([
        {"chainId": "ethereum", "tokenAddress": "0xtok"}
    ])));
    server.set_token(
        "0xtok",
        vec![
            pair_json("ethereum", "0x01", "TOK", 100.0),
            pair_json("ethereum", "0x02", "TOK", 500.0),
            pair_json("bsc", "0x03", "TOK", 900.0),
        ],
    );

    let mut config = server.config();
    config.trending_terms = vec!["PEPE".to_string()];
    let pairs = client(config).fetch_candidate_pairs().await;

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].pair_address, "0x02");
    assert_eq!(server.hit_count("search:"), 0, "no trending fallback");
}

#[tokio::test]
async fn test_boosted_feed_server_error_falls_back_to_trending() {
    let server = MockDexServer::start().await;
    server.set_boosts(BoostsMode::ServerError);
    server.set_search("DOGE", vec![pair_json("bsc", "0xd0", "DOGE", 1.0)]);

    let mut config = server.config();
    config.trending_terms = vec!["DOGE".to_string()];
    let pairs = client(config).fetch_candidate_pairs().await;

    assert_eq!(pairs.len(), 1);
    assert_eq!(server.hit_count("boosts"), 3, "boosted feed retried");
}

#[tokio::test]
async fn test_search_exhausts_retries_as_unavailable() {
    let server = MockDexServer::start().await;
    server.fail_next_searches(3);

    let result = client(server.config()).search_pairs("PEPE").await;

    match result {
        Err(DexError::Unavailable { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected Unavailable, got {other:?}"),
    }
    assert_eq!(server.hit_count("search:PEPE"), 3);
}

#[tokio::test]
async fn test_search_recovers_within_budget() {
    let server = MockDexServer::start().await;
    server.set_search("PEPE", vec![pair_json("ethereum", "0x1", "PEPE", 1.0)]);
    server.fail_next_searches(2);

    let pairs = client(server.config()).search_pairs("PEPE").await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(server.hit_count("search:PEPE"), 3);
}

#[tokio::test]
async fn test_aggregate_never_fails_when_everything_is_down() {
    let server = MockDexServer::start().await;
    server.set_boosts(BoostsMode::ServerError);
    server.fail_next_searches(1_000);

    let mut config = server.config();
    config.roster = vec![RosterEntry::new("ethereum", &["WETH"])];
    config.trending_terms = vec!["PEPE".to_string()];
    let pairs = client(config).fetch_candidate_pairs().await;

    assert!(pairs.is_empty());
}

#[tokio::test]
async fn test_concurrent_scan_matches_sequential() {
    let server = MockDexServer::start().await;
    server.set_search("WETH", vec![pair_json("ethereum", "0xe1", "PEPE", 1.0)]);
    server.set_search(
        "WBNB",
        vec![
            pair_json("bsc", "0xb1", "CAKE", 1.0),
            pair_json("ethereum", "0xE1", "PEPE", 1.0),
        ],
    );
    server.set_search("SOL", vec![pair_json("solana", "So1", "BONK", 1.0)]);

    let mut config = server.config();
    config.roster = vec![
        RosterEntry::new("ethereum", &["WETH"]),
        RosterEntry::new("bsc", &["WBNB"]),
        RosterEntry::new("solana", &["SOL"]),
    ];
    let client = client(config);

    let mut sequential: Vec<_> = client
        .fetch_candidate_pairs()
        .await
        .iter()
        .map(|p| p.dedup_key())
        .collect();
    let mut concurrent: Vec<_> = client
        .fetch_candidate_pairs_concurrent()
        .await
        .iter()
        .map(|p| p.dedup_key())
        .collect();
    sequential.sort();
    concurrent.sort();

    assert_eq!(sequential, vec!["0xb1", "0xe1", "so1"]);
    assert_eq!(sequential, concurrent);
}

#[tokio::test]
async fn test_watchlist_lookup() {
    let server = MockDexServer::start().await;
    let config = server.config();
    let watchlist = config.watchlist.clone();
    server.set_token(
        &watchlist[0].address,
        vec![pair_json("ethereum", "0xshib", "SHIB", 1.0)],
    );
    server.set_token(
        &watchlist[1].address,
        vec![pair_json("ethereum", "0xpepe", "PEPE", 1.0)],
    );

    let pairs = client(config).fetch_watchlist(&watchlist).await;
    assert_eq!(pairs.len(), 2);
}

#[tokio::test]
async fn test_unknown_token_is_absent_not_error() {
    let server = MockDexServer::start().await;
    let found = client(server.config())
        .token_pair(&ChainId::new("ethereum"), "0xnothing")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_requests_are_spaced() {
    let server = MockDexServer::start().await;
    let mut config = server.config();
    config.min_spacing_ms = 50;
    let client = client(config);

    let start = Instant::now();
    for _ in 0..3 {
        client.search_pairs("X").await.unwrap();
    }
    assert!(start.elapsed() >= Duration::from_millis(100));
}
