//! Orchestrator cycle tests.
//!
//! Drives full scan cycles against in-memory venues:
//! - Band decisions reach the notifier and the executor
//! - Duplicate pairs notify once; one order per symbol per cycle
//! - Watchlist fallback, failed tickers and unlisted tokens
//! - Cycle failures, cool-down and unrecorded trades
//! - Heartbeat and shutdown

use dxarb_bot::{
    AppConfig, ChainHeadConfig, ChainHeadProbe, Notification, Orchestrator, PairOutcome, Phase,
    RecordingNotifier, Services,
};
use dxarb_cex::MockCex;
use dxarb_core::{
    Action, ChainId, MarketPair, OrderSide, Price, QuoteTokenRef, TokenRef, TradingSwitch,
};
use dxarb_dex::MockPairSource;
use dxarb_persistence::StateStore;
use dxarb_telemetry::StatsRecorder;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Fixture {
    dir: TempDir,
    source: Arc<MockPairSource>,
    cex: Arc<MockCex>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<StateStore>,
    stats: Arc<StatsRecorder>,
    switch: Arc<TradingSwitch>,
    orchestrator: Arc<Orchestrator>,
}

fn pair(address: &str, symbol: &str, price: Decimal) -> MarketPair {
    MarketPair {
        chain: ChainId::new("ethereum"),
        dex_id: "uniswap".to_string(),
        pair_address: address.to_string(),
        base_token: TokenRef {
            address: format!("0xtoken{}", symbol.to_lowercase()),
            name: symbol.to_string(),
            symbol: symbol.to_string(),
        },
        quote_token: QuoteTokenRef {
            address: "0xc02a".to_string(),
            symbol: "WETH".to_string(),
        },
        price_usd: Price::new(price),
        liquidity_usd: dec!(20000),
        volume_24h_usd: dec!(100000),
        price_change_24h: Decimal::ZERO,
        created_at: None,
    }
}

fn fixture(live: bool, candidates: Vec<MarketPair>) -> Fixture {
    let dir = TempDir::new().unwrap();

    let mut config = AppConfig::default();
    config.bot.data_dir = dir.path().to_path_buf();
    config.bot.batch_size = 2;
    config.bot.batch_pause_ms = 0;
    config.bot.scan_interval_secs = 1;
    config.bot.heartbeat_interval_secs = 3600;
    config.bot.error_cooldown_secs = 30;

    let switch = Arc::new(TradingSwitch::new(live));
    let source = Arc::new(MockPairSource::new(candidates));
    let cex = Arc::new(MockCex::new(Arc::clone(&switch)));
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    let stats = Arc::new(StatsRecorder::new());
    let chain_heads = Arc::new(
        ChainHeadProbe::new(&ChainHeadConfig {
            rpc: BTreeMap::new(),
            timeout_secs: 1,
        })
        .unwrap(),
    );

    let services = Services {
        source: source.clone(),
        cex: cex.clone(),
        notifier: notifier.clone(),
        store: Arc::clone(&store),
        stats: Arc::clone(&stats),
        switch: Arc::clone(&switch),
        chain_heads,
    };
    let orchestrator = Arc::new(Orchestrator::new(&config, services));

    Fixture {
        dir,
        source,
        cex,
        notifier,
        store,
        stats,
        switch,
        orchestrator,
    }
}

fn signals(notifier: &RecordingNotifier) -> Vec<dxarb_detector::SpreadSignal> {
    notifier
        .of_kind("signal")
        .into_iter()
        .filter_map(|n| match n {
            Notification::Signal(signal) => Some(*signal),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_spread_above_band_notifies_without_trading() {
    let f = fixture(true, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.95)));

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.cycle, 1);
    assert_eq!(report.pairs, 1);
    assert_eq!(report.verified, 1);
    assert_eq!(report.notified, 1);
    assert_eq!(report.executed, 0);

    let sent = signals(&f.notifier);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].cex_symbol, "PEPE_USDT");
    assert_eq!(sent[0].result.action, Action::Notify);
    assert_eq!(sent[0].result.spread_pct.round_dp(2), dec!(5.26));
    assert!(f.cex.orders().is_empty());
    assert_eq!(f.orchestrator.phase(), Phase::Idle);
}

#[tokio::test]
async fn test_in_band_spread_executes_when_live() {
    let f = fixture(true, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.975)));

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(report.executed, 1);

    let orders = f.cex.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].symbol, "PEPE_USDT");
    assert_eq!(orders[0].side, OrderSide::Sell);

    assert_eq!(f.store.trade_count(), 1);
    assert_eq!(f.notifier.of_kind("trade").len(), 1);

    let stats = f.stats.snapshot();
    assert_eq!(stats.signals_processed, 1);
    assert_eq!(stats.signals_valid, 1);
    assert_eq!(stats.trades_executed, 1);
    assert_eq!(f.store.load_stats().unwrap().trades_executed, 1);
}

#[tokio::test]
async fn test_in_band_spread_only_notifies_when_not_live() {
    let f = fixture(false, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.975)));

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.notified, 1);
    assert_eq!(report.executed, 0);
    assert_eq!(signals(&f.notifier)[0].result.action, Action::Notify);
    assert!(f.cex.orders().is_empty());

    // Flipping the switch takes effect on the next cycle.
    f.switch.set(true);
    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.executed, 1);
}

#[tokio::test]
async fn test_duplicate_pairs_are_verified_once() {
    let f = fixture(
        true,
        vec![
            pair("0xABC", "PEPE", dec!(1.00)),
            pair("0xabc", "PEPE", dec!(1.00)),
        ],
    );
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.95)));

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.pairs, 1);
    assert_eq!(report.notified, 1);
    assert_eq!(f.cex.ticker_calls(), 1);
}

#[tokio::test]
async fn test_one_order_per_symbol_per_cycle() {
    let f = fixture(
        true,
        vec![
            pair("0xpair1", "PEPE", dec!(1.00)),
            pair("0xpair2", "PEPE", dec!(1.00)),
        ],
    );
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.975)));

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.notified, 2);
    assert_eq!(report.executed, 1);
    assert_eq!(f.cex.orders().len(), 1);

    // The claim is per cycle.
    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.cycle, 2);
    assert_eq!(report.executed, 1);
    assert_eq!(f.cex.orders().len(), 2);
}

#[tokio::test]
async fn test_watchlist_used_when_scan_is_empty() {
    let f = fixture(false, Vec::new());
    f.source
        .set_watchlist(vec![pair("0xwatch", "WIF", dec!(2.00))]);
    f.cex.set_price("WIF_USDT", Price::new(dec!(1.95)));

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(f.source.candidate_calls(), 1);
    assert_eq!(f.source.watchlist_calls(), 1);
    assert_eq!(report.pairs, 1);
    assert_eq!(report.notified, 1);

    // Once the scan finds pairs again the watchlist is left alone.
    f.source
        .set_candidates(vec![pair("0xpair1", "WIF", dec!(2.00))]);
    f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(f.source.candidate_calls(), 2);
    assert_eq!(f.source.watchlist_calls(), 1);
}

#[tokio::test]
async fn test_empty_scan_is_a_quiet_cycle() {
    let f = fixture(false, Vec::new());

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.pairs, 0);
    assert_eq!(f.cex.symbols_calls(), 0);
    assert!(f.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_failed_ticker_does_not_stop_siblings() {
    let f = fixture(
        false,
        vec![
            pair("0xpair1", "PEPE", dec!(1.00)),
            pair("0xpair2", "BONK", dec!(1.00)),
            pair("0xpair3", "WIF", dec!(1.00)),
        ],
    );
    f.cex.set_unavailable("PEPE_USDT");
    f.cex.set_price("BONK_USDT", Price::new(dec!(0.95)));
    f.cex.set_price("WIF_USDT", Price::new(dec!(0.95)));

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.pairs, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.verified, 2);
    assert_eq!(report.notified, 2);
    assert_eq!(f.stats.snapshot().errors_count, 1);
}

#[tokio::test]
async fn test_unlisted_token_is_skipped() {
    let f = fixture(true, Vec::new());

    let outcome = f
        .orchestrator
        .verify_pair(pair("0xpair1", "NOPE", dec!(1.00)), &[])
        .await;
    match outcome {
        PairOutcome::Verified { symbol, result, .. } => {
            assert_eq!(symbol.as_deref(), Some("NOPE_USDT"));
            assert_eq!(result.action, Action::Skip);
            assert_eq!(result.reason_codes(), vec!["not listed"]);
        }
        PairOutcome::Failed { error, .. } => panic!("unexpected failure: {error}"),
    }
    assert!(f.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_notified_signals_are_journaled() {
    let f = fixture(false, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.95)));

    f.orchestrator.run_cycle().await.unwrap();

    let journal_dir = f.dir.path().join("signals");
    let files: Vec<_> = std::fs::read_dir(&journal_dir)
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(files.len(), 1);
    let contents = std::fs::read_to_string(files[0].path()).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains("PEPE_USDT"));
}

#[tokio::test]
async fn test_heartbeat_persists_stats() {
    let f = fixture(false, Vec::new());

    let summary = f.orchestrator.send_heartbeat().await;
    assert!(summary.chain_heads.is_empty());
    assert!(!summary.live_trading);
    assert!(summary.stats.last_heartbeat.is_some());

    assert_eq!(f.notifier.of_kind("heartbeat").len(), 1);
    assert!(f.store.load_stats().unwrap().last_heartbeat.is_some());
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let f = fixture(false, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.95)));

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(Arc::clone(&f.orchestrator).run(shutdown.clone()));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while f.orchestrator.cycles() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "no cycle ran");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(f.orchestrator.phase(), Phase::Stopped);
    let kinds: Vec<&str> = f.notifier.sent().iter().map(|n| n.kind()).collect();
    assert_eq!(kinds.first(), Some(&"startup"));
    assert_eq!(kinds.last(), Some(&"shutdown"));
    assert!(f.store.load_stats().is_some());
}

/// Replaces the journal directory with a plain file so the next flush fails.
fn break_journal(f: &Fixture) {
    let path = f.dir.path().join("signals");
    std::fs::remove_dir_all(&path).unwrap();
    std::fs::write(&path, b"").unwrap();
}

#[tokio::test]
async fn test_journal_failure_fails_the_cycle() {
    let f = fixture(false, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.95)));
    break_journal(&f);

    assert!(f.orchestrator.run_cycle().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_is_reported_and_cools_down() {
    let f = fixture(false, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.95)));
    break_journal(&f);

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(Arc::clone(&f.orchestrator).run(shutdown.clone()));

    // Scan interval is 1 s; a failed cycle waits the 30 s cool-down instead.
    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(f.orchestrator.cycles(), 1);
    assert_eq!(f.stats.snapshot().errors_count, 1);

    let errors = f.notifier.of_kind("error");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        Notification::Error { context, .. } => assert_eq!(context, "scan cycle"),
        other => panic!("expected error notification, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(f.orchestrator.cycles(), 2);
    assert_eq!(f.stats.snapshot().errors_count, 2);

    shutdown.cancel();
    handle.await.unwrap().unwrap();
    assert_eq!(f.orchestrator.phase(), Phase::Stopped);
}

#[tokio::test]
async fn test_unrecorded_trade_alerts_operator() {
    let f = fixture(true, vec![pair("0xpair1", "PEPE", dec!(1.00))]);
    f.cex.set_price("PEPE_USDT", Price::new(dec!(0.975)));
    // Blocks the temp file of the trade log.
    std::fs::create_dir(f.dir.path().join("trades.json.tmp")).unwrap();

    let report = f.orchestrator.run_cycle().await.unwrap();
    assert_eq!(report.executed, 1);
    assert_eq!(f.cex.orders().len(), 1);
    assert_eq!(f.store.trade_count(), 0);
    assert_eq!(f.notifier.of_kind("trade").len(), 1);

    let errors = f.notifier.of_kind("error");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        Notification::Error { context, message } => {
            assert_eq!(context, "trade log");
            assert!(message.contains("mock-1"));
            assert!(message.contains("PEPE_USDT"));
        }
        other => panic!("expected error notification, got {other:?}"),
    }
}
