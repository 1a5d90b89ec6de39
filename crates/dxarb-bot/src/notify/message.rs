//! Operator-facing notifications and their HTML rendering.

use dxarb_core::{Action, BotStats, TradeRecord};
use dxarb_detector::SpreadSignal;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Periodic liveness summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatSummary {
    pub uptime: String,
    pub stats: BotStats,
    /// Latest block (or slot) per chain.
    pub chain_heads: BTreeMap<String, u64>,
    pub live_trading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Startup {
        live_trading: bool,
        min_spread_pct: Decimal,
        max_spread_pct: Decimal,
    },
    Signal(Box<SpreadSignal>),
    Trade(Box<TradeRecord>),
    Heartbeat(HeartbeatSummary),
    Error {
        context: String,
        message: String,
    },
    Shutdown {
        stats: BotStats,
    },
}

impl Notification {
    /// Metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Startup { .. } => "startup",
            Self::Signal(_) => "signal",
            Self::Trade(_) => "trade",
            Self::Heartbeat(_) => "heartbeat",
            Self::Error { .. } => "error",
            Self::Shutdown { .. } => "shutdown",
        }
    }

    /// Telegram HTML body.
    pub fn render(&self) -> String {
        match self {
            Self::Startup {
                live_trading,
                min_spread_pct,
                max_spread_pct,
            } => format!(
                "🚀 <b>dxarb started</b>\n\n\
                 <b>Live Trading:</b> {}\n\
                 <b>Spread band:</b> {}%-{}%",
                on_off(*live_trading),
                min_spread_pct.normalize(),
                max_spread_pct.normalize()
            ),
            Self::Signal(signal) => render_signal(signal),
            Self::Trade(trade) => render_trade(trade),
            Self::Heartbeat(summary) => render_heartbeat(summary),
            Self::Error { context, message } => format!(
                "🚨 <b>Error Alert</b>\n\n<b>Context:</b> {}\n<code>{}</code>",
                escape_html(context),
                escape_html(message)
            ),
            Self::Shutdown { stats } => format!(
                "🛑 <b>dxarb stopped</b>\n\n\
                 <b>Signals processed:</b> {}\n\
                 <b>Trades executed:</b> {}\n\
                 <b>Errors:</b> {}",
                stats.signals_processed, stats.trades_executed, stats.errors_count
            ),
        }
    }
}

fn render_signal(signal: &SpreadSignal) -> String {
    let result = &signal.result;
    let pair = &signal.pair;
    let emoji = match result.action {
        Action::Execute => "🟢",
        _ => "🟡",
    };

    let mut msg = format!("{emoji} <b>Trading Signal</b>\n\n");
    let _ = writeln!(
        msg,
        "<b>Token:</b> {} ({})",
        escape_html(&pair.base_token.symbol),
        escape_html(&pair.base_token.name)
    );
    let _ = writeln!(msg, "<b>Chain:</b> {}", escape_html(pair.chain.as_str()));
    let _ = writeln!(msg, "<b>DEX:</b> {}", escape_html(&pair.dex_id));
    let _ = writeln!(msg, "<b>CEX Symbol:</b> {}\n", escape_html(&signal.cex_symbol));

    let _ = writeln!(msg, "<b>Spread:</b> {:.2}%", result.spread_pct);
    let _ = writeln!(msg, "<b>DEX Price:</b> ${:.8}", result.dex_price.inner());
    match result.cex_price {
        Some(cex) => {
            let _ = writeln!(msg, "<b>CEX Price:</b> ${:.8}\n", cex.inner());
        }
        None => msg.push_str("<b>CEX Price:</b> n/a\n\n"),
    }

    let _ = writeln!(msg, "<b>Liquidity:</b> ${}", format_usd(pair.liquidity_usd));
    let _ = writeln!(msg, "<b>Volume 24h:</b> ${}\n", format_usd(pair.volume_24h_usd));

    let _ = writeln!(msg, "<b>Action:</b> {}", result.action.to_string().to_uppercase());
    if !result.reasons.is_empty() {
        let _ = writeln!(msg, "<b>Reasons:</b> {}", escape_html(&result.summary()));
    }
    msg
}

fn render_trade(trade: &TradeRecord) -> String {
    let mut msg = String::from("✅ <b>Trade Executed</b>\n\n");
    let _ = writeln!(msg, "<b>Symbol:</b> {}", escape_html(&trade.symbol));
    let _ = writeln!(msg, "<b>Side:</b> {}", trade.side.as_wire());
    let _ = writeln!(msg, "<b>Quantity:</b> {}", trade.quantity.inner().normalize());
    if let Some(cex) = trade.source_signal.cex_price {
        let _ = writeln!(msg, "<b>Price:</b> ${:.8}", cex.inner());
    }
    let _ = writeln!(msg, "<b>Spread:</b> {:.2}%", trade.source_signal.spread_pct);
    let _ = writeln!(msg, "<b>Order ID:</b> {}", escape_html(&trade.order_id));
    msg
}

fn render_heartbeat(summary: &HeartbeatSummary) -> String {
    let stats = &summary.stats;
    let mut msg = String::from("💓 <b>Bot Heartbeat</b>\n\n");
    let _ = writeln!(msg, "<b>Uptime:</b> {}", summary.uptime);
    let _ = writeln!(msg, "<b>Signals processed:</b> {}", stats.signals_processed);
    let _ = writeln!(msg, "<b>Valid signals:</b> {}", stats.signals_valid);
    let _ = writeln!(msg, "<b>Trades executed:</b> {}", stats.trades_executed);
    let _ = writeln!(msg, "<b>Errors:</b> {}", stats.errors_count);
    let _ = writeln!(msg, "<b>Live Trading:</b> {}", on_off(summary.live_trading));
    let _ = writeln!(msg, "<b>Chain heads:</b> {}", chain_heads_line(&summary.chain_heads));
    msg
}

/// `ethereum #19000000, bsc #38000000`, or `n/a`.
pub(crate) fn chain_heads_line(heads: &BTreeMap<String, u64>) -> String {
    if heads.is_empty() {
        return "n/a".to_string();
    }
    heads
        .iter()
        .map(|(chain, head)| format!("{} #{}", escape_html(chain), head))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whole dollars with thousands separators, e.g. `1,234,567`.
pub fn format_usd(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .abs()
        .normalize()
        .to_string();
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (idx, c) in rounded.chars().enumerate() {
        if idx > 0 && (rounded.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value.is_sign_negative() && !grouped.chars().all(|c| c == '0') {
        format!("-{grouped}")
    } else {
        grouped
    }
}
