//! Telegram admin commands.
//!
//! [`CommandHandler`] turns a [`Command`] into a [`Reply`] and holds no
//! transport. [`CommandLoop`] long-polls `getUpdates`, drops anything not
//! from the configured chat, and sends the replies back.
//!
//! Buttons reuse the command vocabulary: callback data is either a command
//! (`/status`) or one of `toggle_trading`, `show_balance`.

use crate::chain_head::ChainHeadProbe;
use crate::error::AppResult;
use crate::notify::{
    chain_heads_line, escape_html, format_usd, on_off, InlineButton, InlineKeyboard,
    TelegramClient, Update,
};
use dxarb_cex::DynCexApi;
use dxarb_core::TradingSwitch;
use dxarb_detector::VerifierConfig;
use dxarb_persistence::StateStore;
use dxarb_telemetry::{format_uptime, Metrics, StatsRecorder};
use rust_decimal::Decimal;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause after a failed `getUpdates` before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Balances listed by `/balance`.
const MAX_BALANCE_LINES: usize = 10;

/// Trades listed by `/stats`.
const RECENT_TRADES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Status,
    Balance,
    Stats,
    Settings,
    Stop,
    Help,
    ToggleTrading,
    ShowBalance,
    Unknown(String),
}

impl Command {
    /// Parse message text or callback data. `/status@my_bot extra` is
    /// `Status`.
    pub fn parse(text: &str) -> Self {
        let first = text.split_whitespace().next().unwrap_or_default();
        let name = first.split('@').next().unwrap_or_default().to_lowercase();
        match name.as_str() {
            "/start" => Self::Start,
            "/status" => Self::Status,
            "/balance" => Self::Balance,
            "/stats" => Self::Stats,
            "/settings" => Self::Settings,
            "/stop" => Self::Stop,
            "/help" => Self::Help,
            "toggle_trading" => Self::ToggleTrading,
            "show_balance" => Self::ShowBalance,
            _ => Self::Unknown(first.to_string()),
        }
    }
}

/// Text (HTML) plus optional buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

pub struct CommandHandler {
    cex: DynCexApi,
    store: Arc<StateStore>,
    stats: Arc<StatsRecorder>,
    switch: Arc<TradingSwitch>,
    chain_heads: Arc<ChainHeadProbe>,
    verifier: VerifierConfig,
    shutdown: CancellationToken,
}

impl CommandHandler {
    pub fn new(
        cex: DynCexApi,
        store: Arc<StateStore>,
        stats: Arc<StatsRecorder>,
        switch: Arc<TradingSwitch>,
        chain_heads: Arc<ChainHeadProbe>,
        verifier: VerifierConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            cex,
            store,
            stats,
            switch,
            chain_heads,
            verifier,
            shutdown,
        }
    }

    pub async fn handle(&self, command: &Command) -> Reply {
        debug!(?command, "Handling command");
        match command {
            Command::Start => self.start(),
            Command::Status => self.status(),
            Command::Balance | Command::ShowBalance => self.balance().await,
            Command::Stats => self.trade_stats(),
            Command::Settings => self.settings(),
            Command::Stop => self.stop(),
            Command::ToggleTrading => self.toggle_trading(),
            Command::Help | Command::Unknown(_) => self.help(),
        }
    }

    fn start(&self) -> Reply {
        let text = "🚀 <b>Welcome to dxarb!</b>\n\n\
                    I watch DEX pairs for price gaps against the exchange.\n\n\
                    <b>Commands:</b>\n\
                    /status - Bot status\n\
                    /balance - Account balance\n\
                    /stats - Trading statistics\n\
                    /settings - Bot settings\n\
                    /help - Show help";
        let keyboard = InlineKeyboard::rows(vec![
            vec![
                InlineButton::new("📊 Status", "/status"),
                InlineButton::new("💰 Balance", "show_balance"),
            ],
            vec![InlineButton::new("⚙️ Settings", "/settings")],
        ]);
        Reply::with_keyboard(text, keyboard)
    }

    fn status(&self) -> Reply {
        let stats = self.stats.snapshot();
        let state = if self.shutdown.is_cancelled() {
            "Stopping"
        } else {
            "Running"
        };

        let mut text = String::from("🟢 <b>Bot Status</b>\n\n");
        let _ = writeln!(text, "<b>Status:</b> {state}");
        let _ = writeln!(text, "<b>Uptime:</b> {}", format_uptime(self.stats.uptime()));
        let _ = writeln!(text, "<b>Live Trading:</b> {}\n", on_off(self.switch.is_enabled()));
        let _ = writeln!(text, "<b>Signals Processed:</b> {}", stats.signals_processed);
        let _ = writeln!(text, "<b>Valid Signals:</b> {}", stats.signals_valid);
        let _ = writeln!(text, "<b>Trades Executed:</b> {}", stats.trades_executed);
        let _ = writeln!(text, "<b>Errors:</b> {}", stats.errors_count);
        let _ = write!(
            text,
            "<b>Chain heads:</b> {}",
            chain_heads_line(&self.chain_heads.snapshot())
        );
        Reply::text(text)
    }

    async fn balance(&self) -> Reply {
        match self.cex.balances().await {
            Ok(Some(balances)) => {
                let mut text = String::from("💰 <b>Account Balance</b>\n\n");
                let mut listed = 0;
                for asset in balances
                    .non_zero()
                    .filter(|b| b.free > Decimal::ZERO)
                    .take(MAX_BALANCE_LINES)
                {
                    let _ = writeln!(
                        text,
                        "<b>{}:</b> {:.4}",
                        escape_html(&asset.asset),
                        asset.free
                    );
                    listed += 1;
                }
                if listed == 0 {
                    text.push_str("No free balances");
                }
                Reply::text(text)
            }
            Ok(None) => Reply::text("⚠️ Balance unavailable: no API credentials configured"),
            Err(e) => {
                warn!(error = %e, "Balance query failed");
                Reply::text(format!("⚠️ Failed to fetch balance: {}", escape_html(&e.to_string())))
            }
        }
    }

    fn trade_stats(&self) -> Reply {
        let stats = self.stats.snapshot();
        let trade_count = self.store.trade_count();

        let mut text = String::from("📊 <b>Trading Statistics</b>\n\n");
        let _ = writeln!(text, "<b>Total Trades:</b> {trade_count}");
        let _ = writeln!(text, "<b>Open Positions:</b> {}", self.store.positions().len());
        let _ = writeln!(text, "<b>Signals Processed:</b> {}", stats.signals_processed);
        let _ = writeln!(text, "<b>Valid Signals:</b> {}", stats.signals_valid);

        if trade_count > 0 {
            text.push_str("\n<b>Recent Trades:</b>\n");
            for trade in self.store.recent_trades(RECENT_TRADES) {
                let _ = writeln!(
                    text,
                    "• {} {} {}",
                    escape_html(&trade.symbol),
                    trade.side.as_wire(),
                    trade.quantity.inner().normalize()
                );
            }
        }
        Reply::text(text)
    }

    fn settings(&self) -> Reply {
        let live = self.switch.is_enabled();
        let mut text = String::from("⚙️ <b>Bot Settings</b>\n\n");
        let _ = writeln!(text, "<b>Live Trading:</b> {}", on_off(live));
        let _ = writeln!(text, "<b>Min Spread:</b> {}%", self.verifier.min_spread_pct.normalize());
        let _ = writeln!(text, "<b>Max Spread:</b> {}%", self.verifier.max_spread_pct.normalize());
        let _ = writeln!(
            text,
            "<b>Min Liquidity:</b> ${}",
            format_usd(self.verifier.min_liquidity_usd)
        );
        let _ = writeln!(
            text,
            "<b>Min Volume 24h:</b> ${}",
            format_usd(self.verifier.min_volume_24h_usd)
        );

        let label = if live {
            "Disable Trading"
        } else {
            "Enable Trading"
        };
        let keyboard = InlineKeyboard::rows(vec![vec![InlineButton::new(label, "toggle_trading")]]);
        Reply::with_keyboard(text, keyboard)
    }

    fn stop(&self) -> Reply {
        info!("Stop requested from Telegram");
        self.shutdown.cancel();
        Reply::text("🛑 Bot is stopping...")
    }

    fn toggle_trading(&self) -> Reply {
        let enabled = self.switch.toggle();
        Metrics::live_trading(enabled);
        let state = if enabled { "enabled" } else { "disabled" };
        Reply::text(format!("✅ Live trading {state}"))
    }

    fn help(&self) -> Reply {
        let mut text = String::from(
            "📚 <b>Help - dxarb</b>\n\n\
             <b>Available Commands:</b>\n\
             /start - Initialize bot\n\
             /status - Show bot status\n\
             /balance - View account balance\n\
             /stats - Trading statistics\n\
             /settings - View/change settings\n\
             /stop - Stop the bot\n\
             /help - Show this help\n\n",
        );
        text.push_str("<b>Current Settings:</b>\n");
        let _ = writeln!(
            text,
            "• Spread: {}%-{}%",
            self.verifier.min_spread_pct.normalize(),
            self.verifier.max_spread_pct.normalize()
        );
        let _ = write!(
            text,
            "• Min Liquidity: ${}",
            format_usd(self.verifier.min_liquidity_usd)
        );
        Reply::text(text)
    }
}

/// Long-poll loop feeding the handler.
pub struct CommandLoop {
    client: Arc<TelegramClient>,
    handler: CommandHandler,
}

impl CommandLoop {
    pub fn new(client: Arc<TelegramClient>, handler: CommandHandler) -> Self {
        Self { client, handler }
    }

    /// Poll until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Command loop started");
        let mut offset = None;
        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.poll_once(&mut offset) => polled,
            };
            if let Err(e) = polled {
                warn!(error = %e, "getUpdates failed");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                }
            }
        }
        info!("Command loop stopped");
    }

    /// One `getUpdates` round. Advances `offset` past every update seen and
    /// returns how many were answered.
    pub async fn poll_once(&self, offset: &mut Option<i64>) -> AppResult<usize> {
        let updates = self.client.get_updates(*offset).await?;
        let mut answered = 0;
        for update in updates {
            *offset = Some(offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));
            if self.dispatch(&update).await {
                answered += 1;
            }
        }
        Ok(answered)
    }

    async fn dispatch(&self, update: &Update) -> bool {
        let authorized = update
            .chat_id()
            .is_some_and(|id| id.to_string() == self.client.chat_id());
        if !authorized {
            warn!(update_id = update.update_id, chat = ?update.chat_id(), "Ignoring update from unknown chat");
            return false;
        }

        let command = if let Some(callback) = &update.callback_query {
            if let Err(e) = self.client.answer_callback_query(&callback.id).await {
                warn!(error = %e, "answerCallbackQuery failed");
            }
            callback.data.as_deref().map(Command::parse)
        } else {
            update
                .message
                .as_ref()
                .and_then(|m| m.text.as_deref())
                .map(Command::parse)
        };
        let Some(command) = command else {
            return false;
        };

        let reply = self.handler.handle(&command).await;
        if let Err(e) = self
            .client
            .send_message(&reply.text, reply.keyboard.as_ref())
            .await
        {
            warn!(?command, error = %e, "Failed to send command reply");
            return false;
        }
        true
    }
}
