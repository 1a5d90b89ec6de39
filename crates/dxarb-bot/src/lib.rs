//! dxarb DEX/CEX spread bot.
//!
//! Main application that wires the components together:
//! - Candidate pair scan and spread verification (`Orchestrator`)
//! - Trade execution behind the live-trading switch
//! - Telegram notifications and the admin command loop
//! - Chain-head probe for heartbeats
//! - Read-only status dashboard

pub mod app;
pub mod chain_head;
pub mod commands;
pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;

pub use app::Application;
pub use chain_head::ChainHeadProbe;
pub use commands::{Command, CommandHandler, CommandLoop, Reply};
pub use config::{AppConfig, BotConfig, ChainHeadConfig, TelegramConfig};
pub use error::{AppError, AppResult};
pub use notify::{
    DynNotifier, HeartbeatSummary, LogNotifier, Notification, Notifier, RecordingNotifier,
    TelegramClient, TelegramNotifier,
};
pub use orchestrator::{CycleReport, Orchestrator, PairOutcome, Phase, Services};
