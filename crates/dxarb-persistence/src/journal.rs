//! JSON Lines journal of notified signals.
//!
//! One file per UTC day, `signals_YYYY-MM-DD.jsonl`, opened in append mode.
//! Each line is a complete record, so an interrupted write costs at most
//! that line.

use crate::error::PersistenceResult;
use chrono::Utc;
use dxarb_detector::SpreadSignal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub timestamp_ms: i64,
    pub signal_id: String,
    pub chain: String,
    pub pair_address: String,
    pub pair: String,
    pub cex_symbol: String,
    pub dex_price: Decimal,
    pub cex_price: Option<Decimal>,
    pub spread_pct: Decimal,
    pub action: String,
    pub admitted: bool,
    pub reasons: Vec<String>,
}

impl From<&SpreadSignal> for JournalRecord {
    fn from(signal: &SpreadSignal) -> Self {
        let result = &signal.result;
        Self {
            timestamp_ms: signal.detected_at.timestamp_millis(),
            signal_id: signal.signal_id.clone(),
            chain: signal.pair.chain.to_string(),
            pair_address: signal.pair.pair_address.clone(),
            pair: signal.pair.label(),
            cex_symbol: signal.cex_symbol.clone(),
            dex_price: result.dex_price.inner(),
            cex_price: result.cex_price.map(|p| p.inner()),
            spread_pct: result.spread_pct.round_dp(4),
            action: result.action.to_string(),
            admitted: result.admitted,
            reasons: result.reasons.iter().map(ToString::to_string).collect(),
        }
    }
}

struct ActiveFile {
    writer: BufWriter<File>,
    date: String,
    records_written: usize,
}

/// Buffered, day-rotated journal writer.
pub struct SignalJournal {
    base_dir: PathBuf,
    buffer: Vec<JournalRecord>,
    max_buffer_size: usize,
    active: Option<ActiveFile>,
}

impl SignalJournal {
    pub fn new(base_dir: impl AsRef<Path>, max_buffer_size: usize) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        if let Err(e) = std::fs::create_dir_all(&base_dir) {
            warn!(dir = %base_dir.display(), error = %e, "Failed to create journal directory");
        }

        Self {
            base_dir,
            buffer: Vec::with_capacity(max_buffer_size),
            max_buffer_size: max_buffer_size.max(1),
            active: None,
        }
    }

    pub fn record(&mut self, signal: &SpreadSignal) -> PersistenceResult<()> {
        self.add(JournalRecord::from(signal))
    }

    pub fn add(&mut self, record: JournalRecord) -> PersistenceResult<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Path of the journal file for `date` (`YYYY-MM-DD`).
    pub fn path_for(&self, date: &str) -> PathBuf {
        self.base_dir.join(format!("signals_{date}.jsonl"))
    }

    pub fn flush(&mut self) -> PersistenceResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        if self.active.as_ref().is_some_and(|a| a.date != today) {
            self.close_active();
        }

        let active = match self.active.take() {
            Some(active) => active,
            None => self.open_file(&today)?,
        };
        let active = self.active.insert(active);

        for record in &self.buffer {
            let line = serde_json::to_string(record)?;
            writeln!(active.writer, "{line}")?;
        }
        active.writer.flush()?;
        active.records_written += self.buffer.len();

        debug!(date = %today, records = self.buffer.len(), "Journal flushed");
        self.buffer.clear();
        Ok(())
    }

    /// Flush pending records and close the file.
    pub fn close(&mut self) -> PersistenceResult<()> {
        self.flush()?;
        self.close_active();
        Ok(())
    }

    fn open_file(&self, date: &str) -> PersistenceResult<ActiveFile> {
        let path = self.path_for(date);
        info!(path = %path.display(), "Opening signal journal");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(ActiveFile {
            writer: BufWriter::new(file),
            date: date.to_string(),
            records_written: 0,
        })
    }

    fn close_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            if let Err(e) = active.writer.flush() {
                warn!(error = %e, "Failed to flush journal on close");
            }
            info!(
                date = %active.date,
                records = active.records_written,
                "Signal journal closed"
            );
        }
    }
}

impl Drop for SignalJournal {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Failed to flush journal on drop");
        }
        self.close_active();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::{BufRead, BufReader};
    use tempfile::TempDir;

    fn record(id: u32) -> JournalRecord {
        JournalRecord {
            timestamp_ms: 1_700_000_000_000 + i64::from(id),
            signal_id: format!("sig-{id}"),
            chain: "ethereum".to_string(),
            pair_address: "0xpair".to_string(),
            pair: "PEPE/WETH".to_string(),
            cex_symbol: "PEPE_USDT".to_string(),
            dex_price: dec!(1.00),
            cex_price: Some(dec!(0.975)),
            spread_pct: dec!(2.5641),
            action: "notify".to_string(),
            admitted: true,
            reasons: vec!["All criteria met".to_string()],
        }
    }

    fn lines(dir: &Path) -> Vec<String> {
        let entries: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
        let file = File::open(entries[0].path()).unwrap();
        BufReader::new(file).lines().map_while(Result::ok).collect()
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let mut journal = SignalJournal::new(dir.path(), 100);
        for i in 0..3 {
            journal.add(record(i)).unwrap();
        }
        journal.close().unwrap();

        let lines = lines(dir.path());
        assert_eq!(lines.len(), 3);
        let first: JournalRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first, record(0));
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        for batch in 0..2 {
            let mut journal = SignalJournal::new(dir.path(), 100);
            for i in 0..2 {
                journal.add(record(batch * 2 + i)).unwrap();
            }
        }
        assert_eq!(lines(dir.path()).len(), 4);
    }

    #[test]
    fn test_buffer_flushes_at_capacity() {
        let dir = TempDir::new().unwrap();
        let mut journal = SignalJournal::new(dir.path(), 2);
        journal.add(record(0)).unwrap();
        assert_eq!(journal.pending(), 1);
        journal.add(record(1)).unwrap();
        assert_eq!(journal.pending(), 0);
        assert_eq!(lines(dir.path()).len(), 2);
    }

    #[test]
    fn test_file_named_by_day() {
        let dir = TempDir::new().unwrap();
        let mut journal = SignalJournal::new(dir.path(), 10);
        journal.add(record(0)).unwrap();
        journal.flush().unwrap();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert!(journal.path_for(&today).exists());
    }

    #[test]
    fn test_empty_flush_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut journal = SignalJournal::new(dir.path(), 10);
        journal.flush().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
