//! File names and JSON file helpers shared by the store and the reader.

use crate::error::{PersistenceError, PersistenceResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

pub const TRADES_FILE: &str = "trades.json";
pub const POSITIONS_FILE: &str = "positions.json";
pub const STATS_FILE: &str = "bot_stats.json";

/// Load a JSON file. Only a missing file is `Ok(None)`; a file that exists
/// but cannot be read or parsed is an error.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> PersistenceResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| PersistenceError::Corrupt {
            path: path.display().to_string(),
            source,
        })
}

/// Lenient variant of [`load_json`] for read-only views: failures are
/// logged and read as `None`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    load_json(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "State file unreadable");
        None
    })
}

/// Write `value` to a sibling temp file, sync it, then rename over `path`.
/// Readers see either the old or the new content, never a partial file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> PersistenceResult<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
