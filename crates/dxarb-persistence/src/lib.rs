//! Durable state for dxarb.
//!
//! - `StateStore`: trades, positions and run statistics as JSON files,
//!   each rewritten atomically (temp file + rename)
//! - `StateReader`: read-only view of the same files for the status surface
//! - `SignalJournal`: append-only JSON Lines log of notified signals,
//!   one file per UTC day

pub mod error;
pub mod files;
pub mod journal;
pub mod reader;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use journal::{JournalRecord, SignalJournal};
pub use reader::StateReader;
pub use store::StateStore;
