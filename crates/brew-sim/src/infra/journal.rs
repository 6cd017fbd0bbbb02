//! JSONL journal of simulator events.
//!
//! Every accepted hardware mutation is appended as a `state_changed` entry
//! carrying the full hardware state, bracketed by start and shutdown events.

use brew_core::{HardwareState, StateListener, TimeBase};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEventType {
    SimulatorStart,
    StateChanged,
    SimulatorShutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Monotonic microseconds since simulator start
    pub timestamp_us: u64,
    /// Wall-clock Unix timestamp in microseconds
    pub unix_us: u64,
    pub event_type: JournalEventType,
    pub details: serde_json::Value,
}

/// Thread-safe journal writer.
#[derive(Debug)]
pub struct Journal {
    writer: Mutex<BufWriter<File>>,
    timebase: TimeBase,
}

impl Journal {
    /// Opens `path` for appending, creating parent directories as needed.
    pub fn open(path: &Path, timebase: TimeBase) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::with_capacity(8192, file)),
            timebase,
        })
    }

    pub fn append(&self, entry: &JournalEntry) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer(&mut *writer, entry)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    /// Stamps and appends an event.
    pub fn record(
        &self,
        event_type: JournalEventType,
        details: serde_json::Value,
    ) -> std::io::Result<()> {
        let stamp = self.timebase.stamp();
        self.append(&JournalEntry {
            timestamp_us: stamp.timestamp_us,
            unix_us: stamp.unix_us,
            event_type,
            details,
        })
    }
}

/// Writes each state change to the journal.
pub struct JournalListener {
    journal: Arc<Journal>,
}

impl JournalListener {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self { journal }
    }
}

impl StateListener for JournalListener {
    fn on_state_changed(&self, state: &HardwareState) {
        let result = serde_json::to_value(state)
            .map_err(std::io::Error::from)
            .and_then(|details| self.journal.record(JournalEventType::StateChanged, details));
        if let Err(e) = result {
            warn!(error = %e, revision = state.revision, "Failed to journal state change");
        }
    }
}
