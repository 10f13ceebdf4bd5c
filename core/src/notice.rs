//! Operator-facing notices emitted while ingesting.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::{DeviceId, EntryId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    DeviceCreated {
        model_id: String,
        device_id: DeviceId,
    },
    EntryInserted { entry_id: EntryId },
    DuplicateEntry {
        model_id: String,
        timestamp: String,
    },
    CheckpointsInserted { count: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DeviceCreated { model_id, device_id } => {
                write!(f, "Device {model_id} inserted with ID: {device_id}")
            }
            Notice::EntryInserted { entry_id } => write!(f, "Entry inserted with ID: {entry_id}"),
            Notice::DuplicateEntry { model_id, timestamp } => {
                write!(f, "Entry for {model_id} at {timestamp} is already present! Skipping.")
            }
            Notice::CheckpointsInserted { count } => write!(f, "{count} checkpoints inserted."),
        }
    }
}

pub trait NoticeSink: Send {
    fn notice(&self, notice: &Notice);
}

/// Forwards notices to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NoticeSink for LogSink {
    fn notice(&self, notice: &Notice) {
        log::info!(target: "startuptimes", "{notice}");
    }
}

/// Keeps every notice in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl NoticeSink for RecordingSink {
    fn notice(&self, notice: &Notice) {
        if let Ok(mut v) = self.notices.lock() {
            v.push(notice.clone());
        }
    }
}
