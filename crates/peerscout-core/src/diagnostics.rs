//! Diagnostics sink injected into every client component.
//!
//! Components never log through a process-wide handle directly. They hold an
//! `Arc<dyn DiagnosticsSink>` handed to them at construction, so embedders
//! decide where messages end up and tests can capture them.

use std::sync::{Arc, Mutex};

use tracing::Level;

/// Accepts formatted diagnostic messages at a given severity.
pub trait DiagnosticsSink: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Forwards diagnostics to the `tracing` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "peerscout", "{}", message),
            Level::WARN => tracing::warn!(target: "peerscout", "{}", message),
            Level::INFO => tracing::info!(target: "peerscout", "{}", message),
            Level::DEBUG => tracing::debug!(target: "peerscout", "{}", message),
            Level::TRACE => tracing::trace!(target: "peerscout", "{}", message),
        }
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of all captured messages in arrival order.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages captured at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages_at(level).iter().any(|m| m.contains(needle))
    }
}

impl DiagnosticsSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}
