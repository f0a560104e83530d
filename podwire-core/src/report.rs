//! Sinks for user-facing integration progress.
//!
//! The integrator announces a section per target and informational messages
//! (such as stale reference removal). How those are framed and displayed is up
//! to the [`Reporter`] implementation.

use serde::Serialize;

/// Receives progress from an integration run.
pub trait Reporter {
    /// Start a titled section, one per integrated target.
    fn section(&mut self, title: &str);

    /// An informational message inside the current section.
    fn message(&mut self, message: &str);
}

/// Forwards progress to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn section(&mut self, title: &str) {
        tracing::info!("{}", title);
    }

    fn message(&mut self, message: &str) {
        tracing::info!("  {}", message);
    }
}

/// Kind of a recorded progress entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Section,
    Message,
}

/// A recorded progress entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub text: String,
}

/// Records progress in memory.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MessageLog {
    pub entries: Vec<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded messages, without section titles.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Message)
            .map(|entry| entry.text.as_str())
    }

    /// Take the recorded entries, leaving the log empty.
    pub fn drain(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.entries)
    }
}

impl Reporter for MessageLog {
    fn section(&mut self, title: &str) {
        self.entries.push(LogEntry {
            kind: EntryKind::Section,
            text: title.to_string(),
        });
    }

    fn message(&mut self, message: &str) {
        self.entries.push(LogEntry {
            kind: EntryKind::Message,
            text: message.to_string(),
        });
    }
}
