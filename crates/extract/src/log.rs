// ABOUTME: OperationLog, the caller-owned list of timestamped status entries.
// ABOUTME: Append-only; the library never holds one, callers pass it by &mut.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Info,
    Error,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Info => write!(f, "info"),
            EntryKind::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: EntryKind,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.kind,
            self.message
        )
    }
}

/// Status history of one session, oldest entry first.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OperationLog {
    entries: Vec<LogEntry>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(EntryKind::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(EntryKind::Error, message.into());
    }

    fn push(&mut self, kind: EntryKind, message: String) {
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            kind,
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.kind == EntryKind::Error)
    }

    /// One line per entry.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_append_order() {
        let mut log = OperationLog::new();
        assert!(log.is_empty());

        log.info("Extraction complete. Saved 3 images in 'extracted_images'.");
        log.error("No images found or error while extracting.");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].kind, EntryKind::Info);
        assert_eq!(log.entries()[1].kind, EntryKind::Error);
        assert!(log.entries()[0].timestamp <= log.entries()[1].timestamp);
        assert!(log.has_errors());
    }

    #[test]
    fn render_prints_kind_and_message() {
        let mut log = OperationLog::new();
        log.info("first");
        log.error("second");
        let text = log.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("info: first"));
        assert!(lines[1].ends_with("error: second"));
    }

    #[test]
    fn serializes_as_entry_list() {
        let mut log = OperationLog::new();
        log.info("done");
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json[0]["kind"], "info");
        assert_eq!(json[0]["message"], "done");
        assert!(json[0]["timestamp"].is_string());
    }
}
