//! Best-effort mirroring of label changes to an external store.
//!
//! The engine hands every mutating operation to a [`MirrorSink`] after the
//! in-memory state has been updated. A failing sink is logged and counted by
//! the engine; it never changes a decision or fails the operation.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::labels::{Category, Label};
use crate::logging::{append_json_line, timestamp_ms};

/// Operation that produced a mirror event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorOperation {
    Add,
    Train,
    SetLabel,
    AiDecide,
    Bootstrap,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorEvent {
    pub operation: MirrorOperation,
    pub text: String,
    pub category: Category,
    pub label: Label,
    pub timestamp_ms: u128,
}

impl MirrorEvent {
    pub fn new(operation: MirrorOperation, text: &str, category: Category, label: Label) -> Self {
        Self {
            operation,
            text: text.to_string(),
            category,
            label,
            timestamp_ms: timestamp_ms(),
        }
    }
}

#[derive(Debug)]
pub enum MirrorError {
    Io(io::Error),
    Unavailable(String),
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorError::Io(err) => write!(f, "mirror write failed: {err}"),
            MirrorError::Unavailable(reason) => write!(f, "mirror unavailable: {reason}"),
        }
    }
}

impl std::error::Error for MirrorError {}

impl From<io::Error> for MirrorError {
    fn from(err: io::Error) -> Self {
        MirrorError::Io(err)
    }
}

/// Write-only observer of label changes.
pub trait MirrorSink {
    fn record(&mut self, event: &MirrorEvent) -> Result<(), MirrorError>;
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMirror;

impl MirrorSink for NullMirror {
    fn record(&mut self, _event: &MirrorEvent) -> Result<(), MirrorError> {
        Ok(())
    }
}

/// Appends events as JSON lines to a file.
#[derive(Debug, Clone)]
pub struct JsonlMirror {
    path: PathBuf,
}

impl JsonlMirror {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MirrorSink for JsonlMirror {
    fn record(&mut self, event: &MirrorEvent) -> Result<(), MirrorError> {
        append_json_line(&self.path, event)?;
        Ok(())
    }
}

/// Keeps events in memory. Clones share one buffer, so a caller can keep a
/// handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryMirror {
    events: Arc<Mutex<Vec<MirrorEvent>>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MirrorEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl MirrorSink for MemoryMirror {
    fn record(&mut self, event: &MirrorEvent) -> Result<(), MirrorError> {
        self.events
            .lock()
            .map_err(|_| MirrorError::Unavailable("event buffer poisoned".into()))?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_mirror_clones_share_events() {
        let handle = MemoryMirror::new();
        let mut sink = handle.clone();
        sink.record(&MirrorEvent::new(
            MirrorOperation::Add,
            "rocket",
            Category::Word,
            Label::Unset,
        ))
        .unwrap();

        let events = handle.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "rocket");
        assert_eq!(events[0].operation, MirrorOperation::Add);
    }

    #[test]
    fn jsonl_mirror_writes_parseable_lines() {
        let mut path = std::env::temp_dir();
        path.push(format!("pyx_mirror_{}.jsonl", uuid::Uuid::new_v4()));
        let mut sink = JsonlMirror::new(&path);

        sink.record(&MirrorEvent::new(
            MirrorOperation::SetLabel,
            "shut up",
            Category::Phrase,
            Label::Bad,
        ))
        .unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        std::fs::remove_file(&path).ok();
        let event: MirrorEvent = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(event.operation, MirrorOperation::SetLabel);
        assert_eq!(event.label, Label::Bad);
        assert_eq!(event.category, Category::Phrase);
    }

    #[test]
    fn jsonl_mirror_reports_unwritable_path() {
        let mut path = std::env::temp_dir();
        path.push(format!("pyx_mirror_file_{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"not a directory").unwrap();
        let mut sink = JsonlMirror::new(path.join("events.jsonl"));

        let result = sink.record(&MirrorEvent::new(
            MirrorOperation::Train,
            "moon",
            Category::Word,
            Label::Safe,
        ));
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(MirrorError::Io(_))));
    }
}
