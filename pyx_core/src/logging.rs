use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::labels::Category;

pub(crate) fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

pub(crate) fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DecisionLogEntry {
    pub operation: String,
    pub text: String,
    pub category: Option<Category>,
    pub score: f32,
    pub inappropriate: bool,
    pub timestamp_ms: u128,
}

/// Append-only JSONL journal of engine decisions.
#[derive(Debug, Clone)]
pub struct DecisionLog {
    path: PathBuf,
}

impl DecisionLog {
    pub fn in_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join("logs").join("decisions.jsonl"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(
        &self,
        operation: &str,
        text: &str,
        category: Option<Category>,
        score: f32,
        inappropriate: bool,
    ) -> io::Result<()> {
        let entry = DecisionLogEntry {
            operation: operation.to_string(),
            text: text.to_string(),
            category,
            score,
            inappropriate,
            timestamp_ms: timestamp_ms(),
        };
        append_json_line(&self.path, &entry)
    }
}
