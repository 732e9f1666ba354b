//! Logging configuration from TOML (`[logging]` section)

use super::storage::{data_dir, expand_home};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// ```toml
/// [logging]
/// file = true                               # daily log under <data dir>/logs
/// conversation_log = "~/crew-transcript.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Also write tracing output to a daily rolling file
    pub file: bool,
    /// JSONL transcript of routing decisions, agent results and turns
    pub conversation_log: Option<String>,
}

impl FileLoggingConfig {
    pub fn log_dir(&self) -> PathBuf {
        data_dir().join("logs")
    }

    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        self.conversation_log
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(expand_home)
    }
}
