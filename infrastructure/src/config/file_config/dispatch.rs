//! Cycle settings from TOML (`[dispatch]` and `[synthesis]` sections)

use serde::{Deserialize, Serialize};

/// Raw dispatch configuration from TOML
///
/// ```toml
/// [dispatch]
/// agent_timeout_seconds = 120
/// history_window = 6
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// Per-agent timeout
    pub agent_timeout_seconds: u64,
    /// Prior turns handed to agents as context
    pub history_window: usize,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            agent_timeout_seconds: 120,
            history_window: 6,
        }
    }
}

/// Raw synthesis configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSynthesisConfig {
    /// Ask the lead model for the executive summary and next steps
    pub lead_summary: bool,
}

impl Default for FileSynthesisConfig {
    fn default() -> Self {
        Self { lead_summary: true }
    }
}
