//! Session storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DATABASE_FILE: &str = "sessions.redb";

/// Raw storage configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Path of the redb session database
    pub path: Option<String>,
}

impl FileStorageConfig {
    /// Database path: the configured one, else `<data dir>/data-crew/sessions.redb`
    pub fn database_path(&self) -> PathBuf {
        match self.path.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => expand_home(path),
            None => data_dir().join(DATABASE_FILE),
        }
    }
}

/// Per-user data directory of the application, `./tmp` when it cannot be determined
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("data-crew"))
        .unwrap_or_else(|| PathBuf::from("tmp"))
}

pub(super) fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let config = FileStorageConfig {
            path: Some("tmp/agents.redb".to_string()),
        };
        assert_eq!(config.database_path(), PathBuf::from("tmp/agents.redb"));
    }

    #[test]
    fn test_default_path_ends_with_database_file() {
        let path = FileStorageConfig::default().database_path();
        assert!(path.ends_with(DATABASE_FILE));
    }
}
