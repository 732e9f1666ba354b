//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly, validated once at startup and then
//! turned into the immutable settings the adapters and the coordinator use.

mod dispatch;
mod google;
mod logging;
mod models;
mod storage;

pub use dispatch::{FileDispatchConfig, FileSynthesisConfig};
pub use google::{DEFAULT_LOCATION, FileGoogleConfig};
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use storage::{FileStorageConfig, data_dir};

use crew_application::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("google.api_key is not set (config file or GOOGLE_API_KEY)")]
    MissingApiKey,

    #[error("google.project_id is not set (config file or GOOGLE_PROJECT_ID)")]
    MissingProjectId,

    #[error("google.data_store_id is not set (config file or DATA_STORE_ID)")]
    MissingDataStoreId,

    #[error("dispatch.agent_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("models.{0}: model name cannot be empty")]
    EmptyModelName(&'static str),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub google: FileGoogleConfig,
    pub models: FileModelsConfig,
    pub storage: FileStorageConfig,
    pub dispatch: FileDispatchConfig,
    pub synthesis: FileSynthesisConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if google::non_blank(self.google.api_key.as_deref()).is_none() {
            issues.push(ConfigValidationError::MissingApiKey);
        }
        if google::non_blank(self.google.project_id.as_deref()).is_none() {
            issues.push(ConfigValidationError::MissingProjectId);
        }
        if google::non_blank(self.google.data_store_id.as_deref()).is_none() {
            issues.push(ConfigValidationError::MissingDataStoreId);
        }
        if self.dispatch.agent_timeout_seconds == 0 {
            issues.push(ConfigValidationError::InvalidTimeout);
        }
        issues.extend(
            self.models
                .empty_fields()
                .into_iter()
                .map(ConfigValidationError::EmptyModelName),
        );

        issues
    }

    /// Cycle settings for the coordinator
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let lead = self.synthesis.lead_summary.then(|| self.models.lead());
        CoordinatorConfig::default()
            .with_agent_timeout(Duration::from_secs(self.dispatch.agent_timeout_seconds))
            .with_history_window(self.dispatch.history_window)
            .with_lead_model(lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_domain::Model;

    fn complete() -> FileConfig {
        toml::from_str(
            r#"
[google]
api_key = "key"
project_id = "proj"
data_store_id = "books"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[google]
api_key = "key"
project_id = "proj"
data_store_id = "books"
location = "eu"

[models]
pro = "gemini-2.5-pro"
flash = "gemini-2.5-flash-lite"

[storage]
path = "tmp/agents.redb"

[dispatch]
agent_timeout_seconds = 30
history_window = 4

[synthesis]
lead_summary = false

[logging]
file = true
conversation_log = "transcript.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.google.location, "eu");
        assert_eq!(config.models.flash(), Model::Gemini25FlashLite);
        assert_eq!(config.dispatch.agent_timeout_seconds, 30);
        assert!(!config.synthesis.lead_summary);
        assert!(config.logging.file);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config = complete();
        assert_eq!(config.google.location, DEFAULT_LOCATION);
        assert_eq!(config.dispatch, FileDispatchConfig::default());
        assert!(config.synthesis.lead_summary);
        assert!(!config.logging.file);
    }

    #[test]
    fn test_default_config_lacks_credentials() {
        let issues = FileConfig::default().validate();
        assert_eq!(
            issues,
            vec![
                ConfigValidationError::MissingApiKey,
                ConfigValidationError::MissingProjectId,
                ConfigValidationError::MissingDataStoreId,
            ]
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout_and_empty_models() {
        let mut config = complete();
        config.dispatch.agent_timeout_seconds = 0;
        config.models.pro = Some(String::new());
        assert_eq!(
            config.validate(),
            vec![
                ConfigValidationError::InvalidTimeout,
                ConfigValidationError::EmptyModelName("pro"),
            ]
        );
    }

    #[test]
    fn test_coordinator_config() {
        let mut config = complete();
        let coordinator = config.coordinator_config();
        assert_eq!(coordinator.agent_timeout, Duration::from_secs(120));
        assert_eq!(coordinator.history_window, 6);
        assert_eq!(coordinator.lead_model, Some(Model::Gemini25Pro));

        config.synthesis.lead_summary = false;
        assert_eq!(config.coordinator_config().lead_model, None);
    }
}
