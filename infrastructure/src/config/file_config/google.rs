//! Google credentials and resource ids (`[google]` section)

use serde::{Deserialize, Serialize};

/// Location used by Vertex AI Search when none is configured
pub const DEFAULT_LOCATION: &str = "global";

/// Raw Google configuration from TOML
///
/// # Example
///
/// ```toml
/// [google]
/// api_key = "AIza..."
/// project_id = "data-eng-prod"
/// data_store_id = "data-engineering-books_1757108351078"
/// location = "global"
/// ```
///
/// `GOOGLE_API_KEY`, `GOOGLE_PROJECT_ID` and `DATA_STORE_ID` override the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGoogleConfig {
    /// Gemini API key
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    /// Vertex AI Search data store holding the knowledge base
    pub data_store_id: Option<String>,
    pub location: String,
    /// OAuth bearer token for Vertex AI Search; the API key is used without it
    pub access_token: Option<String>,
}

impl Default for FileGoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            data_store_id: None,
            location: DEFAULT_LOCATION.to_string(),
            access_token: None,
        }
    }
}

impl FileGoogleConfig {
    /// Serving config path of the knowledge-base data store
    pub fn serving_config(&self) -> Option<String> {
        let project = non_blank(self.project_id.as_deref())?;
        let store = non_blank(self.data_store_id.as_deref())?;
        Some(format!(
            "projects/{}/locations/{}/collections/default_collection/dataStores/{}/servingConfigs/default_search",
            project, self.location, store
        ))
    }
}

pub(super) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serving_config_path() {
        let config = FileGoogleConfig {
            project_id: Some("proj".to_string()),
            data_store_id: Some("books".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.serving_config().unwrap(),
            "projects/proj/locations/global/collections/default_collection/dataStores/books/servingConfigs/default_search"
        );
    }

    #[test]
    fn test_serving_config_needs_both_ids() {
        let config = FileGoogleConfig {
            project_id: Some("proj".to_string()),
            data_store_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.serving_config().is_none());
    }
}
