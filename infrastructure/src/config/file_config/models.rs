//! Model configuration from TOML (`[models]` section)

use crew_domain::Model;
use serde::{Deserialize, Serialize};

/// Raw model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// pro = "gemini-2.5-pro"       # knowledge retrieval, code generation
/// flash = "gemini-2.5-flash"   # web search
/// lead = "gemini-2.5-pro"      # lead summary (defaults to `pro`)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub pro: Option<String>,
    pub flash: Option<String>,
    pub lead: Option<String>,
}

impl FileModelsConfig {
    /// Fields holding an empty model name
    pub fn empty_fields(&self) -> Vec<&'static str> {
        [("pro", &self.pro), ("flash", &self.flash), ("lead", &self.lead)]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_some_and(|v| v.trim().is_empty()))
            .map(|(field, _)| field)
            .collect()
    }

    pub fn pro(&self) -> Model {
        Self::parse(self.pro.as_deref()).unwrap_or_else(Model::default_pro)
    }

    pub fn flash(&self) -> Model {
        Self::parse(self.flash.as_deref()).unwrap_or_else(Model::default_flash)
    }

    pub fn lead(&self) -> Model {
        Self::parse(self.lead.as_deref()).unwrap_or_else(|| self.pro())
    }

    fn parse(value: Option<&str>) -> Option<Model> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        let Ok(model) = value.parse::<Model>();
        Some(model)
    }
}
