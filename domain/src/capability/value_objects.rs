//! Capability value objects - what one agent invocation produces.

use super::entities::Capability;
use serde::{Deserialize, Serialize};

/// A source an agent relied on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Document title or page title
    pub title: String,
    /// URL for web sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Section or page reference for knowledge-base documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Citation {
    pub fn web(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            section: None,
        }
    }

    pub fn document(title: impl Into<String>, section: Option<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            section,
        }
    }

    /// Identity used to collapse duplicate citations
    pub fn dedup_key(&self) -> String {
        match &self.url {
            Some(url) => url.trim_end_matches('/').to_lowercase(),
            None => format!(
                "{}#{}",
                self.title.to_lowercase(),
                self.section.as_deref().unwrap_or("").to_lowercase()
            ),
        }
    }
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(section) = &self.section {
            write!(f, ", {}", section)?;
        }
        if let Some(url) = &self.url {
            write!(f, " <{}>", url)?;
        }
        Ok(())
    }
}

/// Output of one successful agent invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    pub capability: Capability,
    /// Name of the agent that produced the result
    pub agent: String,
    pub content: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl AgentResult {
    pub fn new(capability: Capability, agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            capability,
            agent: agent.into(),
            content: content.into(),
            citations: Vec::new(),
        }
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_display() {
        let web = Citation::web("dbt incremental models", "https://docs.getdbt.com/docs/build/incremental-models");
        assert_eq!(
            web.to_string(),
            "dbt incremental models <https://docs.getdbt.com/docs/build/incremental-models>"
        );

        let doc = Citation::document("Fundamentals of Data Engineering", Some("ch. 3".to_string()));
        assert_eq!(doc.to_string(), "Fundamentals of Data Engineering, ch. 3");
    }

    #[test]
    fn test_citation_dedup_key_ignores_trailing_slash_and_case() {
        let a = Citation::web("A", "https://Spark.apache.org/docs/latest/");
        let b = Citation::web("B", "https://spark.apache.org/docs/latest");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
