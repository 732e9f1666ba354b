//! Search ports
//!
//! Web search and vector knowledge-base search, the two retrieval backends
//! the agents ground their answers on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a search backend
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected search response: {0}")]
    Parse(String),

    #[error("Search backend not configured: {0}")]
    NotConfigured(String),
}

/// One web search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// One passage retrieved from the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgePassage {
    /// Document title (book, paper, guide)
    pub title: String,
    /// Section, chapter or page reference when the backend provides one
    pub section: Option<String>,
    pub content: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<WebHit>, SearchError>;
}

#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// Return at most `page_size` passages, best match first
    async fn search(&self, query: &str, page_size: usize)
    -> Result<Vec<KnowledgePassage>, SearchError>;
}
