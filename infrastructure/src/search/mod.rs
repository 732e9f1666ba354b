//! Search adapters
//!
//! - [`DuckDuckGoSearch`] implements [`WebSearch`](crew_application::WebSearch)
//!   with the DuckDuckGo Instant Answer API (no API key).
//! - [`VertexKnowledgeSearch`] implements
//!   [`KnowledgeSearch`](crew_application::KnowledgeSearch) against a Vertex AI
//!   Search (Discovery Engine) data store.

mod duckduckgo;
mod vertex;

pub use duckduckgo::DuckDuckGoSearch;
pub use vertex::{VertexAuth, VertexKnowledgeSearch};

use crew_application::SearchError;
use std::time::Duration;

/// Timeout shared by the search HTTP clients
pub(crate) const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client() -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(SEARCH_TIMEOUT)
        .user_agent(concat!("data-crew/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SearchError::Request(e.to_string()))
}

/// Read a JSON body, turning non-success statuses into [`SearchError::Status`]
pub(crate) async fn json_body(response: reqwest::Response) -> Result<serde_json::Value, SearchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| SearchError::Parse(e.to_string()))
}
