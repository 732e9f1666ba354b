//! Vertex AI Search (Discovery Engine) knowledge-base search.
//!
//! Queries the `default_search` serving config of a data store holding the
//! team's data engineering books and returns one passage per document.

use super::{http_client, json_body};
use async_trait::async_trait;
use crew_application::ports::search::{KnowledgePassage, KnowledgeSearch, SearchError};
use serde_json::{Value, json};
use tracing::debug;

const DISCOVERY_ENGINE_URL: &str = "https://discoveryengine.googleapis.com/v1";

/// Credentials for the Discovery Engine API
#[derive(Clone)]
pub enum VertexAuth {
    /// OAuth access token (e.g. `gcloud auth print-access-token`)
    Bearer(String),
    ApiKey(String),
}

impl std::fmt::Debug for VertexAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VertexAuth::Bearer(_) => f.write_str("Bearer(***)"),
            VertexAuth::ApiKey(_) => f.write_str("ApiKey(***)"),
        }
    }
}

pub struct VertexKnowledgeSearch {
    client: reqwest::Client,
    search_url: String,
    auth: VertexAuth,
}

impl VertexKnowledgeSearch {
    /// `serving_config` is the full resource path ending in `servingConfigs/default_search`
    pub fn new(serving_config: &str, auth: VertexAuth) -> Result<Self, SearchError> {
        Self::with_base_url(DISCOVERY_ENGINE_URL, serving_config, auth)
    }

    pub fn with_base_url(
        base_url: &str,
        serving_config: &str,
        auth: VertexAuth,
    ) -> Result<Self, SearchError> {
        if serving_config.trim().is_empty() {
            return Err(SearchError::NotConfigured(
                "Vertex AI Search serving config is empty".to_string(),
            ));
        }
        Ok(Self {
            client: http_client()?,
            search_url: format!(
                "{}/{}:search",
                base_url.trim_end_matches('/'),
                serving_config.trim_start_matches('/')
            ),
            auth,
        })
    }
}

#[async_trait]
impl KnowledgeSearch for VertexKnowledgeSearch {
    async fn search(
        &self,
        query: &str,
        page_size: usize,
    ) -> Result<Vec<KnowledgePassage>, SearchError> {
        let request = self
            .client
            .post(&self.search_url)
            .json(&json!({ "query": query, "pageSize": page_size }));
        let request = match &self.auth {
            VertexAuth::Bearer(token) => request.bearer_auth(token),
            VertexAuth::ApiKey(key) => request.query(&[("key", key)]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        let body = json_body(response).await?;

        let passages = parse_passages(&body, page_size);
        debug!("Vertex AI Search returned {} passages", passages.len());
        Ok(passages)
    }
}

fn parse_passages(body: &Value, page_size: usize) -> Vec<KnowledgePassage> {
    let Some(results) = body["results"].as_array() else {
        return Vec::new();
    };
    results
        .iter()
        .filter_map(|r| passage(&r["document"]))
        .take(page_size)
        .collect()
}

fn passage(document: &Value) -> Option<KnowledgePassage> {
    let data = &document["derivedStructData"];
    let answer = data["extractive_answers"].get(0);

    let content = text(&data["content"])
        .or_else(|| answer.and_then(|a| text(&a["content"])))
        .or_else(|| {
            data["snippets"]
                .get(0)
                .and_then(|s| text(&s["snippet"]))
        })?;

    let title = text(&data["title"])
        .or_else(|| text(&document["id"]))
        .unwrap_or("Untitled document");

    let section = answer
        .and_then(|a| match &a["pageNumber"] {
            Value::String(page) if !page.is_empty() => Some(page.clone()),
            Value::Number(page) => Some(page.to_string()),
            _ => None,
        })
        .map(|page| format!("p. {}", page));

    Some(KnowledgePassage {
        title: title.to_string(),
        section,
        content: content.to_string(),
    })
}

fn text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passages_from_extractive_answers() {
        let body = json!({
            "results": [
                {"document": {"id": "doc-1", "derivedStructData": {
                    "title": "Fundamentals of Data Engineering",
                    "extractive_answers": [{"content": "A data pipeline is...", "pageNumber": "42"}]
                }}},
                {"document": {"id": "doc-2", "derivedStructData": {
                    "snippets": [{"snippet": "Kimball dimensional modeling"}]
                }}},
                {"document": {"id": "doc-3", "derivedStructData": {}}}
            ]
        });

        let passages = parse_passages(&body, 3);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].title, "Fundamentals of Data Engineering");
        assert_eq!(passages[0].section.as_deref(), Some("p. 42"));
        assert_eq!(passages[1].title, "doc-2");
        assert!(passages[1].section.is_none());
    }

    #[test]
    fn test_plain_content_field_wins() {
        let body = json!({"results": [{"document": {"derivedStructData": {
            "title": "Designing Data-Intensive Applications",
            "content": "Replication keeps a copy of the same data on several machines.",
            "extractive_answers": [{"content": "ignored"}]
        }}}]});
        let passages = parse_passages(&body, 3);
        assert!(passages[0].content.starts_with("Replication"));
    }

    #[test]
    fn test_no_results_is_empty() {
        assert!(parse_passages(&json!({}), 3).is_empty());
    }

    #[test]
    fn test_search_url() {
        let search = VertexKnowledgeSearch::with_base_url(
            "http://localhost:9000/v1/",
            "projects/p/locations/global/collections/default_collection/dataStores/d/servingConfigs/default_search",
            VertexAuth::ApiKey("k".to_string()),
        )
        .unwrap();
        assert_eq!(
            search.search_url,
            "http://localhost:9000/v1/projects/p/locations/global/collections/default_collection/dataStores/d/servingConfigs/default_search:search"
        );
        assert_eq!(format!("{:?}", search.auth), "ApiKey(***)");
    }

    #[test]
    fn test_empty_serving_config_is_rejected() {
        assert!(matches!(
            VertexKnowledgeSearch::new(" ", VertexAuth::ApiKey("k".to_string())),
            Err(SearchError::NotConfigured(_))
        ));
    }
}
