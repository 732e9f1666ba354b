//! DuckDuckGo Instant Answer web search.
//!
//! The API returns an abstract plus related topics rather than a full result
//! listing; both are turned into [`WebHit`]s, abstract first.

use super::{http_client, json_body};
use async_trait::async_trait;
use crew_application::ports::search::{SearchError, WebHit, WebSearch};
use serde_json::Value;
use tracing::debug;

/// DuckDuckGo Instant Answer API endpoint (no API key required).
const DDG_API_URL: &str = "https://api.duckduckgo.com/";

/// Related topics kept per query
const MAX_HITS: usize = 10;

pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self, SearchError> {
        Self::with_endpoint(DDG_API_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<Vec<WebHit>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let body = json_body(response).await?;
        let hits = parse_hits(&body);
        debug!("DuckDuckGo returned {} hits", hits.len());
        Ok(hits)
    }
}

/// Extract hits from an Instant Answer response.
fn parse_hits(data: &Value) -> Vec<WebHit> {
    let mut hits = Vec::new();

    if let Some(abstract_text) = non_empty(&data["AbstractText"])
        && let Some(url) = non_empty(&data["AbstractURL"])
    {
        let title = non_empty(&data["Heading"])
            .or_else(|| non_empty(&data["AbstractSource"]))
            .unwrap_or(url);
        hits.push(WebHit {
            title: title.to_string(),
            url: url.to_string(),
            snippet: abstract_text.to_string(),
        });
    }

    if let Some(answer) = non_empty(&data["Answer"]) {
        let url = non_empty(&data["AnswerURL"]).or_else(|| non_empty(&data["AbstractURL"]));
        if let Some(url) = url {
            hits.push(WebHit {
                title: "Instant Answer".to_string(),
                url: url.to_string(),
                snippet: answer.to_string(),
            });
        }
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        // Topic groups nest their entries under "Topics"
        let flattened = topics.iter().flat_map(|t| match t["Topics"].as_array() {
            Some(group) => group.iter().collect::<Vec<_>>(),
            None => vec![t],
        });
        for topic in flattened {
            if hits.len() >= MAX_HITS {
                break;
            }
            let (Some(text), Some(url)) = (non_empty(&topic["Text"]), non_empty(&topic["FirstURL"]))
            else {
                continue;
            };
            let title = text.split(" - ").next().unwrap_or(text);
            hits.push(WebHit {
                title: title.to_string(),
                url: url.to_string(),
                snippet: text.to_string(),
            });
        }
    }

    hits
}

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_abstract_comes_first() {
        let data = json!({
            "Heading": "Apache Iceberg",
            "AbstractText": "Apache Iceberg is an open table format.",
            "AbstractSource": "Wikipedia",
            "AbstractURL": "https://en.wikipedia.org/wiki/Apache_Iceberg",
            "Answer": "",
            "RelatedTopics": [
                {"Text": "Apache Parquet - A columnar storage format", "FirstURL": "https://duckduckgo.com/Apache_Parquet"}
            ]
        });

        let hits = parse_hits(&data);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Apache Iceberg");
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/Apache_Iceberg");
        assert_eq!(hits[1].title, "Apache Parquet");
    }

    #[test]
    fn test_nested_topic_groups_are_flattened() {
        let data = json!({
            "AbstractText": "",
            "RelatedTopics": [
                {"Name": "Software", "Topics": [
                    {"Text": "Delta Lake - Storage layer", "FirstURL": "https://duckduckgo.com/Delta_Lake"},
                    {"Text": "Apache Hudi", "FirstURL": "https://duckduckgo.com/Apache_Hudi"}
                ]},
                {"Text": "", "FirstURL": "https://duckduckgo.com/empty"}
            ]
        });

        let hits = parse_hits(&data);
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Delta Lake", "Apache Hudi"]);
    }

    #[test]
    fn test_hits_are_capped() {
        let topics: Vec<Value> = (0..25)
            .map(|i| json!({"Text": format!("Topic {}", i), "FirstURL": format!("https://duckduckgo.com/{}", i)}))
            .collect();
        let hits = parse_hits(&json!({ "RelatedTopics": topics }));
        assert_eq!(hits.len(), MAX_HITS);
    }

    #[test]
    fn test_empty_response_has_no_hits() {
        assert!(parse_hits(&json!({"AbstractText": "", "RelatedTopics": []})).is_empty());
    }
}
