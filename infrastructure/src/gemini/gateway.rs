//! Gemini LLM Gateway implementation

use crate::gemini::session::GeminiSession;
use async_trait::async_trait;
use crew_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use crew_domain::Model;
use std::time::Duration;
use tracing::info;

/// Generative Language API root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound for a single HTTP exchange; the coordinator's agent timeout
/// is usually tighter.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// LLM Gateway implementation for the Gemini API
pub struct GeminiLlmGateway {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiLlmGateway {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GatewayError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a gateway against another endpoint (proxies, tests)
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        info!("GeminiLlmGateway initialized ({})", base_url);

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, model: &Model) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl LlmGateway for GeminiLlmGateway {
    async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(GeminiSession::new(
            self.http_client.clone(),
            self.endpoint(model),
            self.api_key.clone(),
            model.clone(),
            None,
        )))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(GeminiSession::new(
            self.http_client.clone(),
            self.endpoint(model),
            self.api_key.clone(),
            model.clone(),
            Some(system_prompt.to_string()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_model_identifier() {
        let gateway = GeminiLlmGateway::with_base_url("key", "http://localhost:8080/v1beta/").unwrap();
        assert_eq!(
            gateway.endpoint(&Model::Gemini25Flash),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_session_reports_its_model() {
        let gateway = GeminiLlmGateway::new("key").unwrap();
        let session = gateway
            .create_session_with_system_prompt(&Model::Gemini25Pro, "system")
            .await
            .unwrap();
        assert_eq!(session.model(), &Model::Gemini25Pro);
    }
}
