//! Gemini session management.
//!
//! A [`GeminiSession`] keeps the conversation history on the client side
//! and replays it with every `generateContent` request.

use crate::gemini::protocol::{Content, GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use crew_application::ports::llm_gateway::{GatewayError, LlmSession};
use crew_domain::Model;
use reqwest::StatusCode;
use std::sync::Mutex;
use tracing::debug;

pub struct GeminiSession {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: Model,
    system: Option<Content>,
    history: Mutex<Vec<Content>>,
}

impl GeminiSession {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: String,
        api_key: String,
        model: Model,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint,
            api_key,
            model,
            system: system_prompt.filter(|s| !s.is_empty()).map(Content::system),
            history: Mutex::new(Vec::new()),
        }
    }

    fn history(&self) -> Vec<Content> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn record(&self, user: Content, reply: Content) {
        let mut history = self
            .history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        history.push(user);
        history.push(reply);
    }
}

/// Map a non-success HTTP status to a gateway error
pub(crate) fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized(detail),
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(detail),
    }
}

pub(crate) fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else if error.is_connect() {
        GatewayError::ConnectionError(error.to_string())
    } else {
        GatewayError::RequestFailed(error.to_string())
    }
}

#[async_trait]
impl LlmSession for GeminiSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let user = Content::user(content);
        let mut contents = self.history();
        contents.push(user.clone());

        let body = GenerateContentRequest {
            contents: &contents,
            system_instruction: self.system.as_ref(),
        };

        debug!("POST {} ({} contents)", self.endpoint, contents.len());
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Other(format!("Failed to parse Gemini response: {}", e)))?;
        let text = parsed.first_text().ok_or(GatewayError::EmptyResponse)?;

        self.record(user, Content::model(text.clone()));
        Ok(text)
    }
}
