//! Web research agent

use super::ask_model;
use crate::ports::capability_agent::{AgentError, CapabilityAgent};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::search::{WebHit, WebSearch};
use async_trait::async_trait;
use crew_domain::{
    AgentDescriptor, AgentResult, Capability, Citation, Model, PromptTemplate, SessionMetadata,
    Turn,
};
use std::sync::Arc;
use tracing::debug;

pub struct WebSearchAgent {
    descriptor: AgentDescriptor,
    gateway: Arc<dyn LlmGateway>,
    search: Arc<dyn WebSearch>,
    model: Model,
}

impl WebSearchAgent {
    pub const NAME: &'static str = "Web Agent";

    pub fn new(gateway: Arc<dyn LlmGateway>, search: Arc<dyn WebSearch>, model: Model) -> Self {
        Self {
            descriptor: AgentDescriptor::new(Self::NAME, Capability::WebSearch),
            gateway,
            search,
            model,
        }
    }

    fn format_hits(hits: &[WebHit]) -> String {
        if hits.is_empty() {
            return "No results were returned. Say so, and only answer what you can state with confidence.".to_string();
        }
        hits.iter()
            .enumerate()
            .map(|(i, hit)| format!("[{}] {} <{}>\n{}", i + 1, hit.title, hit.url, hit.snippet))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Hits the answer refers to by URL, or every hit when it names none
    fn citations(hits: &[WebHit], answer: &str) -> Vec<Citation> {
        let cited: Vec<&WebHit> = hits.iter().filter(|h| answer.contains(&h.url)).collect();
        let chosen = if cited.is_empty() {
            hits.iter().collect()
        } else {
            cited
        };
        chosen
            .into_iter()
            .map(|h| Citation::web(&h.title, &h.url))
            .collect()
    }
}

#[async_trait]
impl CapabilityAgent for WebSearchAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        query: &str,
        context: &[Turn],
        metadata: &SessionMetadata,
    ) -> Result<AgentResult, AgentError> {
        let hits = self.search.search(query).await?;
        debug!("Web search returned {} hits", hits.len());

        let prompt = PromptTemplate::web_search_prompt(
            query,
            &PromptTemplate::session_context(metadata, context),
            &Self::format_hits(&hits),
        );
        let answer = ask_model(
            self.gateway.as_ref(),
            &self.model,
            PromptTemplate::web_search_system(),
            &prompt,
        )
        .await?;

        let citations = Self::citations(&hits, &answer);
        Ok(AgentResult::new(Capability::WebSearch, Self::NAME, answer).with_citations(citations))
    }
}
