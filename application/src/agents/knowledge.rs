//! Knowledge-base agent
//!
//! Retrieves a few passages from the vector knowledge base and asks the
//! model to answer from them alone. When the search finds nothing the agent
//! answers that directly instead of letting the model improvise.

use super::ask_model;
use crate::ports::capability_agent::{AgentError, CapabilityAgent};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::search::{KnowledgePassage, KnowledgeSearch};
use async_trait::async_trait;
use crew_domain::core::string::truncate_chars;
use crew_domain::{
    AgentDescriptor, AgentResult, Capability, Citation, Model, PromptTemplate, SessionMetadata,
    Turn,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Passages requested per query
pub const PAGE_SIZE: usize = 3;

/// Characters of each passage handed to the model
pub const PASSAGE_CHARS: usize = 500;

const NO_PASSAGES: &str = "No passages in the internal knowledge base matched this question, so there is no validated reference material to report. Try rephrasing it, or ask for the official documentation instead.";

pub struct KnowledgeAgent {
    descriptor: AgentDescriptor,
    gateway: Arc<dyn LlmGateway>,
    search: Arc<dyn KnowledgeSearch>,
    model: Model,
}

impl KnowledgeAgent {
    pub const NAME: &'static str = "RAG Agent";

    pub fn new(gateway: Arc<dyn LlmGateway>, search: Arc<dyn KnowledgeSearch>, model: Model) -> Self {
        Self {
            descriptor: AgentDescriptor::new(Self::NAME, Capability::KnowledgeRetrieval),
            gateway,
            search,
            model,
        }
    }

    fn format_passages(passages: &[KnowledgePassage]) -> String {
        passages
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let reference = match &p.section {
                    Some(section) => format!("{}, {}", p.title, section),
                    None => p.title.clone(),
                };
                format!("[{}] {}\n{}", i + 1, reference, truncate_chars(&p.content, PASSAGE_CHARS))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl CapabilityAgent for KnowledgeAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        query: &str,
        context: &[Turn],
        metadata: &SessionMetadata,
    ) -> Result<AgentResult, AgentError> {
        let passages = self.search.search(query, PAGE_SIZE).await?;
        if passages.is_empty() {
            info!("Knowledge base returned no passages");
            return Ok(AgentResult::new(
                Capability::KnowledgeRetrieval,
                Self::NAME,
                NO_PASSAGES,
            ));
        }
        debug!("Knowledge base returned {} passages", passages.len());

        let prompt = PromptTemplate::knowledge_prompt(
            query,
            &PromptTemplate::session_context(metadata, context),
            &Self::format_passages(&passages),
        );
        let answer = ask_model(
            self.gateway.as_ref(),
            &self.model,
            PromptTemplate::knowledge_system(),
            &prompt,
        )
        .await?;

        let citations = passages
            .iter()
            .map(|p| Citation::document(&p.title, p.section.clone()))
            .collect();
        Ok(AgentResult::new(Capability::KnowledgeRetrieval, Self::NAME, answer)
            .with_citations(citations))
    }
}
