//! Code standards agent

use super::ask_model;
use crate::ports::capability_agent::{AgentError, CapabilityAgent};
use crate::ports::llm_gateway::LlmGateway;
use async_trait::async_trait;
use crew_domain::{
    AgentDescriptor, AgentResult, Capability, Model, PromptTemplate, SessionMetadata, Turn,
};
use std::sync::Arc;

/// Writes and reviews code; instructed to open with a Decision Memo
pub struct CodeStandardsAgent {
    descriptor: AgentDescriptor,
    gateway: Arc<dyn LlmGateway>,
    model: Model,
}

impl CodeStandardsAgent {
    pub const NAME: &'static str = "Code Standards Agent";

    pub fn new(gateway: Arc<dyn LlmGateway>, model: Model) -> Self {
        Self {
            descriptor: AgentDescriptor::new(Self::NAME, Capability::CodeGeneration),
            gateway,
            model,
        }
    }
}

#[async_trait]
impl CapabilityAgent for CodeStandardsAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        query: &str,
        context: &[Turn],
        metadata: &SessionMetadata,
    ) -> Result<AgentResult, AgentError> {
        let prompt =
            PromptTemplate::code_prompt(query, &PromptTemplate::session_context(metadata, context));
        let answer = ask_model(
            self.gateway.as_ref(),
            &self.model,
            PromptTemplate::code_standards_system(),
            &prompt,
        )
        .await?;
        Ok(AgentResult::new(Capability::CodeGeneration, Self::NAME, answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{ScriptedGateway, metadata};
    use crew_domain::MemoField;

    #[tokio::test]
    async fn test_revision_carries_the_draft() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok("WHAT: x\n```py\npass\n```")]));
        let agent = CodeStandardsAgent::new(gateway.clone(), Model::Gemini25Pro);

        agent
            .revise(
                "write a dedupe function",
                "```py\npass\n```",
                &[MemoField::Why, MemoField::Who],
                &[],
                &metadata(),
            )
            .await
            .unwrap();

        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts[0].0.contains("Decision Memo before code"));
        assert!(prompts[0].1.contains("missing: WHY, WHO"));
        assert!(prompts[0].1.contains("```py\npass\n```"));
    }

    #[tokio::test]
    async fn test_gateway_failure_surfaces() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err("503")]));
        let agent = CodeStandardsAgent::new(gateway, Model::Gemini25Pro);
        let err = agent.invoke("write code", &[], &metadata()).await.unwrap_err();
        assert!(matches!(err, AgentError::Gateway(_)));
    }
}
