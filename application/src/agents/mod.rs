//! Capability agents
//!
//! - [`WebSearchAgent`]: official documentation via web search
//! - [`KnowledgeAgent`]: validated reference material from the vector knowledge base
//! - [`CodeStandardsAgent`]: code generation and review under the Decision Memo rule
//! - [`AgentPool`]: frozen capability → agent registry

pub mod code;
pub mod knowledge;
pub mod pool;
pub mod web;

pub use code::CodeStandardsAgent;
pub use knowledge::KnowledgeAgent;
pub use pool::{AgentPool, AgentPoolBuilder};
pub use web::WebSearchAgent;

use crate::ports::capability_agent::AgentError;
use crate::ports::llm_gateway::LlmGateway;
use crew_domain::Model;
use tracing::debug;

/// One-shot model call shared by the agents
pub(crate) async fn ask_model(
    gateway: &dyn LlmGateway,
    model: &Model,
    system_prompt: &str,
    prompt: &str,
) -> Result<String, AgentError> {
    debug!("Querying {} ({} prompt bytes)", model, prompt.len());
    let session = gateway
        .create_session_with_system_prompt(model, system_prompt)
        .await?;
    let answer = session.send(prompt).await?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(AgentError::EmptyAnswer);
    }
    Ok(answer.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
    use async_trait::async_trait;
    use crew_domain::{Model, SessionId, SessionKey, SessionMetadata, UserId};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Gateway replaying scripted answers and recording prompts
    #[derive(Default)]
    pub struct ScriptedGateway {
        answers: Mutex<VecDeque<Result<String, String>>>,
        pub prompts: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ScriptedGateway {
        pub fn new(answers: Vec<Result<&str, &str>>) -> Self {
            Self {
                answers: Mutex::new(
                    answers
                        .into_iter()
                        .map(|a| a.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                prompts: Arc::default(),
            }
        }

        pub fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    struct ScriptedSession {
        model: Model,
        system: String,
        answer: Option<Result<String, String>>,
        prompts: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl LlmSession for ScriptedSession {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn send(&self, content: &str) -> Result<String, GatewayError> {
            self.prompts
                .lock()
                .unwrap()
                .push((self.system.clone(), content.to_string()));
            match &self.answer {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(e)) => Err(GatewayError::RequestFailed(e.clone())),
                None => Err(GatewayError::Other("No more responses".to_string())),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
            self.create_session_with_system_prompt(model, "").await
        }

        async fn create_session_with_system_prompt(
            &self,
            model: &Model,
            system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            let answer = self.answers.lock().unwrap().pop_front();
            Ok(Box::new(ScriptedSession {
                model: model.clone(),
                system: system_prompt.to_string(),
                answer,
                prompts: Arc::clone(&self.prompts),
            }))
        }
    }

    pub fn metadata() -> SessionMetadata {
        let key = SessionKey::new(
            UserId::new("ana").unwrap(),
            SessionId::new("ana_test").unwrap(),
        );
        SessionMetadata::new(&key, 1)
    }
}
