//! Capability agent port
//!
//! A capability agent answers one kind of request (web lookup, knowledge
//! retrieval, code generation). Agents hold only their construction-time
//! instructions; everything session-specific arrives with each call.

use super::llm_gateway::GatewayError;
use super::search::SearchError;
use async_trait::async_trait;
use crew_domain::{AgentDescriptor, AgentResult, MemoField, PromptTemplate, SessionMetadata, Turn};
use thiserror::Error;

/// Errors from a single agent invocation
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model request failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Agent produced an empty answer")]
    EmptyAnswer,
}

#[async_trait]
pub trait CapabilityAgent: Send + Sync {
    fn descriptor(&self) -> &AgentDescriptor;

    /// Answer `query` given the recent turns of the session, oldest first.
    async fn invoke(
        &self,
        query: &str,
        context: &[Turn],
        metadata: &SessionMetadata,
    ) -> Result<AgentResult, AgentError>;

    /// Re-answer `query` after `draft` was rejected for lacking a Decision
    /// Memo.
    ///
    /// The default sends the revision request through [`invoke`](Self::invoke).
    async fn revise(
        &self,
        query: &str,
        draft: &str,
        missing: &[MemoField],
        context: &[Turn],
        metadata: &SessionMetadata,
    ) -> Result<AgentResult, AgentError> {
        let labels: Vec<&str> = missing.iter().map(MemoField::label).collect();
        let revision = PromptTemplate::memo_revision(query, draft, &labels);
        self.invoke(&revision, context, metadata).await
    }
}
