//! Application layer for data-crew
//!
//! This crate contains use cases, port definitions, the capability agents
//! and the coordinator configuration. It depends only on the domain layer.

pub mod agents;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use agents::{AgentPool, AgentPoolBuilder, CodeStandardsAgent, KnowledgeAgent, WebSearchAgent};
pub use config::CoordinatorConfig;
pub use ports::{
    capability_agent::{AgentError, CapabilityAgent},
    conversation_logger::{ConversationEvent, ConversationLogger, EventKind, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    progress::{CycleProgressNotifier, NoProgress},
    search::{KnowledgePassage, KnowledgeSearch, SearchError, WebHit, WebSearch},
    session_store::{InMemorySessionStore, SessionRecord, SessionStore, StoreError},
};
pub use use_cases::coordinator::{
    Coordinator, CoordinatorError, CycleInput, CycleOutcome, PersistenceStatus,
};
pub use use_cases::manage_sessions::{
    DEFAULT_RETENTION_DAYS, SessionLifecycle, SessionLifecycleError,
};
