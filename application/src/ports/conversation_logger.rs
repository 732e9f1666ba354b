//! Port for the structured conversation transcript.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics,
//! this port records what each cycle decided and produced (JSONL).

use serde_json::Value;

/// Kinds of transcript records a cycle emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    RoutingDecision,
    AgentResult,
    GateRevision,
    TurnPersisted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RoutingDecision => "routing_decision",
            EventKind::AgentResult => "agent_result",
            EventKind::GateRevision => "gate_revision",
            EventKind::TurnPersisted => "turn_persisted",
        }
    }
}

/// One transcript record; the logger adds the timestamp.
pub struct ConversationEvent {
    pub kind: EventKind,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

/// `log` is synchronous and non-fallible; implementations report their own
/// write failures through `tracing`.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Used when no transcript is configured
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
