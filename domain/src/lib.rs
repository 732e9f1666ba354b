//! Domain layer for data-crew
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Capabilities
//!
//! Every specialist agent provides exactly one [`Capability`]: knowledge
//! retrieval, web search or code generation.
//!
//! ## Routing and the Decision Memo gate
//!
//! - **Router**: picks the minimal set of capabilities a query needs
//! - **Gate**: code output must open with a WHAT / WHY / WHO / WHERE / WHEN
//!   memo, or it is shown marked UNGATED
//!
//! ## Synthesis
//!
//! Agent results are merged into one [`SynthesizedResponse`] with
//! attributed, de-duplicated sections.

pub mod capability;
pub mod core;
pub mod gate;
pub mod orchestration;
pub mod prompt;
pub mod report;
pub mod routing;
pub mod session;

// Re-export commonly used types
pub use capability::{
    entities::{AgentDescriptor, Capability, CapabilitySet},
    value_objects::{AgentResult, Citation},
};
pub use core::{error::DomainError, model::Model};
pub use gate::{DecisionMemo, GateCheck, GateOutcome, MemoField, UNGATED_MARKER, check_memo};
pub use orchestration::{Cycle, CyclePhase};
pub use prompt::PromptTemplate;
pub use report::{
    DispatchOutcome, LeadSummary, ReportSection, SectionStatus, SynthesizedResponse, Synthesizer,
    parse_lead_summary,
};
pub use routing::{decision::RoutingDecision, router::Router};
pub use session::{
    entities::{NewTurn, SessionMetadata, SessionSummary, Turn, recent_turns},
    identifiers::{MAX_USER_ID_LEN, SessionId, SessionKey, UserId},
};
