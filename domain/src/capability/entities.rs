//! Capability entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The skill an agent provides.
///
/// Ordering is the section order of a synthesized response: internal
/// knowledge first, then the web, then code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    KnowledgeRetrieval,
    WebSearch,
    CodeGeneration,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::KnowledgeRetrieval,
        Capability::WebSearch,
        Capability::CodeGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::KnowledgeRetrieval => "knowledge-retrieval",
            Capability::WebSearch => "web-search",
            Capability::CodeGeneration => "code-generation",
        }
    }

    /// Heading used for this capability's section of a response
    pub fn section_title(&self) -> &'static str {
        match self {
            Capability::KnowledgeRetrieval => "Internal Knowledge (RAG)",
            Capability::WebSearch => "External Documentation (Web)",
            Capability::CodeGeneration => "Code Proposal",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "knowledge-retrieval" | "knowledge" | "rag" => Ok(Capability::KnowledgeRetrieval),
            "web-search" | "web" => Ok(Capability::WebSearch),
            "code-generation" | "code" => Ok(Capability::CodeGeneration),
            other => Err(format!("unknown capability: {}", other)),
        }
    }
}

/// Set of capabilities, ordered by section order
pub type CapabilitySet = BTreeSet<Capability>;

/// Static description of a registered agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub capability: Capability,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
        }
    }
}
