//! Routing decision value object

use crate::capability::entities::{Capability, CapabilitySet};
use serde::{Deserialize, Serialize};

/// The router's choice for one query (Value Object)
///
/// Invariants, enforced by the constructors:
/// - the capability set is never empty (knowledge retrieval is the fallback)
/// - `requires_decision_memo` is true exactly when code generation is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    capabilities: CapabilitySet,
    requires_decision_memo: bool,
    fallback: bool,
    /// Keywords or rules that triggered each selection, for logs
    signals: Vec<String>,
}

impl RoutingDecision {
    pub fn new(capabilities: CapabilitySet) -> Self {
        if capabilities.is_empty() {
            return Self::fallback();
        }
        let requires_decision_memo = capabilities.contains(&Capability::CodeGeneration);
        Self {
            capabilities,
            requires_decision_memo,
            fallback: false,
            signals: Vec::new(),
        }
    }

    /// Decision used when no intent could be recognised.
    pub fn fallback() -> Self {
        Self {
            capabilities: [Capability::KnowledgeRetrieval].into_iter().collect(),
            requires_decision_memo: false,
            fallback: true,
            signals: vec!["fallback".to_string()],
        }
    }

    pub fn with_signals(mut self, signals: Vec<String>) -> Self {
        if !self.fallback {
            self.signals = signals;
        }
        self
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn selects(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn requires_decision_memo(&self) -> bool {
        self.requires_decision_memo
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn signals(&self) -> &[String] {
        &self.signals
    }
}
