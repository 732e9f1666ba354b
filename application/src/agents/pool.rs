//! Capability → agent registry
//!
//! Built once through [`AgentPoolBuilder`] and frozen into an [`AgentPool`];
//! the pool has no mutating methods.

use crate::ports::capability_agent::CapabilityAgent;
use crew_domain::{AgentDescriptor, Capability};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Default)]
pub struct AgentPoolBuilder {
    agents: BTreeMap<Capability, Arc<dyn CapabilityAgent>>,
}

impl AgentPoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its descriptor's capability.
    ///
    /// A second agent for the same capability replaces the first.
    pub fn register(mut self, agent: Arc<dyn CapabilityAgent>) -> Self {
        let capability = agent.descriptor().capability;
        if let Some(previous) = self.agents.insert(capability, agent) {
            warn!(
                "Agent {} replaced for capability {}",
                previous.descriptor().name,
                capability
            );
        }
        self
    }

    pub fn build(self) -> AgentPool {
        AgentPool {
            agents: self.agents,
        }
    }
}

/// Immutable set of registered agents
pub struct AgentPool {
    agents: BTreeMap<Capability, Arc<dyn CapabilityAgent>>,
}

impl AgentPool {
    pub fn builder() -> AgentPoolBuilder {
        AgentPoolBuilder::new()
    }

    pub fn get(&self, capability: Capability) -> Option<Arc<dyn CapabilityAgent>> {
        self.agents.get(&capability).cloned()
    }

    /// Descriptors of every registered agent, in capability order
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.agents
            .values()
            .map(|a| a.descriptor().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::CodeStandardsAgent;
    use crate::agents::test_support::ScriptedGateway;
    use crew_domain::Model;

    #[test]
    fn test_pool_lookup() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let pool = AgentPool::builder()
            .register(Arc::new(CodeStandardsAgent::new(gateway, Model::Gemini25Pro)))
            .build();

        assert_eq!(pool.len(), 1);
        assert!(pool.get(Capability::CodeGeneration).is_some());
        assert!(pool.get(Capability::WebSearch).is_none());
        assert_eq!(pool.descriptors()[0].name, CodeStandardsAgent::NAME);
    }

    #[test]
    fn test_later_registration_replaces() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let pool = AgentPool::builder()
            .register(Arc::new(CodeStandardsAgent::new(gateway.clone(), Model::Gemini25Pro)))
            .register(Arc::new(CodeStandardsAgent::new(gateway, Model::Gemini25Flash)))
            .build();
        assert_eq!(pool.len(), 1);
    }
}
