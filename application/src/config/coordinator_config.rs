//! Coordinator parameters: cycle control.
//!
//! [`CoordinatorConfig`] groups the static parameters that control one
//! [`Coordinator`](crate::use_cases::coordinator::Coordinator) cycle.
//! Built once at startup from the validated file configuration.

use crew_domain::Model;
use std::time::Duration;

/// Cycle control parameters.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound for each agent dispatch (and the memo revision).
    pub agent_timeout: Duration,
    /// Number of prior turns handed to the router and the agents.
    pub history_window: usize,
    /// Model writing the executive summary; `None` keeps the deterministic one.
    pub lead_model: Option<Model>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            history_window: 6,
            lead_model: None,
        }
    }
}

impl CoordinatorConfig {
    // ==================== Builder Methods ====================

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_lead_model(mut self, model: Option<Model>) -> Self {
        self.lead_model = model;
        self
    }
}
