//! Progress notification port
//!
//! Defines the interface for reporting progress during a coordinator cycle.

use crew_domain::{AgentDescriptor, CyclePhase, MemoField, RoutingDecision};

/// Callback for progress updates during a cycle
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinners, plain log lines, etc.)
pub trait CycleProgressNotifier: Send + Sync {
    /// Called when the router has decided
    fn on_routed(&self, decision: &RoutingDecision);

    /// Called when the selected agents are dispatched
    fn on_dispatch_start(&self, agents: &[AgentDescriptor]);

    /// Called when one agent finishes, fails or times out
    fn on_agent_complete(&self, agent: &AgentDescriptor, success: bool);

    /// Called when the code draft lacked a memo and a revision was requested
    fn on_gate_revision(&self, _missing: &[MemoField]) {}

    /// Called on every phase transition
    fn on_phase(&self, _phase: CyclePhase) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl CycleProgressNotifier for NoProgress {
    fn on_routed(&self, _decision: &RoutingDecision) {}
    fn on_dispatch_start(&self, _agents: &[AgentDescriptor]) {}
    fn on_agent_complete(&self, _agent: &AgentDescriptor, _success: bool) {}
}
