//! Coordinator use case
//!
//! Runs one cycle per query:
//!
//! 1. load the session history
//! 2. route the query to capabilities
//! 3. dispatch the selected agents concurrently, each under a timeout
//! 4. enforce the Decision Memo gate on code output (one revision at most)
//! 5. synthesize a single response
//! 6. append the turn to the session
//!
//! Cycles on the same session are serialized; different sessions run
//! independently.

use crate::agents::AgentPool;
use crate::config::CoordinatorConfig;
use crate::ports::capability_agent::CapabilityAgent;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, EventKind, NoConversationLogger,
};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{CycleProgressNotifier, NoProgress};
use crate::ports::session_store::{SessionStore, StoreError};
use crew_domain::{
    AgentDescriptor, Capability, Cycle, CyclePhase, DispatchOutcome, DomainError, GateCheck,
    GateOutcome, MemoField, NewTurn, PromptTemplate, Router, RoutingDecision, SessionKey,
    SessionMetadata, SynthesizedResponse, Synthesizer, Turn, check_memo, parse_lead_summary,
    recent_turns,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that abort a cycle before a response exists
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Could not load session history: {0}")]
    Storage(#[from] StoreError),
}

/// Input for one coordinator cycle
#[derive(Debug, Clone)]
pub struct CycleInput {
    pub key: SessionKey,
    pub query: String,
    /// Interrupt signal; cancelling it aborts pending dispatches
    pub cancellation: Option<CancellationToken>,
}

impl CycleInput {
    pub fn new(key: SessionKey, query: impl Into<String>) -> Self {
        Self {
            key,
            query: query.into(),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Whether the turn reached the session store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    Persisted { sequence_no: u64 },
    Failed { reason: String },
}

/// Result of one cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub response: SynthesizedResponse,
    pub decision: RoutingDecision,
    pub persistence: PersistenceStatus,
    /// The user interrupted the cycle; the response is partial
    pub interrupted: bool,
}

impl CycleOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self.persistence, PersistenceStatus::Persisted { .. })
    }
}

/// Use case running coordinator cycles
pub struct Coordinator<S: SessionStore + 'static> {
    store: Arc<S>,
    pool: Arc<AgentPool>,
    router: Router,
    config: CoordinatorConfig,
    lead_gateway: Option<Arc<dyn LlmGateway>>,
    conversation_logger: Arc<dyn ConversationLogger>,
    session_locks: Mutex<HashMap<SessionKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: SessionStore + 'static> Coordinator<S> {
    pub fn new(store: Arc<S>, pool: Arc<AgentPool>, config: CoordinatorConfig) -> Self {
        let router = Router::new(&pool.descriptors());
        Self {
            store,
            pool,
            router,
            config,
            lead_gateway: None,
            conversation_logger: Arc::new(NoConversationLogger),
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Gateway used for the lead summary when `lead_model` is configured
    pub fn with_lead_gateway(mut self, gateway: Arc<dyn LlmGateway>) -> Self {
        self.lead_gateway = Some(gateway);
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Execute a cycle with default (no-op) progress
    pub async fn run(&self, input: CycleInput) -> Result<CycleOutcome, CoordinatorError> {
        self.run_with_progress(input, &NoProgress).await
    }

    /// Execute a cycle with progress callbacks
    pub async fn run_with_progress(
        &self,
        input: CycleInput,
        progress: &dyn CycleProgressNotifier,
    ) -> Result<CycleOutcome, CoordinatorError> {
        let query = input.query.trim();
        if query.is_empty() {
            return Err(DomainError::EmptyQuery.into());
        }
        let key = &input.key;
        let lock = self.session_lock(key);
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(key, query, input.cancellation.as_ref(), progress)
                .await
        };
        self.release_session_lock(key, lock);
        result
    }

    async fn run_locked(
        &self,
        key: &SessionKey,
        query: &str,
        token: Option<&CancellationToken>,
        progress: &dyn CycleProgressNotifier,
    ) -> Result<CycleOutcome, CoordinatorError> {
        let mut cycle = Cycle::new();

        // 1. History
        let history = self.store.read_all(key).await?;
        Self::enter(&mut cycle, CyclePhase::HistoryLoaded, progress)?;
        let recent = recent_turns(&history, self.config.history_window);
        debug!("Loaded {} turns for {} ({} in window)", history.len(), key, recent.len());

        // 2. Routing
        let decision = self.router.route(query, recent);
        info!(
            "Routed to [{}]{}",
            decision
                .capabilities()
                .iter()
                .map(Capability::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            if decision.requires_decision_memo() {
                " (decision memo required)"
            } else {
                ""
            }
        );
        debug!("Routing signals: {:?}", decision.signals());
        self.conversation_logger.log(ConversationEvent::new(
            EventKind::RoutingDecision,
            json!({
                "session": key.to_string(),
                "query": query,
                "capabilities": decision.capabilities(),
                "requires_decision_memo": decision.requires_decision_memo(),
                "fallback": decision.is_fallback(),
                "signals": decision.signals(),
            }),
        ));
        progress.on_routed(&decision);
        cycle.require_gate(decision.requires_decision_memo());
        Self::enter(&mut cycle, CyclePhase::Routed, progress)?;

        // 3. Dispatch
        let context: Arc<[Turn]> = Arc::from(recent);
        let metadata = SessionMetadata::new(key, history.len() + 1);
        let (mut outcomes, mut interrupted) = self
            .dispatch(query, &context, &metadata, &decision, token, progress)
            .await;
        Self::enter(&mut cycle, CyclePhase::Dispatched, progress)?;

        // 4. Decision memo gate
        let gate = if decision.requires_decision_memo() {
            let (gate, gate_interrupted) = self
                .apply_gate(query, &context, &metadata, &mut outcomes, token, progress)
                .await;
            interrupted |= gate_interrupted;
            Self::enter(&mut cycle, CyclePhase::Gated, progress)?;
            Some(gate)
        } else {
            None
        };

        // 5. Synthesis
        let mut response = Synthesizer::synthesize(&outcomes, gate);
        if interrupted {
            response.push_warning(
                "Interrupted: some agents did not finish, so this answer is partial.",
            );
        } else {
            response = self.lead_summary(query, response).await;
        }
        Self::enter(&mut cycle, CyclePhase::Synthesized, progress)?;

        // 6. Persist
        let turn = NewTurn::new(query, response.render_markdown(), response.contributing_agents());
        let persistence = match self.store.append(key, turn).await {
            Ok(turn) => {
                info!("Persisted turn {} of {}", turn.sequence_no, key);
                self.conversation_logger.log(ConversationEvent::new(
                    EventKind::TurnPersisted,
                    json!({
                        "session": key.to_string(),
                        "sequence_no": turn.sequence_no,
                        "contributing_agents": turn.contributing_agents,
                        "interrupted": interrupted,
                    }),
                ));
                PersistenceStatus::Persisted {
                    sequence_no: turn.sequence_no,
                }
            }
            Err(e) => {
                warn!("Failed to persist turn for {}: {}", key, e);
                response.push_warning(format!(
                    "This answer was not saved to the session history ({}). Follow-up questions will not see it.",
                    e
                ));
                PersistenceStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        Self::enter(&mut cycle, CyclePhase::Persisted, progress)?;
        Self::enter(&mut cycle, CyclePhase::Idle, progress)?;

        Ok(CycleOutcome {
            response,
            decision,
            persistence,
            interrupted,
        })
    }

    fn enter(
        cycle: &mut Cycle,
        phase: CyclePhase,
        progress: &dyn CycleProgressNotifier,
    ) -> Result<(), DomainError> {
        cycle.advance(phase)?;
        debug!("Cycle phase: {}", phase);
        progress.on_phase(phase);
        Ok(())
    }

    fn session_lock(&self, key: &SessionKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Forget the session's lock once no other cycle holds or awaits it.
    fn release_session_lock(&self, key: &SessionKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .session_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    /// Run every selected agent concurrently.
    ///
    /// Returns one outcome per selected capability and whether the user
    /// interrupted the dispatch.
    async fn dispatch(
        &self,
        query: &str,
        context: &Arc<[Turn]>,
        metadata: &SessionMetadata,
        decision: &RoutingDecision,
        token: Option<&CancellationToken>,
        progress: &dyn CycleProgressNotifier,
    ) -> (Vec<DispatchOutcome>, bool) {
        let timeout = self.config.agent_timeout;
        let mut outcomes = Vec::new();
        let mut pending: Vec<AgentDescriptor> = Vec::new();
        let mut join_set = JoinSet::new();

        for &capability in decision.capabilities() {
            let Some(agent) = self.pool.get(capability) else {
                let outcome = DispatchOutcome::NotRegistered(capability);
                self.record_outcome(&outcome);
                outcomes.push(outcome);
                continue;
            };
            let descriptor = agent.descriptor().clone();
            pending.push(descriptor.clone());

            let query = query.to_string();
            let context = Arc::clone(context);
            let metadata = metadata.clone();

            join_set.spawn(async move {
                let invocation = agent.invoke(&query, &context, &metadata);
                match tokio::time::timeout(timeout, invocation).await {
                    Ok(Ok(result)) => DispatchOutcome::Completed(result),
                    Ok(Err(e)) => DispatchOutcome::Failed {
                        capability,
                        agent: descriptor.name,
                        reason: e.to_string(),
                    },
                    Err(_) => DispatchOutcome::TimedOut {
                        capability,
                        agent: descriptor.name,
                        after: timeout,
                    },
                }
            });
        }

        info!("Dispatching to {} agent(s)", pending.len());
        progress.on_dispatch_start(&pending);

        let mut interrupted = false;
        loop {
            let joined = if let Some(token) = token {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        join_set.abort_all();
                        interrupted = true;
                        break;
                    }
                    joined = join_set.join_next() => joined,
                }
            } else {
                join_set.join_next().await
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok(outcome) => {
                    let capability = outcome.capability();
                    if let Some(pos) = pending.iter().position(|d| d.capability == capability) {
                        let descriptor = pending.remove(pos);
                        progress.on_agent_complete(&descriptor, outcome.is_completed());
                    }
                    self.record_outcome(&outcome);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    warn!("Agent task join error: {}", e);
                }
            }
        }

        for descriptor in pending {
            let outcome = if interrupted {
                DispatchOutcome::Interrupted {
                    capability: descriptor.capability,
                    agent: descriptor.name.clone(),
                }
            } else {
                DispatchOutcome::Failed {
                    capability: descriptor.capability,
                    agent: descriptor.name.clone(),
                    reason: "agent task ended unexpectedly".to_string(),
                }
            };
            progress.on_agent_complete(&descriptor, false);
            self.record_outcome(&outcome);
            outcomes.push(outcome);
        }

        (outcomes, interrupted)
    }

    fn record_outcome(&self, outcome: &DispatchOutcome) {
        let agent = outcome.agent().unwrap_or("-");
        let payload = match outcome {
            DispatchOutcome::Completed(result) => {
                info!("{} answered ({} chars)", agent, result.content.len());
                json!({
                    "agent": agent,
                    "capability": result.capability,
                    "status": "completed",
                    "content": result.content,
                    "citations": result.citations,
                })
            }
            other => {
                let reason = other.unavailable_reason().unwrap_or_default();
                warn!("{} unavailable: {}", agent, reason);
                json!({
                    "agent": agent,
                    "capability": other.capability(),
                    "status": "unavailable",
                    "reason": reason,
                })
            }
        };
        self.conversation_logger
            .log(ConversationEvent::new(EventKind::AgentResult, payload));
    }

    /// Check the code output for a Decision Memo, requesting one revision.
    ///
    /// Replaces the code outcome with the revision when the revision is at
    /// least as complete as the draft. Returns the gate outcome and whether
    /// the revision was interrupted.
    async fn apply_gate(
        &self,
        query: &str,
        context: &Arc<[Turn]>,
        metadata: &SessionMetadata,
        outcomes: &mut [DispatchOutcome],
        token: Option<&CancellationToken>,
        progress: &dyn CycleProgressNotifier,
    ) -> (GateOutcome, bool) {
        let Some(index) = outcomes
            .iter()
            .position(|o| o.capability() == Capability::CodeGeneration && o.is_completed())
        else {
            info!("Decision memo gate: no code output to check");
            return (GateOutcome::NoOutput, false);
        };
        let Some(draft) = outcomes[index].result().map(|r| r.content.clone()) else {
            return (GateOutcome::NoOutput, false);
        };

        let missing = match check_memo(&draft) {
            GateCheck::Satisfied(_) => {
                info!("Decision memo present");
                return (GateOutcome::Passed, false);
            }
            GateCheck::Missing(missing) => missing,
        };
        let missing_labels: Vec<&str> = missing.iter().map(MemoField::label).collect();

        if token.is_some_and(CancellationToken::is_cancelled) {
            return (GateOutcome::Ungated { missing }, true);
        }
        let Some(agent) = self.pool.get(Capability::CodeGeneration) else {
            return (GateOutcome::Ungated { missing }, false);
        };

        info!(
            "Decision memo missing ({}); requesting one revision",
            missing_labels.join(", ")
        );
        progress.on_gate_revision(&missing);

        let timeout = self.config.agent_timeout;
        let revision = tokio::time::timeout(
            timeout,
            agent.revise(query, &draft, &missing, context, metadata),
        );
        let (revised, interrupted) = match token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => (None, true),
                result = revision => (Some(result), false),
            },
            None => (Some(revision.await), false),
        };
        let revised = match revised {
            Some(Ok(Ok(result))) => Ok(result),
            Some(Ok(Err(e))) => Err(e.to_string()),
            Some(Err(_)) => Err(format!("timed out after {}s", timeout.as_secs())),
            None => Err("interrupted by user".to_string()),
        };

        let (gate, accepted) = match revised {
            Ok(result) => match check_memo(&result.content) {
                GateCheck::Satisfied(_) => {
                    outcomes[index] = DispatchOutcome::Completed(result);
                    (GateOutcome::PassedAfterRevision, "revision")
                }
                GateCheck::Missing(still) if still.len() <= missing.len() => {
                    outcomes[index] = DispatchOutcome::Completed(result);
                    (GateOutcome::Ungated { missing: still }, "revision")
                }
                GateCheck::Missing(_) => (GateOutcome::Ungated { missing }, "draft"),
            },
            Err(reason) => {
                warn!("Decision memo revision failed: {}", reason);
                (GateOutcome::Ungated { missing }, "draft")
            }
        };

        if gate.is_ungated() {
            warn!("Code output accepted UNGATED ({} kept)", accepted);
        } else {
            info!("Decision memo present after revision");
        }
        self.conversation_logger.log(ConversationEvent::new(
            EventKind::GateRevision,
            json!({
                "missing_before": missing_labels,
                "outcome": gate,
                "accepted": accepted,
            }),
        ));

        (gate, interrupted)
    }

    /// Let the lead model write summary and next steps, keeping the
    /// deterministic ones on any failure.
    async fn lead_summary(&self, query: &str, response: SynthesizedResponse) -> SynthesizedResponse {
        let (Some(gateway), Some(model)) = (&self.lead_gateway, &self.config.lead_model) else {
            return response;
        };
        if response.available_sections().next().is_none() {
            return response;
        }

        let sections = response.render_markdown();
        let call = async {
            let session = gateway
                .create_session_with_system_prompt(model, PromptTemplate::lead_summary_system())
                .await?;
            session
                .send(&PromptTemplate::lead_summary_prompt(query, &sections))
                .await
        };

        match tokio::time::timeout(self.config.agent_timeout, call).await {
            Ok(Ok(text)) => match parse_lead_summary(&text) {
                Some(lead) => {
                    debug!("Lead summary: {} points", lead.summary.len());
                    response.with_lead_summary(lead.summary, lead.recommendations)
                }
                None => {
                    warn!("Lead summary had no summary bullets; using the deterministic summary");
                    response
                }
            },
            Ok(Err(e)) => {
                warn!("Lead summary failed: {}; using the deterministic summary", e);
                response
            }
            Err(_) => {
                warn!("Lead summary timed out; using the deterministic summary");
                response
            }
        }
    }
}
