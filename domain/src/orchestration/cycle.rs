//! Coordinator cycle phases

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of one coordinator cycle.
///
/// ```text
/// Idle -> HistoryLoaded -> Routed -> Dispatched -> [Gated] -> Synthesized -> Persisted -> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    HistoryLoaded,
    Routed,
    Dispatched,
    Gated,
    Synthesized,
    Persisted,
}

impl CyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::HistoryLoaded => "history_loaded",
            CyclePhase::Routed => "routed",
            CyclePhase::Dispatched => "dispatched",
            CyclePhase::Gated => "gated",
            CyclePhase::Synthesized => "synthesized",
            CyclePhase::Persisted => "persisted",
        }
    }

    /// Move to `next`, rejecting transitions the cycle does not allow.
    ///
    /// `gate_required` forbids the `Dispatched -> Synthesized` shortcut.
    pub fn advance(self, next: CyclePhase, gate_required: bool) -> Result<CyclePhase, DomainError> {
        use CyclePhase::*;
        let allowed = match (self, next) {
            (Idle, HistoryLoaded)
            | (HistoryLoaded, Routed)
            | (Routed, Dispatched)
            | (Dispatched, Gated)
            | (Gated, Synthesized)
            | (Synthesized, Persisted)
            | (Persisted, Idle) => true,
            (Dispatched, Synthesized) => !gate_required,
            _ => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(DomainError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the phase of a running cycle
#[derive(Debug, Clone)]
pub struct Cycle {
    phase: CyclePhase,
    gate_required: bool,
}

impl Default for Cycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Cycle {
    pub fn new() -> Self {
        Self {
            phase: CyclePhase::Idle,
            gate_required: false,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Record whether the routing decision demanded the gate
    pub fn require_gate(&mut self, required: bool) {
        self.gate_required = required;
    }

    pub fn advance(&mut self, next: CyclePhase) -> Result<CyclePhase, DomainError> {
        self.phase = self.phase.advance(next, self.gate_required)?;
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle_with_gate() {
        let mut cycle = Cycle::new();
        cycle.advance(CyclePhase::HistoryLoaded).unwrap();
        cycle.advance(CyclePhase::Routed).unwrap();
        cycle.require_gate(true);
        cycle.advance(CyclePhase::Dispatched).unwrap();
        cycle.advance(CyclePhase::Gated).unwrap();
        cycle.advance(CyclePhase::Synthesized).unwrap();
        cycle.advance(CyclePhase::Persisted).unwrap();
        assert_eq!(cycle.advance(CyclePhase::Idle).unwrap(), CyclePhase::Idle);
    }

    #[test]
    fn test_gate_cannot_be_skipped() {
        let err = CyclePhase::Dispatched
            .advance(CyclePhase::Synthesized, true)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::IllegalTransition {
                from: CyclePhase::Dispatched,
                to: CyclePhase::Synthesized,
            }
        );
        assert!(
            CyclePhase::Dispatched
                .advance(CyclePhase::Synthesized, false)
                .is_ok()
        );
    }

    #[test]
    fn test_idle_only_from_persisted() {
        assert!(CyclePhase::Synthesized.advance(CyclePhase::Idle, false).is_err());
        assert!(CyclePhase::Routed.advance(CyclePhase::Idle, false).is_err());
        assert!(CyclePhase::Persisted.advance(CyclePhase::Idle, false).is_ok());
    }

    #[test]
    fn test_no_backwards_moves() {
        assert!(CyclePhase::Routed.advance(CyclePhase::HistoryLoaded, false).is_err());
        assert!(CyclePhase::Idle.advance(CyclePhase::Routed, false).is_err());
    }

    #[test]
    fn test_failed_advance_keeps_phase() {
        let mut cycle = Cycle::new();
        assert!(cycle.advance(CyclePhase::Persisted).is_err());
        assert_eq!(cycle.phase(), CyclePhase::Idle);
    }
}
