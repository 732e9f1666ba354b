//! Decision-memo gate.
//!
//! Code generation output is only accepted once it opens with a Decision
//! Memo answering WHAT / WHY / WHO / WHERE / WHEN. The check is mechanical;
//! the agent's instructions ask for the memo, this module verifies it.

pub mod memo;

pub use memo::{DecisionMemo, GateCheck, MemoField, check_memo};

use serde::{Deserialize, Serialize};

/// Marker prefixed to code output that bypassed the gate
pub const UNGATED_MARKER: &str = "⚠ UNGATED";

/// How the gate resolved for one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateOutcome {
    /// The first draft already carried a memo
    Passed,
    /// The memo appeared after the single revision request
    PassedAfterRevision,
    /// No memo after revision; the output is shown with a warning
    Ungated { missing: Vec<MemoField> },
    /// The code agent produced nothing to gate (failure or timeout)
    NoOutput,
}

impl GateOutcome {
    pub fn is_ungated(&self) -> bool {
        matches!(self, GateOutcome::Ungated { .. })
    }

    /// Warning text shown above ungated output
    pub fn warning(&self) -> Option<String> {
        match self {
            GateOutcome::Ungated { missing } => Some(format!(
                "{}: this code was produced without a complete Decision Memo (missing {}). Review impact and risk before using it.",
                UNGATED_MARKER,
                missing
                    .iter()
                    .map(|f| f.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            _ => None,
        }
    }
}
