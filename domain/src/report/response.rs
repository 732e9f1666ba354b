//! Synthesized response value objects

use crate::capability::entities::Capability;
use crate::capability::value_objects::{AgentResult, Citation};
use crate::core::string::normalize_for_comparison;
use crate::gate::{GateOutcome, UNGATED_MARKER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed(AgentResult),
    Failed {
        capability: Capability,
        agent: String,
        reason: String,
    },
    TimedOut {
        capability: Capability,
        agent: String,
        after: Duration,
    },
    /// Aborted by a user interrupt before it finished
    Interrupted { capability: Capability, agent: String },
    /// Routed to a capability no agent provides
    NotRegistered(Capability),
}

impl DispatchOutcome {
    pub fn capability(&self) -> Capability {
        match self {
            DispatchOutcome::Completed(result) => result.capability,
            DispatchOutcome::Failed { capability, .. }
            | DispatchOutcome::TimedOut { capability, .. }
            | DispatchOutcome::Interrupted { capability, .. } => *capability,
            DispatchOutcome::NotRegistered(capability) => *capability,
        }
    }

    pub fn agent(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Completed(result) => Some(&result.agent),
            DispatchOutcome::Failed { agent, .. }
            | DispatchOutcome::TimedOut { agent, .. }
            | DispatchOutcome::Interrupted { agent, .. } => Some(agent),
            DispatchOutcome::NotRegistered(_) => None,
        }
    }

    pub fn result(&self) -> Option<&AgentResult> {
        match self {
            DispatchOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed(_))
    }

    /// Why the dispatch produced nothing, if it did not complete
    pub fn unavailable_reason(&self) -> Option<String> {
        match self {
            DispatchOutcome::Completed(_) => None,
            DispatchOutcome::Failed { reason, .. } => Some(format!("agent failed: {}", reason)),
            DispatchOutcome::TimedOut { after, .. } if after.as_secs() > 0 => {
                Some(format!("timed out after {}s", after.as_secs()))
            }
            DispatchOutcome::TimedOut { after, .. } => {
                Some(format!("timed out after {}ms", after.as_millis()))
            }
            DispatchOutcome::Interrupted { .. } => Some("interrupted by user".to_string()),
            DispatchOutcome::NotRegistered(capability) => {
                Some(format!("no agent registered for {}", capability))
            }
        }
    }
}

/// Whether a section carries usable content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Available,
    /// Code output accepted without a Decision Memo
    Ungated,
    Unavailable { reason: String },
}

/// One attributed section of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub capability: Capability,
    pub title: String,
    /// Agent the content came from
    pub source: Option<String>,
    pub status: SectionStatus,
    pub body: String,
    pub citations: Vec<Citation>,
}

impl ReportSection {
    pub fn is_available(&self) -> bool {
        !matches!(self.status, SectionStatus::Unavailable { .. })
    }

    /// Warning rendered above an ungated section.
    ///
    /// The code section carries the gate's own warning; any other section
    /// holding code under a gated cycle gets a generic one.
    pub fn ungated_warning(&self, gate: Option<&GateOutcome>) -> Option<String> {
        if self.status != SectionStatus::Ungated {
            return None;
        }
        if self.capability == Capability::CodeGeneration
            && let Some(warning) = gate.and_then(GateOutcome::warning)
        {
            return Some(warning);
        }
        Some(format!(
            "{}: this section contains code that is not covered by a Decision Memo. Review impact and risk before using it.",
            UNGATED_MARKER
        ))
    }

    fn icon(&self) -> &'static str {
        match self.capability {
            Capability::KnowledgeRetrieval => "📚",
            Capability::WebSearch => "🌐",
            Capability::CodeGeneration => "🧩",
        }
    }
}

/// The coordinator's single output artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedResponse {
    pub executive_summary: Vec<String>,
    pub sections: Vec<ReportSection>,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    /// Gate resolution, when the decision memo was required
    pub gate: Option<GateOutcome>,
}

impl SynthesizedResponse {
    pub fn available_sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.sections.iter().filter(|s| s.is_available())
    }

    pub fn unavailable_sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.sections.iter().filter(|s| !s.is_available())
    }

    pub fn section(&self, capability: Capability) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.capability == capability)
    }

    /// Agents whose output appears in the response, in section order
    pub fn contributing_agents(&self) -> Vec<String> {
        self.available_sections()
            .filter_map(|s| s.source.clone())
            .collect()
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Replace the deterministic summary with one written by a lead model.
    ///
    /// Lead recommendations are appended after the ones synthesis produced,
    /// skipping any the response already carries.
    pub fn with_lead_summary(mut self, summary: Vec<String>, recommendations: Vec<String>) -> Self {
        if !summary.is_empty() {
            self.executive_summary = summary;
        }
        for recommendation in recommendations {
            let normalized = normalize_for_comparison(&recommendation);
            let known = self
                .recommendations
                .iter()
                .any(|r| normalize_for_comparison(r) == normalized);
            if !known {
                self.recommendations.push(recommendation);
            }
        }
        self
    }

    /// Render the response as markdown, the form stored in the session.
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str("## 📌 Executive Summary\n\n");
        for point in &self.executive_summary {
            out.push_str(&format!("- {}\n", point));
        }

        for section in &self.sections {
            out.push_str(&format!("\n## {} {}\n\n", section.icon(), section.title));
            if let Some(source) = &section.source {
                out.push_str(&format!("_Source: {}_\n\n", source));
            }
            match &section.status {
                SectionStatus::Unavailable { reason } => {
                    out.push_str(&format!("> ⚠ Unavailable: {}\n", reason));
                    continue;
                }
                SectionStatus::Ungated => {
                    if let Some(warning) = section.ungated_warning(self.gate.as_ref()) {
                        out.push_str(&format!("> {}\n\n", warning));
                    }
                }
                SectionStatus::Available => {}
            }
            out.push_str(section.body.trim_end());
            out.push('\n');
            if !section.citations.is_empty() {
                out.push_str("\n**Sources**\n");
                for citation in &section.citations {
                    out.push_str(&format!("- {}\n", citation));
                }
            }
        }

        if !self.recommendations.is_empty() {
            out.push_str("\n## 💡 Recommendations & Next Steps\n\n");
            for item in &self.recommendations {
                out.push_str(&format!("- {}\n", item));
            }
        }

        if !self.warnings.is_empty() {
            out.push_str("\n## ⚠ Warnings\n\n");
            for warning in &self.warnings {
                out.push_str(&format!("- {}\n", warning));
            }
        }

        out
    }
}
