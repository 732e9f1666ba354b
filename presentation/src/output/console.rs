//! Console output formatter for coordinator responses and session listings

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use crew_domain::{
    GateOutcome, ReportSection, SectionStatus, SessionId, SessionSummary, SynthesizedResponse,
    UserId,
};

/// Formats responses and session data for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete synthesized response
    pub fn format(response: &SynthesizedResponse) -> String {
        let mut output = String::new();

        output.push_str(&Self::section_header("Executive Summary"));
        for point in &response.executive_summary {
            output.push_str(&format!("  * {}\n", point));
        }

        for section in &response.sections {
            output.push_str(&Self::section(section, response.gate.as_ref()));
        }

        if !response.recommendations.is_empty() {
            output.push_str(&Self::section_header("Recommendations & Next Steps"));
            for item in &response.recommendations {
                output.push_str(&format!("  * {}\n", item));
            }
        }

        if !response.warnings.is_empty() {
            output.push_str(&format!("\n{}\n", "Warnings:".yellow().bold()));
            for warning in &response.warnings {
                output.push_str(&format!("  {} {}\n", "!".yellow(), warning));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(response: &SynthesizedResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    fn section(section: &ReportSection, gate: Option<&GateOutcome>) -> String {
        let mut output = Self::section_header(&section.title);
        if let Some(source) = &section.source {
            output.push_str(&format!("{} {}\n", "Source:".dimmed(), source.dimmed()));
        }

        match &section.status {
            SectionStatus::Unavailable { reason } => {
                output.push_str(&format!(
                    "{} {}\n",
                    "Unavailable:".red().bold(),
                    reason
                ));
                return output;
            }
            SectionStatus::Ungated => {
                if let Some(warning) = section.ungated_warning(gate) {
                    output.push_str(&format!("\n{}\n", warning.black().on_yellow().bold()));
                }
            }
            SectionStatus::Available => {}
        }

        output.push('\n');
        output.push_str(section.body.trim_end());
        output.push('\n');

        if !section.citations.is_empty() {
            output.push_str(&format!("\n{}\n", "Sources:".cyan()));
            for citation in &section.citations {
                output.push_str(&format!("  - {}\n", citation));
            }
        }
        output
    }

    /// Format the session list of one user
    pub fn format_sessions(user: &UserId, sessions: &[SessionId]) -> String {
        if sessions.is_empty() {
            return format!("No sessions found for {}.\n", user.as_str().bold());
        }

        let mut output = format!(
            "{} ({})\n",
            format!("Sessions of {}", user.as_str()).cyan().bold(),
            sessions.len()
        );
        for session in sessions {
            output.push_str(&format!("  {}\n", session.as_str()));
        }
        output
    }

    pub fn format_summary(summary: &SessionSummary) -> String {
        let time = |t: chrono::DateTime<chrono::Utc>| t.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let mut output = Self::header(summary.key.session.as_str());
        output.push('\n');
        output.push_str(&format!("{} {}\n", "User:".cyan().bold(), summary.key.user.as_str()));
        output.push_str(&format!("{} {}\n", "Turns:".cyan().bold(), summary.turn_count));
        output.push_str(&format!("{} {}\n", "Created:".cyan().bold(), time(summary.created_at)));
        output.push_str(&format!(
            "{} {}\n",
            "Last activity:".cyan().bold(),
            time(summary.last_activity)
        ));
        output.push_str(&Self::footer());
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, response: &SynthesizedResponse) -> String {
        ConsoleFormatter::format(response)
    }

    fn format_json(&self, response: &SynthesizedResponse) -> String {
        ConsoleFormatter::format_json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crew_domain::{Capability, MemoField, SessionKey};

    fn section(capability: Capability, status: SectionStatus, body: &str) -> ReportSection {
        ReportSection {
            capability,
            title: capability.section_title().to_string(),
            source: Some("Code Standards Agent".to_string()),
            status,
            body: body.to_string(),
            citations: vec![],
        }
    }

    #[test]
    fn test_ungated_section_carries_warning() {
        colored::control::set_override(false);
        let response = SynthesizedResponse {
            executive_summary: vec!["A pipeline was written.".to_string()],
            sections: vec![section(
                Capability::CodeGeneration,
                SectionStatus::Ungated,
                "```python\nprint(1)\n```",
            )],
            gate: Some(GateOutcome::Ungated {
                missing: vec![MemoField::Who],
            }),
            ..Default::default()
        };

        let text = ConsoleFormatter::format(&response);
        assert!(text.contains(crew_domain::UNGATED_MARKER));
        assert!(text.contains("missing WHO"));
        assert!(text.contains("print(1)"));
    }

    #[test]
    fn test_code_in_knowledge_section_carries_warning_when_gated() {
        colored::control::set_override(false);
        let mut knowledge = section(
            Capability::KnowledgeRetrieval,
            SectionStatus::Ungated,
            "```sql\nSELECT DISTINCT id FROM orders\n```",
        );
        knowledge.source = Some("RAG Agent".to_string());
        let response = SynthesizedResponse {
            executive_summary: vec!["Code could not be reviewed.".to_string()],
            sections: vec![knowledge],
            gate: Some(GateOutcome::NoOutput),
            ..Default::default()
        };

        let text = ConsoleFormatter::format(&response);
        let marker = text.find(crew_domain::UNGATED_MARKER).unwrap();
        assert!(marker < text.find("SELECT DISTINCT").unwrap());
    }

    #[test]
    fn test_unavailable_section_shows_reason_only() {
        colored::control::set_override(false);
        let response = SynthesizedResponse {
            executive_summary: vec!["Partial answer.".to_string()],
            sections: vec![section(
                Capability::WebSearch,
                SectionStatus::Unavailable {
                    reason: "timed out after 120s".to_string(),
                },
                "",
            )],
            ..Default::default()
        };

        let text = ConsoleFormatter::format(&response);
        assert!(text.contains("Unavailable: timed out after 120s"));
    }

    #[test]
    fn test_format_sessions() {
        colored::control::set_override(false);
        let user = UserId::new("ana").unwrap();
        assert!(ConsoleFormatter::format_sessions(&user, &[]).contains("No sessions"));

        let sessions = vec![SessionId::new("ana_etl").unwrap()];
        let text = ConsoleFormatter::format_sessions(&user, &sessions);
        assert!(text.contains("(1)"));
        assert!(text.contains("ana_etl"));
    }

    #[test]
    fn test_format_summary() {
        colored::control::set_override(false);
        let key = SessionKey::new(
            UserId::new("ana").unwrap(),
            SessionId::new("ana_etl").unwrap(),
        );
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let summary = SessionSummary {
            key,
            created_at: at,
            last_activity: at,
            turn_count: 4,
        };
        let text = ConsoleFormatter::format_summary(&summary);
        assert!(text.contains("Turns: 4"));
        assert!(text.contains("2025-03-01 09:30:00 UTC"));
    }
}
