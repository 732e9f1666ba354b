//! Progress reporting for coordinator cycles

use colored::Colorize;
use crew_application::CycleProgressNotifier;
use crew_domain::{AgentDescriptor, MemoField, RoutingDecision};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

fn routed_summary(decision: &RoutingDecision) -> String {
    let names = decision
        .capabilities()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if decision.is_fallback() {
        format!("{} (no clear intent, default route)", names)
    } else {
        names
    }
}

fn missing_labels(missing: &[MemoField]) -> String {
    missing
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reports cycle progress with a bar over the dispatched agents
pub struct CycleProgressReporter {
    multi: MultiProgress,
    dispatch_bar: Mutex<Option<ProgressBar>>,
}

impl CycleProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            dispatch_bar: Mutex::new(None),
        }
    }

    fn dispatch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn note(&self, line: String) {
        // Suspended so the line is not overdrawn by an active bar
        self.multi.suspend(|| eprintln!("{}", line));
    }
}

impl Default for CycleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleProgressNotifier for CycleProgressReporter {
    fn on_routed(&self, decision: &RoutingDecision) {
        self.note(format!(
            "{} {} {}",
            "->".cyan(),
            "Routing:".bold(),
            routed_summary(decision)
        ));
    }

    fn on_dispatch_start(&self, agents: &[AgentDescriptor]) {
        let pb = self.multi.add(ProgressBar::new(agents.len() as u64));
        pb.set_style(Self::dispatch_style());
        pb.set_prefix("Agents");
        pb.set_message(
            agents
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut slot) = self.dispatch_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_agent_complete(&self, agent: &AgentDescriptor, success: bool) {
        let Ok(mut slot) = self.dispatch_bar.lock() else {
            return;
        };
        let Some(pb) = slot.as_ref() else {
            return;
        };

        let status = if success {
            format!("{} {}", "v".green(), agent.name)
        } else {
            format!("{} {}", "x".red(), agent.name)
        };
        pb.inc(1);
        if pb.position() >= pb.length().unwrap_or(0) {
            pb.finish_and_clear();
            *slot = None;
            drop(slot);
            self.note(format!("  {}", status));
        } else {
            pb.set_message(status);
        }
    }

    fn on_gate_revision(&self, missing: &[MemoField]) {
        self.note(format!(
            "{} Decision Memo incomplete (missing {}), asking for a revision",
            "!".yellow(),
            missing_labels(missing)
        ));
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl CycleProgressNotifier for SimpleProgress {
    fn on_routed(&self, decision: &RoutingDecision) {
        eprintln!("{} Routing: {}", "->".cyan(), routed_summary(decision));
    }

    fn on_dispatch_start(&self, agents: &[AgentDescriptor]) {
        eprintln!("{} Dispatching {} agent(s)", "->".cyan(), agents.len());
    }

    fn on_agent_complete(&self, agent: &AgentDescriptor, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), agent.name);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), agent.name);
        }
    }

    fn on_gate_revision(&self, missing: &[MemoField]) {
        eprintln!(
            "  {} Decision Memo incomplete (missing {}), revising",
            "!".yellow(),
            missing_labels(missing)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_domain::{AgentDescriptor, Capability, Router};

    #[test]
    fn test_routed_summary_marks_fallback() {
        let router = Router::new(&[
            AgentDescriptor::new("RAG Agent", Capability::KnowledgeRetrieval),
            AgentDescriptor::new("Web Agent", Capability::WebSearch),
        ]);
        let decision = router.route("hello there", &[]);
        assert!(decision.is_fallback());
        assert!(routed_summary(&decision).contains("default route"));
    }

    #[test]
    fn test_missing_labels() {
        assert_eq!(missing_labels(&[MemoField::Who, MemoField::When]), "WHO, WHEN");
    }
}
