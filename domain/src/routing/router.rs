//! Rule-based router.
//!
//! Queries are matched against keyword signals in English and Spanish after
//! normalization (lowercase, punctuation stripped). Single words match whole
//! tokens; phrases match token sequences.
//!
//! | Intent | Capability | Example |
//! |--------|------------|---------|
//! | fresh external facts | web-search | "latest Spark release notes" |
//! | validated reference material | knowledge-retrieval | "what is a data vault?" |
//! | write / modify / review code | code-generation (+ gate) | "write a function to dedupe rows" |
//!
//! A query matching nothing inherits the capabilities of the previous turn
//! when it reads as a follow-up ("and the code?"), otherwise it falls back
//! to knowledge retrieval.

use super::decision::RoutingDecision;
use crate::capability::entities::{AgentDescriptor, Capability, CapabilitySet};
use crate::core::string::normalize_for_comparison;
use crate::session::entities::Turn;
use std::collections::HashMap;

const FRESH_SIGNALS: &[&str] = &[
    "latest", "current", "currently", "recent", "recently", "newest", "new version",
    "new release", "release notes", "changelog", "today", "this year", "news", "up to date",
    "deprecated", "pricing", "roadmap", "official docs", "official documentation",
    "documentation", "docs", "2024", "2025", "2026", "último", "última", "ultimo", "ultima",
    "actual", "actualmente", "reciente", "novedades", "hoy", "documentación", "documentacion",
];

const KNOWLEDGE_SIGNALS: &[&str] = &[
    "what is", "what are", "explain", "concept", "definition", "define", "best practice",
    "best practices", "pattern", "patterns", "architecture", "difference between", "compare",
    "how does", "how do", "principle", "principles", "theory", "book", "books", "modeling",
    "modelling", "kimball", "data vault", "star schema", "qué es", "que es", "qué son",
    "explica", "explícame", "concepto", "buenas prácticas", "patrón", "patrones",
    "arquitectura", "diferencia entre", "cómo funciona", "como funciona", "libro", "libros",
];

const CODE_ACTIONS: &[&str] = &[
    "write", "implement", "create", "build", "generate", "refactor", "fix", "debug",
    "optimize", "rewrite", "modify", "review", "escribe", "implementa", "crea", "genera",
    "refactoriza", "corrige", "optimiza", "reescribe", "modifica", "revisa",
];

const CODE_OBJECTS: &[&str] = &[
    "function", "functions", "code", "script", "class", "method", "module", "program",
    "snippet", "query", "sql", "udf", "dag", "test", "tests", "unit test", "código",
    "codigo", "función", "funcion", "clase", "método", "consulta", "prueba", "pruebas",
];

const CODE_PHRASES: &[&str] = &[
    "code review", "pull request", "stack trace", "traceback", "code snippet",
    "revisión de código", "revision de codigo",
];

const FOLLOW_UP_SIGNALS: &[&str] = &[
    "it", "that", "this", "those", "above", "previous", "earlier", "again", "also", "more",
    "the code", "and", "eso", "esto", "anterior", "lo anterior", "el código", "también",
    "tambien", "más", "mas", "otra vez",
];

/// Tokenized, normalized view of a query
struct Normalized {
    padded: String,
}

impl Normalized {
    fn new(text: &str) -> Self {
        Self {
            padded: format!(" {} ", normalize_for_comparison(text)),
        }
    }

    fn contains(&self, signal: &str) -> bool {
        let needle = format!(" {} ", normalize_for_comparison(signal));
        self.padded.contains(&needle)
    }

    fn matches<'a>(&self, signals: &[&'a str]) -> Vec<&'a str> {
        signals.iter().copied().filter(|s| self.contains(s)).collect()
    }
}

/// Classifies queries into a [`RoutingDecision`]
#[derive(Debug, Clone, Default)]
pub struct Router {
    /// Agent name -> capability, to recover what contributed to past turns
    agent_capabilities: HashMap<String, Capability>,
}

impl Router {
    pub fn new(descriptors: &[AgentDescriptor]) -> Self {
        Self {
            agent_capabilities: descriptors
                .iter()
                .map(|d| (d.name.clone(), d.capability))
                .collect(),
        }
    }

    /// Decide which capabilities `query` needs.
    ///
    /// `recent` is the bounded window of prior turns, oldest first.
    pub fn route(&self, query: &str, recent: &[Turn]) -> RoutingDecision {
        let normalized = Normalized::new(query);
        let mut selected = CapabilitySet::new();
        let mut signals = Vec::new();

        let fresh = normalized.matches(FRESH_SIGNALS);
        if !fresh.is_empty() {
            selected.insert(Capability::WebSearch);
            signals.extend(fresh.iter().map(|s| format!("web:{}", s)));
        }

        let knowledge = normalized.matches(KNOWLEDGE_SIGNALS);
        if !knowledge.is_empty() {
            selected.insert(Capability::KnowledgeRetrieval);
            signals.extend(knowledge.iter().map(|s| format!("knowledge:{}", s)));
        }

        if let Some(signal) = Self::code_signal(query, &normalized) {
            selected.insert(Capability::CodeGeneration);
            signals.push(format!("code:{}", signal));
        }

        if selected.is_empty()
            && let Some(inherited) = self.inherit(&normalized, recent)
        {
            signals.push("follow-up".to_string());
            selected = inherited;
        }

        RoutingDecision::new(selected).with_signals(signals)
    }

    fn code_signal(raw: &str, normalized: &Normalized) -> Option<String> {
        if raw.contains("```") {
            return Some("code block".to_string());
        }
        if let Some(phrase) = normalized.matches(CODE_PHRASES).first() {
            return Some((*phrase).to_string());
        }
        let actions = normalized.matches(CODE_ACTIONS);
        let objects = normalized.matches(CODE_OBJECTS);
        match (actions.first(), objects.first()) {
            (Some(action), Some(object)) => Some(format!("{} {}", action, object)),
            _ => None,
        }
    }

    fn inherit(&self, normalized: &Normalized, recent: &[Turn]) -> Option<CapabilitySet> {
        if normalized.matches(FOLLOW_UP_SIGNALS).is_empty() {
            return None;
        }
        let last = recent.last()?;
        let inherited: CapabilitySet = last
            .contributing_agents
            .iter()
            .filter_map(|name| {
                self.agent_capabilities
                    .get(name)
                    .copied()
                    .or_else(|| name.parse().ok())
            })
            .collect();
        (!inherited.is_empty()).then_some(inherited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::entities::NewTurn;

    fn router() -> Router {
        Router::new(&[
            AgentDescriptor::new("Web Agent", Capability::WebSearch),
            AgentDescriptor::new("RAG Agent", Capability::KnowledgeRetrieval),
            AgentDescriptor::new("Code Standards Agent", Capability::CodeGeneration),
        ])
    }

    fn turn_by(agents: &[&str]) -> Turn {
        NewTurn::new(
            "previous",
            "answer",
            agents.iter().map(|a| a.to_string()).collect(),
        )
        .seal(0, None)
    }

    #[test]
    fn test_definition_question_goes_to_knowledge_base() {
        let decision = router().route("What is a data pipeline?", &[]);
        assert!(decision.selects(Capability::KnowledgeRetrieval));
        assert!(!decision.selects(Capability::WebSearch));
        assert!(!decision.requires_decision_memo());
        assert!(!decision.is_fallback());
    }

    #[test]
    fn test_fresh_facts_add_web_search() {
        let decision = router().route("What is the latest version of Apache Iceberg?", &[]);
        assert!(decision.selects(Capability::WebSearch));
        assert!(decision.selects(Capability::KnowledgeRetrieval));
    }

    #[test]
    fn test_code_request_sets_gate() {
        let decision = router().route("Write a function to deduplicate records", &[]);
        assert!(decision.selects(Capability::CodeGeneration));
        assert!(decision.requires_decision_memo());
        assert!(decision.signals().iter().any(|s| s == "code:write function"));
    }

    #[test]
    fn test_spanish_code_request() {
        let decision = router().route("Escribe una función en PySpark para deduplicar", &[]);
        assert!(decision.selects(Capability::CodeGeneration));
        assert!(decision.requires_decision_memo());
    }

    #[test]
    fn test_pasted_code_is_a_review_request() {
        let decision = router().route("Any problems here?\n```sql\nSELECT * FROM t\n```", &[]);
        assert!(decision.selects(Capability::CodeGeneration));
    }

    #[test]
    fn test_window_function_question_is_not_code() {
        let decision = router().route("Explain how a window function works", &[]);
        assert!(decision.selects(Capability::KnowledgeRetrieval));
        assert!(!decision.selects(Capability::CodeGeneration));
    }

    #[test]
    fn test_multiple_capabilities() {
        let decision = router().route(
            "Check the latest dbt docs and write a macro script for snapshots",
            &[],
        );
        assert!(decision.selects(Capability::WebSearch));
        assert!(decision.selects(Capability::CodeGeneration));
        assert!(decision.requires_decision_memo());
    }

    #[test]
    fn test_unclassified_query_falls_back() {
        let decision = router().route("Hmm, interesting", &[]);
        assert!(decision.is_fallback());
        assert!(decision.selects(Capability::KnowledgeRetrieval));
    }

    #[test]
    fn test_follow_up_inherits_previous_capabilities() {
        let history = vec![turn_by(&["Code Standards Agent"])];
        let decision = router().route("and in Scala, please?", &history);
        assert!(decision.selects(Capability::CodeGeneration));
        assert!(decision.requires_decision_memo());
        assert!(!decision.is_fallback());
    }

    #[test]
    fn test_follow_up_without_history_falls_back() {
        let decision = router().route("and in Scala, please?", &[]);
        assert!(decision.is_fallback());
    }

    #[test]
    fn test_follow_up_accepts_capability_tags_as_names() {
        let history = vec![turn_by(&["web-search"])];
        let decision = Router::default().route("tell me more", &history);
        assert!(decision.selects(Capability::WebSearch));
    }
}
