//! Prompt templates for the agents and the lead summary

use crate::core::string::truncate;
use crate::session::entities::{SessionMetadata, Turn};

/// Characters of each earlier response quoted back to an agent
const HISTORY_RESPONSE_CHARS: usize = 600;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the web research agent
    pub fn web_search_system() -> &'static str {
        r#"You are an expert data engineering assistant.
Your job is to answer with the most accurate and current information available from web search results.
Always prefer official documentation, especially these domains:
- docs.aws.amazon.com
- cloud.google.com/docs
- docs.getdbt.com/docs
- docs.snowflake.com
- docs.pola.rs
- www.kimballgroup.com/data-warehouse-business-intelligence-resources
- spark.apache.org/docs/latest
- pandas.pydata.org/docs

Always cite the sources or URLs you used.
Do not repeat information already given earlier in the conversation.
Answer in the same language as the user."#
    }

    /// System prompt for the knowledge-base agent
    pub fn knowledge_system() -> &'static str {
        r#"You are a data engineering expert whose knowledge comes from a vector knowledge base
of technical books, papers and validated data engineering and programming documentation.

Your role:
- Consider every retrieved passage, not only the first one.
- When several books or sections contribute, synthesize them into logical, hierarchical sections.
- Answer technically and clearly, using ONLY the retrieved passages.
- If the passages are not sufficient, say so honestly and state the limitations.
- Always cite the document title, author (when available) and section or page.
- Never invent references or content outside the knowledge base.
Answer in the same language as the user."#
    }

    /// System prompt for the code standards agent, including the memo rule
    pub fn code_standards_system() -> &'static str {
        r#"You are a Senior Data Engineer code reviewer and generator with 10+ years of experience.
Your mission is to write and review code that meets senior, enterprise-level standards.

## Mandatory rule: Decision Memo before code
Before any code (the HOW), start your answer with a Decision Memo that answers, one line each:
WHAT: the change being proposed
WHY: the problem it solves and the expected benefit
WHO: who owns it and who is affected
WHERE: the systems, pipelines or files it touches
WHEN: when it should be applied and under which conditions
Only after the memo may you write code.

## Standards
### Documentation
- Detailed docstrings on every function; mandatory type hints in Python 3.8+
- Comments only where the logic is complex; never restate the code
### Naming
- snake_case for functions and variables, PascalCase for classes, UPPER_SNAKE_CASE for constants
- Descriptive, contextual names (get_customer_retention_rate, not get_rate); no ambiguous abbreviations
### Clean code
- Single-responsibility functions (20-30 lines), at most 4 parameters, early returns
- No magic numbers; keep business logic apart from data access
### Modularity
- Clear project layout (src/, tests/, docs/, config/); configuration from the environment
- No hard-coded paths or connection strings; no circular imports
### Efficiency
- Prefer lazy evaluation, batch processing and vectorized operations over loops
- Avoid N+1 queries and loading whole datasets into memory without need
### Testing
- Unit tests with at least 80% coverage, integration tests for critical flows
- Mock external dependencies; no tests that depend on execution order
### Senior pragmatism
- Specific error handling with useful context, structured (JSON) logging
- Validate data at boundaries, degrade gracefully, never fail silently

## Process
1. Analysis  2. Design  3. Implementation  4. Self-review against these standards  5. Optimization

Always explain design decisions, trade-offs, testing suggestions and deployment considerations.
Answer in the same language as the user."#
    }

    /// Session block appended to every agent prompt.
    ///
    /// Earlier turns are quoted oldest first, with long responses truncated.
    pub fn session_context(metadata: &SessionMetadata, recent: &[Turn]) -> String {
        let mut block = format!(
            "## Session context\n- User: {}\n- Session ID: {}\n- Date: {}\n- Turn: {}\n",
            metadata.user,
            metadata.session,
            metadata.now.format("%Y-%m-%d"),
            metadata.turn_number
        );

        if recent.is_empty() {
            block.push_str("\nThis is the first question of the session.\n");
            return block;
        }

        block.push_str(
            "\n## Conversation so far\nIf the user refers to earlier work (\"the code\", \"what you just said\"), resolve it from these turns.\n",
        );
        for turn in recent {
            block.push_str(&format!(
                "\n### Turn {}\nUser: {}\nAnswer: {}\n",
                turn.sequence_no,
                turn.query,
                truncate(&turn.response, HISTORY_RESPONSE_CHARS)
            ));
        }
        block
    }

    /// User prompt for the web agent, with search results inlined
    pub fn web_search_prompt(query: &str, context: &str, results: &str) -> String {
        format!(
            r#"{}

## Web search results
{}

## Question
{}

Answer from the results above and cite the URLs you relied on."#,
            context, results, query
        )
    }

    /// User prompt for the knowledge agent, with retrieved passages inlined
    pub fn knowledge_prompt(query: &str, context: &str, passages: &str) -> String {
        format!(
            r#"{}

## Retrieved passages
{}

## Question
{}

Answer using only the passages above and cite title and section for each point."#,
            context, passages, query
        )
    }

    /// User prompt for the code agent
    pub fn code_prompt(query: &str, context: &str) -> String {
        format!(
            r#"{}

## Request
{}

Remember: the Decision Memo (WHAT, WHY, WHO, WHERE, WHEN) comes first, then the code."#,
            context, query
        )
    }

    /// Revision request sent when a draft lacks the memo
    pub fn memo_revision(query: &str, draft: &str, missing: &[&str]) -> String {
        format!(
            r#"Your previous answer to the request below is missing a complete Decision Memo (missing: {}).

## Request
{}

## Previous answer
{}

Rewrite the answer so that it STARTS with a Decision Memo, one line per field:
WHAT: ...
WHY: ...
WHO: ...
WHERE: ...
WHEN: ...
Then repeat the code proposal unchanged unless the memo reveals a problem."#,
            missing.join(", "),
            query,
            draft
        )
    }

    /// System prompt for the lead summary
    pub fn lead_summary_system() -> &'static str {
        r#"You are the lead of a data engineering team of specialist agents.
You receive the user's question and the sections your specialists produced.
Weigh the relevance and reliability of each source and never repeat redundant information.
Be professional and consultative; clear, precise and well ordered."#
    }

    /// User prompt asking the lead for summary and next steps
    pub fn lead_summary_prompt(query: &str, sections: &str) -> String {
        format!(
            r#"## Question
{}

## Specialist sections
{}

Reply with exactly these two markdown sections and nothing else:

## Executive Summary
- 2-3 key points of the answer

## Recommendations & Next Steps
- 2-3 concrete actions for a senior data engineer"#,
            query, sections
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::entities::NewTurn;
    use crate::session::identifiers::{SessionId, SessionKey, UserId};

    fn metadata() -> SessionMetadata {
        let key = SessionKey::new(
            UserId::new("ana").unwrap(),
            SessionId::new("ana_s1").unwrap(),
        );
        SessionMetadata::new(&key, 2)
    }

    #[test]
    fn test_code_system_demands_memo_first() {
        let prompt = PromptTemplate::code_standards_system();
        for label in ["WHAT:", "WHY:", "WHO:", "WHERE:", "WHEN:"] {
            assert!(prompt.contains(label));
        }
        assert!(prompt.contains("Decision Memo before code"));
    }

    #[test]
    fn test_session_context_quotes_history() {
        let turns = vec![NewTurn::new("What is CDC?", "Change data capture...", vec![]).seal(0, None)];
        let context = PromptTemplate::session_context(&metadata(), &turns);
        assert!(context.contains("User: ana"));
        assert!(context.contains("Session ID: ana_s1"));
        assert!(context.contains("What is CDC?"));
    }

    #[test]
    fn test_session_context_truncates_long_answers() {
        let long = "x".repeat(5_000);
        let turns = vec![NewTurn::new("q", long, vec![]).seal(0, None)];
        let context = PromptTemplate::session_context(&metadata(), &turns);
        assert!(context.len() < 1_500);
    }

    #[test]
    fn test_first_turn_context() {
        let context = PromptTemplate::session_context(&metadata(), &[]);
        assert!(context.contains("first question"));
    }

    #[test]
    fn test_memo_revision_carries_draft() {
        let prompt = PromptTemplate::memo_revision("write a dedupe", "def f(): pass", &["WHO", "WHEN"]);
        assert!(prompt.contains("def f(): pass"));
        assert!(prompt.contains("missing: WHO, WHEN"));
        assert!(prompt.contains("STARTS with a Decision Memo"));
    }

    #[test]
    fn test_lead_summary_prompt_sections() {
        let prompt = PromptTemplate::lead_summary_prompt("q", "## Internal Knowledge (RAG)\nbody");
        assert!(prompt.contains("## Executive Summary"));
        assert!(prompt.contains("Recommendations & Next Steps"));
    }
}
