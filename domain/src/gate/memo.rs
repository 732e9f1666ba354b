//! Decision memo parsing

use serde::{Deserialize, Serialize};

/// One of the five questions a Decision Memo must answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoField {
    What,
    Why,
    Who,
    Where,
    When,
}

impl MemoField {
    pub const ALL: [MemoField; 5] = [
        MemoField::What,
        MemoField::Why,
        MemoField::Who,
        MemoField::Where,
        MemoField::When,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MemoField::What => "WHAT",
            MemoField::Why => "WHY",
            MemoField::Who => "WHO",
            MemoField::Where => "WHERE",
            MemoField::When => "WHEN",
        }
    }

    fn index(&self) -> usize {
        match self {
            MemoField::What => 0,
            MemoField::Why => 1,
            MemoField::Who => 2,
            MemoField::Where => 3,
            MemoField::When => 4,
        }
    }
}

/// WHAT / WHY / WHO / WHERE / WHEN justification of a code change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMemo {
    pub what: String,
    pub why: String,
    pub who: String,
    pub r#where: String,
    pub when: String,
}

impl DecisionMemo {
    pub fn field(&self, field: MemoField) -> &str {
        match field {
            MemoField::What => &self.what,
            MemoField::Why => &self.why,
            MemoField::Who => &self.who,
            MemoField::Where => &self.r#where,
            MemoField::When => &self.when,
        }
    }
}

/// Result of checking an agent's output for a memo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateCheck {
    Satisfied(DecisionMemo),
    Missing(Vec<MemoField>),
}

impl GateCheck {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, GateCheck::Satisfied(_))
    }

    pub fn missing(&self) -> &[MemoField] {
        match self {
            GateCheck::Satisfied(_) => &[],
            GateCheck::Missing(fields) => fields,
        }
    }
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Strip list bullets, heading hashes, emphasis and table pipes from the
/// start of a line.
fn strip_leading_markup(line: &str) -> &str {
    let mut rest = line.trim_start();
    loop {
        let before = rest;
        rest = rest.trim_start_matches(['#', '*', '_', '-', '>', '|', '+', '•']);
        // Numbered list items: "1. " / "2) "
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 && rest[digits..].starts_with(['.', ')']) {
            rest = &rest[digits + 1..];
        }
        rest = rest.trim_start();
        if rest == before {
            return rest;
        }
    }
}

/// Match a memo label at the start of `line`, returning the field and the
/// text after the label's separator.
///
/// A label counts only when followed by a separator (`:`, `-`, `–`, `—`,
/// `|`) or by nothing, so prose such as "When the job runs..." is ignored.
fn parse_label(line: &str) -> Option<(MemoField, &str)> {
    let stripped = strip_leading_markup(line);
    let upper_len = stripped
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(stripped.len());
    let word = &stripped[..upper_len];
    let field = MemoField::ALL
        .into_iter()
        .find(|f| word.eq_ignore_ascii_case(f.label()))?;

    let after = stripped[upper_len..].trim_start_matches(['*', '_']).trim_start();
    if after.is_empty() {
        return Some((field, ""));
    }
    let mut chars = after.chars();
    match chars.next() {
        Some(':' | '-' | '–' | '—' | '|') => {
            let value = chars
                .as_str()
                .trim_start_matches(['*', '_', ':'])
                .trim()
                .trim_end_matches('|')
                .trim();
            Some((field, value))
        }
        _ => None,
    }
}

/// Check that `content` opens with a complete Decision Memo.
///
/// Only text before the first fenced code block is considered, so a memo
/// that follows the code does not satisfy the gate. A label with an empty
/// value takes the next non-label line as its answer (heading style).
pub fn check_memo(content: &str) -> GateCheck {
    let mut values: [Option<String>; 5] = Default::default();
    let mut awaiting: Option<MemoField> = None;

    for line in content.lines() {
        if is_fence(line) {
            break;
        }
        if let Some((field, value)) = parse_label(line) {
            awaiting = None;
            if value.is_empty() {
                awaiting = Some(field);
            } else {
                values[field.index()].get_or_insert_with(|| value.to_string());
            }
            continue;
        }
        if let Some(field) = awaiting {
            let text = line.trim();
            if !text.is_empty() {
                values[field.index()].get_or_insert_with(|| text.to_string());
                awaiting = None;
            }
        }
    }

    let missing: Vec<MemoField> = MemoField::ALL
        .into_iter()
        .filter(|f| values[f.index()].is_none())
        .collect();
    if !missing.is_empty() {
        return GateCheck::Missing(missing);
    }

    let [what, why, who, r#where, when] = values.map(Option::unwrap_or_default);
    GateCheck::Satisfied(DecisionMemo {
        what,
        why,
        who,
        r#where,
        when,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOLD_MEMO: &str = "## Decision Memo\n\
        **WHAT:** Add a dedup step to the orders pipeline\n\
        **WHY:** Upstream retries produce duplicate events\n\
        **WHO:** Data platform team\n\
        **WHERE:** `orders_silver` job\n\
        **WHEN:** Next sprint, before the backfill\n\
        \n\
        ```python\ndef dedupe(df):\n    return df.drop_duplicates()\n```\n";

    #[test]
    fn test_bold_memo_before_code_passes() {
        let GateCheck::Satisfied(memo) = check_memo(BOLD_MEMO) else {
            panic!("memo should be recognised");
        };
        assert_eq!(memo.what, "Add a dedup step to the orders pipeline");
        assert_eq!(memo.field(MemoField::Where), "`orders_silver` job");
    }

    #[test]
    fn test_bullet_and_heading_styles() {
        let content = "- **What**: dedupe records\n\
            - Why - duplicates break revenue metrics\n\
            ### WHO\n\
            Analytics engineering\n\
            1. WHERE: dbt model stg_orders\n\
            | WHEN | this week |\n";
        let GateCheck::Satisfied(memo) = check_memo(content) else {
            panic!("all styles should parse");
        };
        assert_eq!(memo.who, "Analytics engineering");
        assert_eq!(memo.r#where, "dbt model stg_orders");
        assert_eq!(memo.when, "this week");
    }

    #[test]
    fn test_code_without_memo_fails() {
        let check = check_memo("Here you go:\n```python\nprint('hi')\n```");
        assert_eq!(check.missing(), MemoField::ALL);
        assert!(!check.is_satisfied());
    }

    #[test]
    fn test_memo_after_code_does_not_count() {
        let content = "```sql\nselect 1\n```\nWHAT: x\nWHY: y\nWHO: z\nWHERE: w\nWHEN: v\n";
        assert!(!check_memo(content).is_satisfied());
    }

    #[test]
    fn test_partial_memo_reports_missing_fields() {
        let content = "WHAT: x\nWHY: y\nWHERE: w\n```\ncode\n```";
        assert_eq!(
            check_memo(content).missing(),
            [MemoField::Who, MemoField::When]
        );
    }

    #[test]
    fn test_prose_starting_with_label_word_is_ignored() {
        let content = "When the job runs it reads everything.\nWhat happens next is unclear.";
        assert_eq!(check_memo(content).missing().len(), 5);
    }

    #[test]
    fn test_longer_words_do_not_match_labels() {
        let content = "WHATEVER: x\nWHOM: y";
        assert_eq!(check_memo(content).missing().len(), 5);
    }
}
