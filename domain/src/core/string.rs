//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Keep at most `max_chars` characters, counting characters rather than bytes.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

/// Normalize text for duplicate detection.
///
/// Lowercases, drops markdown punctuation and collapses whitespace so that
/// "**Idempotent loads** matter." and "idempotent loads matter" compare equal.
pub fn normalize_for_comparison(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_space = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "ingeniería" has a two-byte 'í'
        assert_eq!(truncate("ingeniería de datos", 40), "ingeniería de datos");
        assert_eq!(truncate("ingeniería de datos", 12), "ingenier...");
        assert_eq!(truncate("ingeniería de datos", 13), "ingenierí...");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("ingeniería", 10), "ingeniería");
        assert_eq!(truncate_chars("ingeniería de datos", 10), "ingeniería...");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_normalize_ignores_markup_and_case() {
        assert_eq!(
            normalize_for_comparison("**Idempotent loads** matter."),
            normalize_for_comparison("- idempotent   loads matter")
        );
        assert_eq!(normalize_for_comparison("  A-b_c  "), "a b c");
    }
}
