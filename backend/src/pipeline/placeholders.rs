//! Placeholder tokens and the comparison key used to match them to columns.
//!
//! Templates mark substitution points with `{{name}}`. Whitespace inside the
//! braces is not significant, so `{{ name }}` and `{{name}}` are the same
//! placeholder.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

/// Matches one `{{ … }}` token. Capture 1 is the raw interior.
pub(crate) fn token_regex() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"))
}

/// Placeholder name carried by a raw token interior, if it names anything.
///
/// Stray braces are dropped (`{{{name}}` names `name`) and surrounding
/// whitespace is trimmed.
pub(crate) fn token_name(interior: &str) -> Option<String> {
    let name: String = interior.chars().filter(|c| *c != '{' && *c != '}').collect();
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Distinct placeholder names in `content`, in order of first appearance.
///
/// Empty tokens such as `{{ }}` are skipped; unterminated braces are plain text.
pub fn extract_placeholders(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut placeholders = Vec::new();

    for caps in token_regex().captures_iter(content) {
        if let Some(name) = token_name(&caps[1]) {
            if seen.insert(name.clone()) {
                placeholders.push(name);
            }
        }
    }

    placeholders
}

/// Comparison key for column titles and placeholder names: lower case, with
/// everything outside `[a-z0-9]` removed.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_first_occurrence_order_without_duplicates() {
        let content = "Hi {{name}}, code {{code}}. Bye {{name}} ({{ code }}) {{city}}";
        assert_eq!(extract_placeholders(content), vec!["name", "code", "city"]);
    }

    #[test]
    fn empty_and_plain_content_yield_nothing() {
        assert!(extract_placeholders("").is_empty());
        assert!(extract_placeholders("no placeholders").is_empty());
    }

    #[test]
    fn malformed_tokens_are_ignored() {
        assert!(extract_placeholders("{{}} {{ }} {{name").is_empty());
        assert_eq!(extract_placeholders("{{ first_name }}"), vec!["first_name"]);
    }

    #[test]
    fn stray_braces_are_stripped() {
        assert_eq!(extract_placeholders("{{{name}}}"), vec!["name"]);
    }

    #[test]
    fn normalize_ignores_case_and_punctuation() {
        assert_eq!(normalize("Email Address"), "emailaddress");
        assert_eq!(normalize("email_address"), "emailaddress");
        assert_eq!(normalize("EMAIL-ADDRESS"), "emailaddress");
        assert_eq!(normalize("Código 2"), "cdigo2");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["First Name", "__x__", "ÄÖü", "a1-B2 c3", ""] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }
}
