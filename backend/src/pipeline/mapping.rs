//! Automatic placeholder-to-column mapping and recipient identity lookup.

use crate::pipeline::placeholders::normalize;
use common::model::datasource::{cell_to_string, Row};
use common::model::place_holder::FieldMapping;

/// Column titles tried, in order, for the recipient address.
pub const EMAIL_COLUMNS: [&str; 4] = ["email", "email_address", "Email", "EMAIL"];

/// Column titles tried, in order, for the recipient display name.
pub const NAME_COLUMNS: [&str; 5] = ["name", "Name", "NAME", "full_name", "recipient_name"];

/// Display name used when a row has no usable name column.
pub const DEFAULT_RECIPIENT_NAME: &str = "Recipient";

/// Maps each placeholder to a column, first match wins.
///
/// A column whose normalized title equals the placeholder's is preferred;
/// otherwise the first column (in `columns` order) whose normalized title
/// contains the placeholder's, or is contained by it, is taken. An empty
/// normalized name is contained by every other, so a punctuation-only column
/// early in `columns` wins containment for every placeholder. Placeholders
/// with no match are left out of the result.
pub fn auto_map(placeholders: &[String], columns: &[String]) -> FieldMapping {
    let normalized: Vec<(&String, String)> = columns.iter().map(|c| (c, normalize(c))).collect();
    let mut mapping = FieldMapping::new();

    for placeholder in placeholders {
        let key = normalize(placeholder);

        let exact = normalized.iter().find(|(_, n)| *n == key);
        let matched = exact.or_else(|| {
            normalized
                .iter()
                .find(|(_, n)| n.contains(&key) || key.contains(n.as_str()))
        });

        if let Some((column, _)) = matched {
            mapping.insert(placeholder.clone(), (*column).clone());
        }
    }

    mapping
}

/// First candidate title present among `columns`.
pub fn identity_column(columns: &[String], candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| columns.iter().any(|c| c.as_str() == **candidate))
        .map(|c| c.to_string())
}

/// Recipient address of a row: the first candidate column with a non-empty value.
pub fn email_from_row(row: &Row) -> String {
    first_non_empty(row, &EMAIL_COLUMNS).unwrap_or_default()
}

/// Recipient name of a row, falling back to [`DEFAULT_RECIPIENT_NAME`].
pub fn name_from_row(row: &Row) -> String {
    first_non_empty(row, &NAME_COLUMNS).unwrap_or_else(|| DEFAULT_RECIPIENT_NAME.to_string())
}

fn first_non_empty(row: &Row, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| cell_to_string(row.get(*c)))
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_beats_containment() {
        let mapping = auto_map(&strings(&["name"]), &strings(&["Full Name", "NAME"]));
        assert_eq!(mapping.get("name").map(String::as_str), Some("NAME"));
    }

    #[test]
    fn containment_takes_first_column_in_order() {
        let mapping = auto_map(
            &strings(&["name"]),
            &strings(&["Company Name", "First Name"]),
        );
        assert_eq!(mapping.get("name").map(String::as_str), Some("Company Name"));
    }

    #[test]
    fn containment_works_in_both_directions() {
        let mapping = auto_map(&strings(&["customer_email"]), &strings(&["Email"]));
        assert_eq!(mapping.get("customer_email").map(String::as_str), Some("Email"));
    }

    #[test]
    fn unmatched_placeholders_are_omitted() {
        let mapping = auto_map(&strings(&["code", "zip"]), &strings(&["Code", "Email"]));
        assert_eq!(mapping.len(), 1);
        assert!(!mapping.contains_key("zip"));
    }

    #[test]
    fn never_maps_to_an_absent_column_and_is_deterministic() {
        let placeholders = strings(&["name", "code", "email", "x"]);
        let columns = strings(&["Name", "Code", "Email", "Mixed_Code"]);
        let first = auto_map(&placeholders, &columns);
        for column in first.values() {
            assert!(columns.contains(column));
        }
        assert_eq!(first, auto_map(&placeholders, &columns));
    }

    #[test]
    fn punctuation_only_column_wins_containment_when_first() {
        let mapping = auto_map(&strings(&["code"]), &strings(&["#", "Code_x"]));
        assert_eq!(mapping.get("code").map(String::as_str), Some("#"));

        let mapping = auto_map(&strings(&["code"]), &strings(&["Code", "#"]));
        assert_eq!(mapping.get("code").map(String::as_str), Some("Code"));
    }

    #[test]
    fn punctuation_only_placeholder_takes_the_first_column() {
        let mapping = auto_map(&strings(&["--"]), &strings(&["Name", "Code"]));
        assert_eq!(mapping.get("--").map(String::as_str), Some("Name"));
        assert!(auto_map(&strings(&["--"]), &[]).is_empty());
    }

    #[test]
    fn identity_columns_follow_priority_lists() {
        let columns = strings(&["Name", "Code", "Email"]);
        assert_eq!(identity_column(&columns, &EMAIL_COLUMNS).as_deref(), Some("Email"));
        assert_eq!(identity_column(&columns, &NAME_COLUMNS).as_deref(), Some("Name"));
        assert_eq!(identity_column(&strings(&["Phone"]), &EMAIL_COLUMNS), None);
    }

    #[test]
    fn identity_values_skip_empty_cells() {
        let mut row = Row::new();
        row.insert("email".into(), json!(""));
        row.insert("EMAIL".into(), json!("b@x.com"));
        assert_eq!(email_from_row(&row), "b@x.com");
        assert_eq!(name_from_row(&row), DEFAULT_RECIPIENT_NAME);

        row.insert("full_name".into(), json!("Bea"));
        assert_eq!(name_from_row(&row), "Bea");
    }
}
