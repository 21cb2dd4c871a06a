//! Per-recipient template rendering and HTML sanitization.
//!
//! Template content is admin-authored but rendered once per recipient with
//! spreadsheet data spliced in, so every rendered preview goes through the
//! sanitizer. Nothing is cleaned at storage time.

use crate::pipeline::placeholders::{token_name, token_regex};
use ammonia::Builder;
use common::model::datasource::{cell_to_string, Row};
use common::model::merge::Parameters;
use common::model::place_holder::FieldMapping;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Attributes kept on every element so templates keep their look.
const STYLING_ATTRIBUTES: [&str; 13] = [
    "style",
    "class",
    "id",
    "align",
    "valign",
    "width",
    "height",
    "bgcolor",
    "border",
    "cellpadding",
    "cellspacing",
    "color",
    "dir",
];

static DOCUMENT_RE: OnceLock<Regex> = OnceLock::new();

fn document_regex() -> &'static Regex {
    DOCUMENT_RE.get_or_init(|| {
        Regex::new(r"(?i)<(!doctype|html|body)[\s>]").expect("document pattern is valid")
    })
}

/// Replaces every `{{placeholder}}` with the mapped cell of `row`.
///
/// One pass over the content; substituted text is never scanned again.
/// Unmapped placeholders and empty cells become the empty string.
pub fn substitute(content: &str, row: &Row, mapping: &FieldMapping) -> String {
    token_regex()
        .replace_all(content, |caps: &Captures| {
            token_name(&caps[1])
                .and_then(|name| mapping.get(&name))
                .map(|column| cell_to_string(row.get(column)))
                .unwrap_or_default()
        })
        .into_owned()
}

/// Substitutes `row` into `content` and sanitizes the result for display.
pub fn render(content: &str, row: &Row, mapping: &FieldMapping) -> String {
    sanitize_html(&substitute(content, row, mapping))
}

/// Text value for each mapped placeholder, as sent to the send endpoint.
pub fn build_parameters(row: &Row, mapping: &FieldMapping) -> Parameters {
    mapping
        .iter()
        .map(|(placeholder, column)| (placeholder.clone(), cell_to_string(row.get(column))))
        .collect()
}

fn sanitizer() -> Builder<'static> {
    let mut builder = Builder::default();
    builder
        .rm_clean_content_tags(&["style"])
        .add_clean_content_tags(&["title"])
        .add_tags(&["style", "center", "font"])
        .add_generic_attributes(&STYLING_ATTRIBUTES)
        .add_generic_attribute_prefixes(&["data-"]);
    builder
}

fn clean_fragment(html: &str) -> String {
    sanitizer().clean(html).to_string()
}

/// Whether `html` is a whole document rather than a fragment.
pub fn is_document(html: &str) -> bool {
    document_regex().is_match(html)
}

/// Strips executable content while keeping styling.
///
/// Scripts, event handler attributes and `javascript:` URLs are removed.
/// `<style>` blocks and `style`/`class`/`id`/`data-*` attributes survive.
/// A whole document comes back as a whole document.
pub fn sanitize_html(html: &str) -> String {
    let cleaned = clean_fragment(html);
    if is_document(html) {
        format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
            cleaned
        )
    } else {
        cleaned
    }
}

/// Standalone page used to show a rendered email in an isolated frame.
pub fn preview_document(content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<style>
body {{ margin: 0; padding: 20px; font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
img {{ max-width: 100%; height: auto; }}
table {{ border-collapse: collapse; width: 100%; }}
td, th {{ padding: 8px; }}
</style>
</head>
<body>
{}
</body>
</html>"#,
        clean_fragment(content)
    )
}
