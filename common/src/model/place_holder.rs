use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder name to spreadsheet column title.
///
/// Partial by nature: placeholders nothing matched are simply absent.
pub type FieldMapping = BTreeMap<String, String>;

/// Result of mapping a template onto a dataset, as returned to the console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    /// Placeholders in first-occurrence order.
    pub placeholders: Vec<String>,
    pub mapping: FieldMapping,
    /// Placeholders left without a column. Rendered as empty text.
    pub unmapped: Vec<String>,
    pub email_column: Option<String>,
    pub name_column: Option<String>,
}

impl MappingReport {
    pub fn is_complete(&self) -> bool {
        self.unmapped.is_empty()
    }
}
