use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One data row of an uploaded spreadsheet, keyed by column title.
pub type Row = HashMap<String, Value>;

/// A parsed recipient spreadsheet.
///
/// Every row carries exactly the columns listed in `headers`. Cells keep the
/// scalar type they arrived with and are only turned into text when a template
/// is rendered or a send request is built, see [`cell_to_string`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularDataset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl TabularDataset {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn summary(&self, dataset_id: &str) -> DatasetSummary {
        DatasetSummary {
            dataset_id: dataset_id.to_string(),
            headers: self.headers.clone(),
            row_count: self.rows.len(),
        }
    }
}

/// What the console shows after an upload: the columns and how many rows came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset_id: String,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Text form of a cell. `null` (and a missing cell) becomes the empty string.
pub fn cell_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}
