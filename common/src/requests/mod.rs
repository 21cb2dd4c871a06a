use crate::model::place_holder::FieldMapping;
use serde::Deserialize;

/// Selects a template and an uploaded dataset, plus any manual column choices
/// made for placeholders the automatic mapping missed or got wrong.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    pub template_id: String,
    pub dataset_id: String,
    #[serde(default)]
    pub assignments: FieldMapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub merge: MergeRequest,
    #[serde(default)]
    pub row: usize,
    /// Wrap the sanitized content in a standalone HTML document.
    #[serde(default)]
    pub document: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartMergeRequest {
    #[serde(flatten)]
    pub merge: MergeRequest,
    pub service_id: String,
    #[serde(default)]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestSendRequest {
    #[serde(flatten)]
    pub merge: MergeRequest,
    pub service_id: String,
    #[serde(default)]
    pub row: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSort {
    #[default]
    Date,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query string of `GET /api/logs`. Without `all`, only the last 24 hours are
/// listed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogQuery {
    pub template_id: Option<String>,
    pub sort: LogSort,
    pub order: SortOrder,
    /// Single UTC day, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub all: bool,
}

/// Query string of `GET /api/contacts` and its CSV export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactQuery {
    /// Case-insensitive match on email address, name or template name.
    pub search: Option<String>,
    /// Single UTC day, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub order: SortOrder,
}
