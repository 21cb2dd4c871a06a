use serde::{Deserialize, Serialize};

/// One delivery log row. Written once per dispatch outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub log_id: String,
    pub created_at: String,
    pub status: String,
    pub template_id: String,
    /// Name of the template when listed; "Unknown Template" once it is deleted.
    pub template_name: String,
    pub service_id: String,
    pub email_address: String,
    /// Recipient name taken from the uploaded row, empty when there was none.
    pub name: String,
    pub message: String,
}

/// A recipient that was sent an email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub log_id: String,
    pub sent_at: String,
    pub email_address: String,
    pub name: String,
    pub template_name: String,
}
