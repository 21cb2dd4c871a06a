use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder name to the text substituted for it.
pub type Parameters = BTreeMap<String, String>;

/// A single addressee of a bulk send, built from one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub email_address: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: Parameters,
}

/// Per-recipient result of a send run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub email_address: String,
    /// Recipient display name, kept for the delivery log and contacts.
    #[serde(default)]
    pub name: String,
    pub success: bool,
    pub message: String,
}

impl DispatchOutcome {
    pub fn sent(email_address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            name: String::new(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(email_address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            name: String::new(),
            success: false,
            message: message.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Body POSTed to the external send endpoint.
///
/// Batch sends carry parameters on each recipient and leave `parameters` unset;
/// single test sends share one `parameters` object across all recipients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub user_key: String,
    pub service_id: String,
    pub template_id: String,
    pub recipients: Vec<Recipient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// Result entry reported by the send endpoint for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientResult {
    pub email: String,
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Body returned by the send endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RecipientResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Final state of a bulk run as exposed to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// `true` only when every batch was attempted and answered.
    pub completed: bool,
    /// Run-level error that stopped the run early, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchSummary {
    /// Human readable one-liner, e.g. "Sent to 42 of 50 recipients".
    pub fn headline(&self) -> String {
        format!("Sent to {} of {} recipients", self.succeeded, self.total)
    }
}
