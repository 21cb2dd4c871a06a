use serde::{Deserialize, Serialize};

/// An email template as stored by the console.
///
/// `content` is HTML markup carrying `{{placeholder}}` tokens and is the only
/// field the merge pipeline scans for placeholders. The addressing fields are
/// passed through to previews untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub from_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_email: Option<String>,
    pub content: String,
}
