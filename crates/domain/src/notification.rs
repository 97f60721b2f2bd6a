use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Application id used for in-app notifications
pub const REMINDER_APP: &str = "calendar_reminders";
pub const REMINDER_OBJECT_TYPE: &str = "calendar_reminder";
pub const REMINDER_SUBJECT: &str = "calendar_reminder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mailbox {
    pub address: String,
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(address: impl Into<String>, name: Option<String>) -> Self {
        Self {
            address: address.into(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachments: Vec<Attachment>,
}

/// A notification stored for later rendering in the user's notification center.
///
/// Only keys and parameters are stored, the text is produced when the
/// notification is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InAppNotification {
    pub app: String,
    pub user_id: String,
    pub object_type: String,
    pub object_id: String,
    pub subject: String,
    pub subject_params: Map<String, Value>,
    pub message: String,
    pub message_params: Map<String, Value>,
    /// Millis
    pub created_at: i64,
}
