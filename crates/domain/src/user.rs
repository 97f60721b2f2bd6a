use serde::{Deserialize, Serialize};

/// A user as known by the user directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        let uid = uid.into();
        Self {
            display_name: uid.clone(),
            uid,
            email: None,
        }
    }

    /// The email address if one is on file
    pub fn email_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
    }
}
