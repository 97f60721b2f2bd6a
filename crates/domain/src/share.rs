use serde::{Deserialize, Serialize};

const USER_PRINCIPAL_PREFIX: &str = "principals/users/";
const GROUP_PRINCIPAL_PREFIX: &str = "principals/groups/";

/// The owner or sharee of a calendar
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    User(String),
    Group(String),
    Other(String),
}

impl Principal {
    pub fn parse(uri: &str) -> Self {
        let uri = uri.trim().trim_end_matches('/');
        if let Some(uid) = uri.strip_prefix(USER_PRINCIPAL_PREFIX) {
            if !uid.is_empty() {
                return Self::User(uid.to_string());
            }
        }
        if let Some(gid) = uri.strip_prefix(GROUP_PRINCIPAL_PREFIX) {
            if !gid.is_empty() {
                return Self::Group(gid.to_string());
            }
        }
        Self::Other(uri.to_string())
    }
}

/// A share of a calendar as reported by the calendar backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    /// e.g. `principals/users/alice` or `principals/groups/admins`
    pub principal: String,
    #[serde(default)]
    pub read_only: bool,
}

impl Share {
    pub fn principal(&self) -> Principal {
        Principal::parse(&self.principal)
    }
}

/// Users to remind, kept unique in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn add(&mut self, uid: &str) {
        if uid.is_empty() || self.0.iter().any(|r| r == uid) {
            return;
        }
        self.0.push(uid.to_string());
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, uids: I) {
        for uid in uids {
            self.add(&uid);
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}
