mod inmemory;
mod platform;

use calendar_reminders_domain::{EmailMessage, InAppNotification, User};
pub use inmemory::{
    InMemoryCalendarBackend, InMemoryGroupResolver, InMemoryMailer, InMemoryNotificationStore,
    InMemoryUserDirectory,
};
pub use platform::PlatformClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Calendar metadata as known by the calendar backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarInfo {
    pub id: i64,
    pub display_name: Option<String>,
    /// e.g. `principals/users/alice`. Calendars without an owner principal
    /// do not get reminders.
    pub principal_uri: Option<String>,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to the delivery service failed: {0}")]
    Request(String),
    #[error("Delivery service responded with status {0}")]
    Status(u16),
    #[error("Delivery was rejected for: {}", .0.join(", "))]
    Rejected(Vec<String>),
}

/// Storage of calendar objects
#[async_trait::async_trait]
pub trait ICalendarBackend: Send + Sync {
    /// The raw calendar data of an object, `None` if it does not exist anymore
    async fn get_raw_payload(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<Option<Vec<u8>>>;
    async fn get_calendar(&self, calendar_id: i64) -> anyhow::Result<Option<CalendarInfo>>;
}

#[async_trait::async_trait]
pub trait IGroupResolver: Send + Sync {
    /// Current members of a group, `None` if the group is unknown
    async fn get_group_members(&self, group_id: &str) -> anyhow::Result<Option<Vec<String>>>;
}

#[async_trait::async_trait]
pub trait IUserDirectory: Send + Sync {
    async fn get_user(&self, uid: &str) -> anyhow::Result<Option<User>>;
    async fn get_preferred_locale(&self, uid: &str) -> anyhow::Result<Option<String>>;
}

/// Outbound mail transport
#[async_trait::async_trait]
pub trait IMailer: Send + Sync {
    /// Returns the recipients the message could not be delivered to
    async fn send(&self, message: &EmailMessage) -> Result<Vec<String>, TransportError>;
}

#[async_trait::async_trait]
pub trait INotificationStore: Send + Sync {
    async fn notify(&self, notification: &InAppNotification) -> Result<(), TransportError>;
}

/// The collaborators reminders depend on
#[derive(Clone)]
pub struct Services {
    pub calendars: Arc<dyn ICalendarBackend>,
    pub groups: Arc<dyn IGroupResolver>,
    pub users: Arc<dyn IUserDirectory>,
    pub mailer: Arc<dyn IMailer>,
    pub notifications: Arc<dyn INotificationStore>,
}

impl Services {
    pub fn create_platform(client: PlatformClient) -> Self {
        let client = Arc::new(client);
        Self {
            calendars: client.clone(),
            groups: client.clone(),
            users: client.clone(),
            mailer: client.clone(),
            notifications: client,
        }
    }

    pub fn create_inmemory() -> Self {
        Self {
            calendars: Arc::new(InMemoryCalendarBackend::new()),
            groups: Arc::new(InMemoryGroupResolver::new()),
            users: Arc::new(InMemoryUserDirectory::new()),
            mailer: Arc::new(InMemoryMailer::new()),
            notifications: Arc::new(InMemoryNotificationStore::new()),
        }
    }
}
