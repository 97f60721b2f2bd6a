mod email;
mod in_app;

use calendar_reminders_domain::{EventSummary, Locale, User};
use calendar_reminders_infra::TransportError;
pub use email::EmailChannel;
pub use in_app::InAppChannel;

/// The user a reminder is delivered to
#[derive(Debug, Clone)]
pub struct Recipient {
    pub user: User,
    pub locale: Locale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Nothing to deliver to, e.g. the recipient has no email address
    NoOp,
}

/// A medium reminders are delivered through
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(
        &self,
        summary: &EventSummary,
        raw_payload: &[u8],
        recipient: &Recipient,
    ) -> Result<Delivery, TransportError>;
}
