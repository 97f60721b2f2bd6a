use super::{Delivery, NotificationChannel, Recipient};
use calendar_reminders_domain::{
    EventSummary, InAppNotification, REMINDER_APP, REMINDER_OBJECT_TYPE, REMINDER_SUBJECT,
};
use calendar_reminders_infra::{INotificationStore, TransportError};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Stores a notification for the recipient's notification center. It is
/// rendered into text when it is displayed, see `Notifier`.
pub struct InAppChannel {
    store: Arc<dyn INotificationStore>,
    /// Millis
    now: i64,
}

impl InAppChannel {
    pub fn new(store: Arc<dyn INotificationStore>, now: i64) -> Self {
        Self { store, now }
    }

    fn build_notification(&self, summary: &EventSummary, recipient: &Recipient) -> InAppNotification {
        let mut subject_params = Map::new();
        subject_params.insert("title".into(), json!(summary.title));
        subject_params.insert("start".into(), json!(summary.start));

        let mut message_params = Map::new();
        message_params.insert("when".into(), json!(summary.when));
        message_params.insert("description".into(), optional(&summary.description));
        message_params.insert("location".into(), optional(&summary.location));

        InAppNotification {
            app: REMINDER_APP.into(),
            user_id: recipient.user.uid.clone(),
            object_type: REMINDER_OBJECT_TYPE.into(),
            object_id: summary.uid.clone().unwrap_or_else(|| summary.title.clone()),
            subject: REMINDER_SUBJECT.into(),
            subject_params,
            message: REMINDER_SUBJECT.into(),
            message_params,
            created_at: self.now,
        }
    }
}

fn optional(value: &Option<String>) -> Value {
    match value {
        Some(v) => json!(v),
        None => Value::Null,
    }
}

#[async_trait::async_trait]
impl NotificationChannel for InAppChannel {
    async fn send(
        &self,
        summary: &EventSummary,
        _raw_payload: &[u8],
        recipient: &Recipient,
    ) -> Result<Delivery, TransportError> {
        let notification = self.build_notification(summary, recipient);
        self.store.notify(&notification).await?;
        Ok(Delivery::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_reminders_domain::{Locale, User};
    use calendar_reminders_infra::InMemoryNotificationStore;

    fn summary() -> EventSummary {
        EventSummary {
            uid: Some("standup-1".into()),
            title: "Standup".into(),
            description: Some("Daily sync".into()),
            location: None,
            url: None,
            status: None,
            start: 1_717_236_000_000,
            end: 1_717_239_600_000,
            all_day: false,
            when: "Saturday, June 1, 2024 10:00 AM – 11:00 AM (UTC)".into(),
            calendar_name: None,
        }
    }

    fn recipient() -> Recipient {
        Recipient {
            user: User::new("alice"),
            locale: Locale::EnUs,
        }
    }

    #[actix_web::test]
    async fn stores_keys_and_params_only() {
        let store = Arc::new(InMemoryNotificationStore::new());
        let channel = InAppChannel::new(store.clone(), 42);

        let res = channel.send(&summary(), b"", &recipient()).await;
        assert_eq!(res.unwrap(), Delivery::Delivered);

        let notifications = store.notifications();
        assert_eq!(notifications.len(), 1);
        let n = &notifications[0];
        assert_eq!(n.user_id, "alice");
        assert_eq!(n.app, REMINDER_APP);
        assert_eq!(n.object_id, "standup-1");
        assert_eq!(n.subject, REMINDER_SUBJECT);
        assert_eq!(n.subject_params["title"], "Standup");
        assert_eq!(n.subject_params["start"], 1_717_236_000_000i64);
        assert_eq!(
            n.message_params["when"],
            "Saturday, June 1, 2024 10:00 AM – 11:00 AM (UTC)"
        );
        assert_eq!(n.message_params["description"], "Daily sync");
        assert_eq!(n.message_params["location"], Value::Null);
        assert_eq!(n.created_at, 42);
    }

    #[actix_web::test]
    async fn store_failure_is_reported() {
        let store = Arc::new(InMemoryNotificationStore::new());
        store.set_failing(true);
        let channel = InAppChannel::new(store.clone(), 42);
        assert!(channel.send(&summary(), b"", &recipient()).await.is_err());
    }
}
