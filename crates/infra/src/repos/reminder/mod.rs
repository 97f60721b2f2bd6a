mod inmemory;
mod postgres;

use crate::repos::shared::repo::DeleteResult;
use calendar_reminders_domain::{Reminder, ID};
pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;

/// Result of claiming due reminders
#[derive(Debug, Default)]
pub struct ClaimedReminders {
    /// Reminders that are due and now claimed by the caller
    pub due: Vec<Reminder>,
    /// Number of reminders deleted because their event has already started
    pub stale_deleted: i64,
}

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    /// Replaces every reminder of the calendar object with `reminders` in one transaction
    async fn upsert_triggers(
        &self,
        calendar_id: i64,
        object_uri: &str,
        reminders: &[Reminder],
    ) -> anyhow::Result<()>;
    async fn find_by_object(&self, calendar_id: i64, object_uri: &str)
        -> anyhow::Result<Vec<Reminder>>;
    async fn delete_for_object(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<DeleteResult>;
    async fn delete_for_calendar(&self, calendar_id: i64) -> anyhow::Result<DeleteResult>;
    /// Claims reminders with `remind_at <= now <= event_start` that are not
    /// claimed by someone else, until `now + lease_millis`. Reminders whose
    /// event has started are deleted in the same transaction.
    async fn claim_due(&self, now: i64, lease_millis: i64) -> anyhow::Result<ClaimedReminders>;
    /// Makes a claimed reminder available to the next claim
    async fn release_claim(&self, reminder_id: &ID) -> anyhow::Result<()>;
    async fn delete(&self, reminder_id: &ID) -> anyhow::Result<Option<Reminder>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_reminders_domain::AlarmType;

    const MINUTE: i64 = 1000 * 60;

    fn reminder(user_id: &str, object_uri: &str, remind_at: i64, event_start: i64) -> Reminder {
        Reminder {
            id: Default::default(),
            user_id: user_id.into(),
            calendar_id: 1,
            object_uri: object_uri.into(),
            alarm_type: AlarmType::Display,
            remind_at,
            event_start,
        }
    }

    fn repo() -> InMemoryReminderRepo {
        InMemoryReminderRepo::new()
    }

    #[tokio::test]
    async fn upsert_replaces_previous_rows() {
        let repo = repo();
        let first = vec![
            reminder("alice", "a.ics", 10, 20),
            reminder("bob", "a.ics", 10, 20),
        ];
        let second = vec![reminder("alice", "a.ics", 15, 20)];
        let other = vec![reminder("alice", "b.ics", 10, 20)];

        repo.upsert_triggers(1, "a.ics", &first).await.unwrap();
        repo.upsert_triggers(1, "b.ics", &other).await.unwrap();
        repo.upsert_triggers(1, "a.ics", &second).await.unwrap();
        repo.upsert_triggers(1, "a.ics", &second).await.unwrap();

        let rows = repo.find_by_object(1, "a.ics").await.unwrap();
        assert_eq!(rows, second);
        assert_eq!(repo.find_by_object(1, "b.ics").await.unwrap(), other);
    }

    #[tokio::test]
    async fn deletes_by_object_and_calendar() {
        let repo = repo();
        let mut in_other_calendar = reminder("alice", "a.ics", 10, 20);
        in_other_calendar.calendar_id = 2;
        repo.upsert_triggers(1, "a.ics", &[reminder("alice", "a.ics", 10, 20)])
            .await
            .unwrap();
        repo.upsert_triggers(1, "b.ics", &[reminder("alice", "b.ics", 10, 20)])
            .await
            .unwrap();
        repo.upsert_triggers(2, "a.ics", &[in_other_calendar])
            .await
            .unwrap();

        let res = repo.delete_for_object(1, "a.ics").await.unwrap();
        assert_eq!(res.deleted_count, 1);
        let res = repo.delete_for_calendar(1).await.unwrap();
        assert_eq!(res.deleted_count, 1);
        assert_eq!(repo.find_by_object(2, "a.ics").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn claims_only_due_rows_once() {
        let repo = repo();
        let now = 100 * MINUTE;
        let due = reminder("alice", "a.ics", now - MINUTE, now + 10 * MINUTE);
        let not_yet = reminder("alice", "b.ics", now + MINUTE, now + 10 * MINUTE);
        let stale = reminder("alice", "c.ics", now - 20 * MINUTE, now - MINUTE);
        repo.upsert_triggers(1, "a.ics", &[due.clone()]).await.unwrap();
        repo.upsert_triggers(1, "b.ics", &[not_yet]).await.unwrap();
        repo.upsert_triggers(1, "c.ics", &[stale]).await.unwrap();

        let claimed = repo.claim_due(now, 5 * MINUTE).await.unwrap();
        assert_eq!(claimed.due, vec![due.clone()]);
        assert_eq!(claimed.stale_deleted, 1);
        assert!(repo.find_by_object(1, "c.ics").await.unwrap().is_empty());

        // A concurrent or later scan within the lease does not see it
        let claimed = repo.claim_due(now + MINUTE, 5 * MINUTE).await.unwrap();
        assert!(claimed.due.is_empty());

        // Released claims are handed out again
        repo.release_claim(&due.id).await.unwrap();
        let claimed = repo.claim_due(now + MINUTE, 5 * MINUTE).await.unwrap();
        assert_eq!(claimed.due.len(), 1);

        // And so are expired ones
        let claimed = repo.claim_due(now + 7 * MINUTE, 5 * MINUTE).await.unwrap();
        assert_eq!(claimed.due.len(), 1);

        assert_eq!(repo.delete(&due.id).await.unwrap(), Some(due));
        let claimed = repo.claim_due(now + 20 * MINUTE, 5 * MINUTE).await.unwrap();
        assert!(claimed.due.is_empty());
    }

    #[tokio::test]
    async fn claims_at_the_end_of_time() {
        let repo = repo();
        let far = i64::MAX - MINUTE;
        repo.upsert_triggers(1, "a.ics", &[reminder("alice", "a.ics", far, i64::MAX)])
            .await
            .unwrap();

        let claimed = repo.claim_due(i64::MAX, 5 * MINUTE).await.unwrap();
        assert_eq!(claimed.due.len(), 1);
        let claimed = repo.claim_due(i64::MAX, 5 * MINUTE).await.unwrap();
        assert!(claimed.due.is_empty());
    }

    #[tokio::test]
    async fn event_starting_now_is_still_due() {
        let repo = repo();
        let now = 100 * MINUTE;
        repo.upsert_triggers(1, "a.ics", &[reminder("alice", "a.ics", now - MINUTE, now)])
            .await
            .unwrap();
        let claimed = repo.claim_due(now, MINUTE).await.unwrap();
        assert_eq!(claimed.due.len(), 1);
        assert_eq!(claimed.stale_deleted, 0);
    }
}
