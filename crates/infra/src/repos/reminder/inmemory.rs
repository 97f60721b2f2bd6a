use super::{ClaimedReminders, IReminderRepo};
use crate::repos::shared::{inmemory_repo::*, repo::DeleteResult};
use calendar_reminders_domain::{Entity, Reminder, ID};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct ReminderRow {
    reminder: Reminder,
    claimed_until: Option<i64>,
}

impl Entity for ReminderRow {
    fn id(&self) -> &ID {
        &self.reminder.id
    }
}

impl ReminderRow {
    fn is_claimable(&self, now: i64) -> bool {
        self.reminder.is_due(now) && self.claimed_until.map(|until| until < now).unwrap_or(true)
    }
}

pub struct InMemoryReminderRepo {
    reminders: Mutex<Vec<ReminderRow>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryReminderRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn upsert_triggers(
        &self,
        calendar_id: i64,
        object_uri: &str,
        reminders: &[Reminder],
    ) -> anyhow::Result<()> {
        // Holding the lock for both steps keeps the replace atomic
        let mut rows = self
            .reminders
            .lock()
            .map_err(|_| anyhow::anyhow!("Reminder store lock is poisoned"))?;
        rows.retain(|row| !row.reminder.belongs_to(calendar_id, object_uri));
        rows.extend(reminders.iter().map(|reminder| ReminderRow {
            reminder: reminder.clone(),
            claimed_until: None,
        }));
        Ok(())
    }

    async fn find_by_object(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<Vec<Reminder>> {
        Ok(find_by(&self.reminders, |row| {
            row.reminder.belongs_to(calendar_id, object_uri)
        })
        .into_iter()
        .map(|row| row.reminder)
        .collect())
    }

    async fn delete_for_object(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<DeleteResult> {
        Ok(delete_by(&self.reminders, |row| {
            row.reminder.belongs_to(calendar_id, object_uri)
        }))
    }

    async fn delete_for_calendar(&self, calendar_id: i64) -> anyhow::Result<DeleteResult> {
        Ok(delete_by(&self.reminders, |row| {
            row.reminder.calendar_id == calendar_id
        }))
    }

    async fn claim_due(&self, now: i64, lease_millis: i64) -> anyhow::Result<ClaimedReminders> {
        let stale = delete_by(&self.reminders, |row| row.reminder.is_stale(now));
        let due = update_many(
            &self.reminders,
            |row| row.is_claimable(now),
            |row| row.claimed_until = Some(now.saturating_add(lease_millis)),
        );
        Ok(ClaimedReminders {
            due: due.into_iter().map(|row| row.reminder).collect(),
            stale_deleted: stale.deleted_count,
        })
    }

    async fn release_claim(&self, reminder_id: &ID) -> anyhow::Result<()> {
        update_many(
            &self.reminders,
            |row| row.id() == reminder_id,
            |row| row.claimed_until = None,
        );
        Ok(())
    }

    async fn delete(&self, reminder_id: &ID) -> anyhow::Result<Option<Reminder>> {
        Ok(delete(reminder_id, &self.reminders).map(|row| row.reminder))
    }
}
