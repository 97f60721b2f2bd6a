use super::{ClaimedReminders, IReminderRepo};
use crate::repos::shared::repo::DeleteResult;
use calendar_reminders_domain::{AlarmType, Reminder, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    id: Uuid,
    uid: String,
    calendar_id: i64,
    object_uri: String,
    #[sqlx(rename = "type")]
    alarm_type: String,
    notification_date: i64,
    event_start_date: i64,
}

impl From<ReminderRaw> for Reminder {
    fn from(raw: ReminderRaw) -> Self {
        Self {
            id: raw.id.into(),
            user_id: raw.uid,
            calendar_id: raw.calendar_id,
            object_uri: raw.object_uri,
            alarm_type: AlarmType::from(raw.alarm_type),
            remind_at: raw.notification_date,
            event_start: raw.event_start_date,
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn upsert_triggers(
        &self,
        calendar_id: i64,
        object_uri: &str,
        reminders: &[Reminder],
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM calendar_reminders
            WHERE calendar_id = $1 AND object_uri = $2
            "#,
        )
        .bind(calendar_id)
        .bind(object_uri)
        .execute(&mut *tx)
        .await?;

        for reminder in reminders {
            sqlx::query(
                r#"
                INSERT INTO calendar_reminders
                (id, uid, calendar_id, object_uri, type, notification_date, event_start_date)
                VALUES($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(reminder.id.inner_ref())
            .bind(&reminder.user_id)
            .bind(reminder.calendar_id)
            .bind(&reminder.object_uri)
            .bind(reminder.alarm_type.as_str())
            .bind(reminder.remind_at)
            .bind(reminder.event_start)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_object(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM calendar_reminders
            WHERE calendar_id = $1 AND object_uri = $2
            ORDER BY notification_date
            "#,
        )
        .bind(calendar_id)
        .bind(object_uri)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders.into_iter().map(|r| r.into()).collect())
    }

    async fn delete_for_object(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<DeleteResult> {
        let res = sqlx::query(
            r#"
            DELETE FROM calendar_reminders
            WHERE calendar_id = $1 AND object_uri = $2
            "#,
        )
        .bind(calendar_id)
        .bind(object_uri)
        .execute(&self.pool)
        .await?;

        Ok(DeleteResult {
            deleted_count: res.rows_affected() as i64,
        })
    }

    async fn delete_for_calendar(&self, calendar_id: i64) -> anyhow::Result<DeleteResult> {
        let res = sqlx::query(
            r#"
            DELETE FROM calendar_reminders
            WHERE calendar_id = $1
            "#,
        )
        .bind(calendar_id)
        .execute(&self.pool)
        .await?;

        Ok(DeleteResult {
            deleted_count: res.rows_affected() as i64,
        })
    }

    async fn claim_due(&self, now: i64, lease_millis: i64) -> anyhow::Result<ClaimedReminders> {
        let mut tx = self.pool.begin().await?;

        let stale = sqlx::query(
            r#"
            DELETE FROM calendar_reminders
            WHERE event_start_date < $1
            "#,
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let due = sqlx::query_as::<_, ReminderRaw>(
            r#"
            UPDATE calendar_reminders
            SET claimed_until = $2
            WHERE id IN (
                SELECT id FROM calendar_reminders
                WHERE notification_date <= $1
                    AND event_start_date >= $1
                    AND (claimed_until IS NULL OR claimed_until < $1)
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(now.saturating_add(lease_millis))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ClaimedReminders {
            due: due.into_iter().map(|r| r.into()).collect(),
            stale_deleted: stale.rows_affected() as i64,
        })
    }

    async fn release_claim(&self, reminder_id: &ID) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE calendar_reminders
            SET claimed_until = NULL
            WHERE id = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, reminder_id: &ID) -> anyhow::Result<Option<Reminder>> {
        sqlx::query_as::<_, ReminderRaw>(
            r#"
            DELETE FROM calendar_reminders
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map(|raw| raw.map(|r| r.into()))
        .map_err(|e| {
            error!("Unable to delete reminder: {:?}. DB returned error: {:?}", reminder_id, e);
            anyhow::Error::new(e)
        })
    }
}
