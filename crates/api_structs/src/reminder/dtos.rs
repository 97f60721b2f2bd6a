use calendar_reminders_domain::{AlarmType, Reminder, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDTO {
    pub id: ID,
    pub user_id: String,
    pub calendar_id: i64,
    pub object_uri: String,
    pub alarm_type: AlarmType,
    pub remind_at: i64,
    pub event_start: i64,
}

impl ReminderDTO {
    pub fn new(reminder: Reminder) -> Self {
        Self {
            id: reminder.id,
            user_id: reminder.user_id,
            calendar_id: reminder.calendar_id,
            object_uri: reminder.object_uri,
            alarm_type: reminder.alarm_type,
            remind_at: reminder.remind_at,
            event_start: reminder.event_start,
        }
    }
}

/// Counts of what happened to the reminders claimed by a scan
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanReportDTO {
    pub now: i64,
    pub claimed: usize,
    pub sent: usize,
    pub stale: usize,
    pub undeliverable: usize,
    pub skipped: usize,
    pub failed: usize,
}
