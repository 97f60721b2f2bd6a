use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The `ACTION` of an alarm. Values read back from storage that are not
/// recognized are kept as `Other` so they can be tolerated at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlarmType {
    Audio,
    Email,
    Display,
    Other(String),
}

impl AlarmType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Audio => "AUDIO",
            Self::Email => "EMAIL",
            Self::Display => "DISPLAY",
            Self::Other(other) => other,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for AlarmType {
    fn from(action: &str) -> Self {
        match action.trim().to_uppercase().as_str() {
            "AUDIO" => Self::Audio,
            "EMAIL" => Self::Email,
            "DISPLAY" => Self::Display,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for AlarmType {
    fn from(action: String) -> Self {
        Self::from(action.as_str())
    }
}

impl From<AlarmType> for String {
    fn from(alarm_type: AlarmType) -> Self {
        alarm_type.as_str().to_string()
    }
}

impl Display for AlarmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `Reminder` is a pending alarm trigger for one recipient of a calendar object.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    /// The user that should be reminded
    pub user_id: String,
    pub calendar_id: i64,
    pub object_uri: String,
    pub alarm_type: AlarmType,
    /// The timestamp in millis at which the user should be notified
    pub remind_at: i64,
    /// The start of the event in millis. Reminders for events that have
    /// started are never sent.
    pub event_start: i64,
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Reminder {
    pub fn is_due(&self, now: i64) -> bool {
        self.remind_at <= now && !self.is_stale(now)
    }

    pub fn is_stale(&self, now: i64) -> bool {
        self.event_start < now
    }

    pub fn belongs_to(&self, calendar_id: i64, object_uri: &str) -> bool {
        self.calendar_id == calendar_id && self.object_uri == object_uri
    }
}

/// A claimed due `Reminder` joined with what is needed to dispatch it
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub calendar_display_name: Option<String>,
    /// Raw calendar data of the object, `None` if the object no longer exists
    pub calendar_data: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(remind_at: i64, event_start: i64) -> Reminder {
        Reminder {
            id: Default::default(),
            user_id: "alice".into(),
            calendar_id: 1,
            object_uri: "event.ics".into(),
            alarm_type: AlarmType::Display,
            remind_at,
            event_start,
        }
    }

    #[test]
    fn due_only_between_trigger_and_start() {
        let r = reminder(100, 200);
        assert!(!r.is_due(99));
        assert!(r.is_due(100));
        assert!(r.is_due(200));
        assert!(!r.is_due(201));
        assert!(r.is_stale(201));
    }

    #[test]
    fn parses_alarm_types() {
        assert_eq!(AlarmType::from("email"), AlarmType::Email);
        assert_eq!(AlarmType::from(" Display "), AlarmType::Display);
        assert_eq!(AlarmType::from("AUDIO"), AlarmType::Audio);
        let procedure = AlarmType::from("procedure");
        assert_eq!(procedure, AlarmType::Other("PROCEDURE".into()));
        assert!(!procedure.is_recognized());
        assert_eq!(procedure.as_str(), "PROCEDURE");
    }
}
