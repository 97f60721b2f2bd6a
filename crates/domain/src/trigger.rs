use crate::ical::{parse_calendar_object, MalformedEventError, VEvent};
use crate::reminder::{AlarmType, Reminder};
use crate::shared::entity::ID;
use chrono_tz::Tz;
use tracing::debug;

/// Identifies the calendar object the triggers are extracted for
#[derive(Debug, Clone, Copy)]
pub struct ObjectRef<'a> {
    pub calendar_id: i64,
    pub object_uri: &'a str,
}

/// Computes one `Reminder` per recipient for every alarm of the event that has
/// a recognized action and a computable trigger instant.
///
/// Recurrence is resolved by whoever supplies the calendar data, so only the
/// master event's alarms are considered.
pub fn extract_triggers(
    event: &VEvent,
    object: ObjectRef,
    recipients: &[String],
    floating_tz: Tz,
) -> Vec<Reminder> {
    let event_start = event.start.timestamp_millis(floating_tz);

    let mut reminders = Vec::new();
    for alarm in &event.alarms {
        let alarm_type = match alarm.action.as_deref().map(AlarmType::from) {
            Some(alarm_type) if alarm_type.is_recognized() => alarm_type,
            other => {
                debug!("Ignoring alarm with unrecognized action: {:?}", other);
                continue;
            }
        };
        let remind_at = match alarm.effective_trigger(event, floating_tz) {
            Some(at) => at.timestamp_millis(),
            None => {
                debug!("Ignoring {} alarm without a computable trigger", alarm_type);
                continue;
            }
        };

        for user_id in recipients {
            reminders.push(Reminder {
                id: ID::default(),
                user_id: user_id.clone(),
                calendar_id: object.calendar_id,
                object_uri: object.object_uri.to_string(),
                alarm_type: alarm_type.clone(),
                remind_at,
                event_start,
            });
        }
    }

    reminders
}

/// Parses raw calendar data and extracts its triggers
pub fn extract_triggers_from_payload(
    raw: &[u8],
    object: ObjectRef,
    recipients: &[String],
    floating_tz: Tz,
) -> Result<Vec<Reminder>, MalformedEventError> {
    let event = parse_calendar_object(raw)?;
    Ok(extract_triggers(&event, object, recipients, floating_tz))
}
