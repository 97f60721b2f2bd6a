use crate::format::format_event_when;
use crate::ical::VEvent;
use crate::locale::Locale;
use chrono_tz::Tz;

/// Value used by calendar clients for an empty field
const PLACEHOLDER: &str = "--";

/// Channel independent description of an event, computed from the calendar
/// data each time a reminder is dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    pub uid: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
    /// Millis
    pub start: i64,
    /// Millis
    pub end: i64,
    pub all_day: bool,
    /// Human readable description of when the event takes place
    pub when: String,
    pub calendar_name: Option<String>,
}

impl EventSummary {
    pub fn new(
        event: &VEvent,
        locale: Locale,
        floating_tz: Tz,
        calendar_name: Option<String>,
    ) -> Self {
        Self {
            uid: non_empty(event.uid.as_deref()),
            title: non_empty(event.summary.as_deref()).unwrap_or_default(),
            description: non_empty(event.description.as_deref()),
            location: non_empty(event.location.as_deref()),
            url: non_empty(event.url.as_deref()),
            status: non_empty(event.status.as_deref()),
            start: event.start.timestamp_millis(floating_tz),
            end: event.effective_end().timestamp_millis(floating_tz),
            all_day: event.is_all_day(),
            when: format_event_when(event, locale),
            calendar_name: non_empty(calendar_name.as_deref()),
        }
    }

    /// Name for the attached calendar file
    pub fn file_name(&self) -> String {
        match &self.uid {
            Some(uid) => {
                let stem = uid
                    .chars()
                    .map(|c| match c {
                        '/' | '\\' | ':' | '"' | '\'' | '\r' | '\n' => '_',
                        c => c,
                    })
                    .collect::<String>();
                format!("{}.ics", stem)
            }
            None => "event.ics".into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("CANCELLED"))
            .unwrap_or(false)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && *v != PLACEHOLDER)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::parse_calendar_object;
    use chrono::prelude::*;
    use crate::locale::Locale;
    use chrono_tz::UTC;

    #[test]
    fn summarizes_event() {
        let raw = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:abc/123\r\nSUMMARY:Dentist\r\nDESCRIPTION:--\r\nLOCATION: \r\nURL:https://example.com/e\r\nDTSTART:20240601T100000Z\r\nDURATION:PT30M\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let event = parse_calendar_object(raw.as_bytes()).unwrap();
        let summary = EventSummary::new(&event, Locale::EnUs, UTC, Some("Personal".into()));

        assert_eq!(summary.title, "Dentist");
        assert_eq!(summary.description, None);
        assert_eq!(summary.location, None);
        assert_eq!(summary.url.as_deref(), Some("https://example.com/e"));
        assert_eq!(
            summary.start,
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap().timestamp_millis()
        );
        assert_eq!(summary.end - summary.start, 30 * 60 * 1000);
        assert!(!summary.all_day);
        assert_eq!(summary.when, "Saturday, June 1, 2024 10:00 AM – 10:30 AM (UTC)");
        assert_eq!(summary.calendar_name.as_deref(), Some("Personal"));
        assert_eq!(summary.file_name(), "abc_123.ics");
        assert!(!summary.is_cancelled());
    }
}
