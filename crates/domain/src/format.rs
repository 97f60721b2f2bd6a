use crate::ical::{EventDate, VEvent};
use crate::locale::Locale;
use chrono::{Days, NaiveDateTime};

const RANGE_SEPARATOR: &str = " – ";

/// Human readable description of when an event takes place.
///
/// `end` is exclusive for all-day events, so an event on June 1st ends on June 2nd.
pub fn format_when(start: &EventDate, end: &EventDate, locale: Locale) -> String {
    if !start.has_time() {
        let last_day = inclusive_end(end);
        let start_day = start.local().date();
        return match last_day {
            Some(last_day) if last_day.date() > start_day => format!(
                "{}{}{}",
                locale.format_date(start.local()),
                RANGE_SEPARATOR,
                locale.format_date(last_day)
            ),
            _ => locale.format_date(start.local()),
        };
    }

    let start_tz = start.timezone_label();
    let end_tz = end.timezone_label();
    let start_local = start.local();
    let end_local = end.local();

    if start_tz != end_tz {
        return format!(
            "{}{}{}",
            with_label(locale.format_date_time(start_local), start_tz),
            RANGE_SEPARATOR,
            with_label(locale.format_date_time(end_local), end_tz)
        );
    }

    let range = if start_local.date() == end_local.date() {
        format!(
            "{}{}{}",
            locale.format_date_time(start_local),
            RANGE_SEPARATOR,
            locale.format_time(end_local)
        )
    } else {
        format!(
            "{}{}{}",
            locale.format_date_time(start_local),
            RANGE_SEPARATOR,
            locale.format_date_time(end_local)
        )
    };
    with_label(range, start_tz)
}

/// `format_when` for an event, deriving the end when `DTEND` is absent
pub fn format_event_when(event: &VEvent, locale: Locale) -> String {
    format_when(&event.start, &event.effective_end(), locale)
}

fn with_label(text: String, tz: Option<String>) -> String {
    match tz {
        Some(tz) => format!("{} ({})", text, tz),
        None => text,
    }
}

/// The last day covered by an exclusive all-day end
fn inclusive_end(end: &EventDate) -> Option<NaiveDateTime> {
    end.local().checked_sub_days(Days::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::parse_calendar_object;

    fn date(value: &str) -> EventDate {
        EventDate::parse(value, None, None).unwrap()
    }

    fn zoned(value: &str, tz: &str) -> EventDate {
        EventDate::parse(value, None, Some(tz)).unwrap()
    }

    #[test]
    fn all_day_single_day_is_date_only() {
        let when = format_when(&date("20240601"), &date("20240602"), Locale::EnUs);
        assert_eq!(when, "June 1, 2024");
    }

    #[test]
    fn all_day_multi_day_is_date_range() {
        let when = format_when(&date("20240601"), &date("20240604"), Locale::EnUs);
        assert_eq!(when, "June 1, 2024 – June 3, 2024");

        let when = format_when(&date("20240601"), &date("20240604"), Locale::De);
        assert_eq!(when, "1. Juni 2024 – 3. Juni 2024");
    }

    #[test]
    fn all_day_without_end_lasts_one_day() {
        let raw = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:x\r\nDTSTART;VALUE=DATE:20240601\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let event = parse_calendar_object(raw.as_bytes()).unwrap();
        assert_eq!(format_event_when(&event, Locale::EnUs), "June 1, 2024");
    }

    #[test]
    fn same_day_renders_end_time_only() {
        let when = format_when(
            &date("20240601T100000Z"),
            &date("20240601T110000Z"),
            Locale::EnUs,
        );
        assert_eq!(when, "Saturday, June 1, 2024 10:00 AM – 11:00 AM (UTC)");

        let when = format_when(
            &zoned("20240601T100000", "Europe/Berlin"),
            &zoned("20240601T113000", "Europe/Berlin"),
            Locale::De,
        );
        assert_eq!(when, "Samstag, 1. Juni 2024 10:00 – 11:30 (Europe/Berlin)");
    }

    #[test]
    fn different_days_render_both_sides() {
        let when = format_when(
            &date("20240601T220000"),
            &date("20240602T010000"),
            Locale::EnUs,
        );
        assert_eq!(when, "Saturday, June 1, 2024 10:00 PM – Sunday, June 2, 2024 1:00 AM");
    }

    #[test]
    fn different_zones_render_both_labels() {
        let when = format_when(
            &zoned("20240601T100000", "Europe/Berlin"),
            &zoned("20240601T120000", "America/New_York"),
            Locale::EnUs,
        );
        assert_eq!(
            when,
            "Saturday, June 1, 2024 10:00 AM (Europe/Berlin) – Saturday, June 1, 2024 12:00 PM (America/New_York)"
        );
    }

    #[test]
    fn zero_length_event() {
        let start = date("20240601T100000Z");
        assert_eq!(
            format_when(&start, &start, Locale::EnUs),
            "Saturday, June 1, 2024 10:00 AM – 10:00 AM (UTC)"
        );
    }
}
