use super::duration::IcalDuration;
use chrono::{prelude::*, Days, Duration, LocalResult};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

/// A `DTSTART` / `DTEND` value as found in a calendar object
#[derive(Debug, Clone, PartialEq)]
pub enum EventDate {
    /// `VALUE=DATE`, an all-day value without time of day
    Date(NaiveDate),
    /// Wall-clock time without a zone, interpreted in the viewer's zone
    Floating(NaiveDateTime),
    Utc(DateTime<Utc>),
    /// Wall-clock time qualified by a `TZID`
    Zoned { local: NaiveDateTime, tz: Tz },
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid date value: `{0}`")]
pub struct InvalidDateError(pub String);

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

impl EventDate {
    /// Parses a date or date-time property value given its `VALUE` and `TZID` parameters
    pub fn parse(
        value: &str,
        value_type: Option<&str>,
        tzid: Option<&str>,
    ) -> Result<Self, InvalidDateError> {
        let value = value.trim();
        let invalid = || InvalidDateError(value.to_string());

        let is_date = match value_type {
            Some(t) => t.eq_ignore_ascii_case("DATE"),
            None => value.len() == 8,
        };
        if is_date {
            return NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map(EventDate::Date)
                .map_err(|_| invalid());
        }

        if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
            return NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT)
                .map(|dt| EventDate::Utc(Utc.from_utc_datetime(&dt)))
                .map_err(|_| invalid());
        }

        let local = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|_| invalid())?;
        match tzid {
            Some(tzid) => match parse_tzid(tzid) {
                Some(tz) => Ok(EventDate::Zoned { local, tz }),
                None => {
                    warn!("Unknown TZID: {}, treating {} as floating time", tzid, value);
                    Ok(EventDate::Floating(local))
                }
            },
            None => Ok(EventDate::Floating(local)),
        }
    }

    pub fn has_time(&self) -> bool {
        !matches!(self, EventDate::Date(_))
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, EventDate::Floating(_) | EventDate::Date(_))
    }

    /// The wall-clock time of this value in its own zone
    pub fn local(&self) -> NaiveDateTime {
        match self {
            EventDate::Date(date) => date.and_time(NaiveTime::MIN),
            EventDate::Floating(local) => *local,
            EventDate::Utc(dt) => dt.naive_utc(),
            EventDate::Zoned { local, .. } => *local,
        }
    }

    /// The absolute instant of this value. Dates and floating times are
    /// resolved in `floating_tz`.
    pub fn to_utc(&self, floating_tz: Tz) -> DateTime<Utc> {
        match self {
            EventDate::Utc(dt) => *dt,
            EventDate::Zoned { local, tz } => resolve_local(*tz, *local),
            EventDate::Date(_) | EventDate::Floating(_) => resolve_local(floating_tz, self.local()),
        }
    }

    pub fn timestamp_millis(&self, floating_tz: Tz) -> i64 {
        self.to_utc(floating_tz).timestamp_millis()
    }

    /// Label used when rendering the value, `None` for floating and all-day values
    pub fn timezone_label(&self) -> Option<String> {
        match self {
            EventDate::Utc(_) => Some("UTC".into()),
            EventDate::Zoned { tz, .. } => Some(tz.name().to_string()),
            EventDate::Date(_) | EventDate::Floating(_) => None,
        }
    }

    /// Adds a duration keeping the kind of value. An all-day value stays all-day
    /// only if the duration is a whole number of days.
    pub fn add(&self, duration: &IcalDuration) -> Option<EventDate> {
        match self {
            EventDate::Date(date) if duration.is_whole_days() => duration
                .add_to(date.and_time(NaiveTime::MIN))
                .map(|dt| EventDate::Date(dt.date())),
            EventDate::Date(_) | EventDate::Floating(_) => {
                duration.add_to(self.local()).map(EventDate::Floating)
            }
            EventDate::Utc(dt) => duration
                .add_to(dt.naive_utc())
                .map(|dt| EventDate::Utc(Utc.from_utc_datetime(&dt))),
            EventDate::Zoned { tz, .. } => self.offset_instant(duration, *tz).map(|at| {
                EventDate::Zoned {
                    local: at.with_timezone(tz).naive_local(),
                    tz: *tz,
                }
            }),
        }
    }

    /// The instant of this value moved by `duration`. Days, weeks and months
    /// move the wall-clock time in the value's own zone (`floating_tz` for
    /// dates and floating times), hours, minutes and seconds move the instant.
    pub fn offset_instant(&self, duration: &IcalDuration, floating_tz: Tz) -> Option<DateTime<Utc>> {
        let tz = match self {
            EventDate::Zoned { tz, .. } => *tz,
            EventDate::Utc(_) => Tz::UTC,
            EventDate::Date(_) | EventDate::Floating(_) => floating_tz,
        };
        let calendar = IcalDuration {
            seconds: 0,
            ..*duration
        };
        let exact = IcalDuration {
            months: 0,
            days: 0,
            ..*duration
        };
        let local = calendar.add_to(self.local())?;
        let instant = resolve_local(tz, local);
        exact
            .add_to(instant.naive_utc())
            .map(|dt| Utc.from_utc_datetime(&dt))
    }

    pub fn add_days(&self, days: u64) -> Option<EventDate> {
        match self {
            EventDate::Date(date) => date.checked_add_days(Days::new(days)).map(EventDate::Date),
            EventDate::Floating(local) => local
                .checked_add_days(Days::new(days))
                .map(EventDate::Floating),
            EventDate::Utc(dt) => dt.checked_add_days(Days::new(days)).map(EventDate::Utc),
            EventDate::Zoned { local, tz } => local
                .checked_add_days(Days::new(days))
                .map(|local| EventDate::Zoned { local, tz: *tz }),
        }
    }
}

fn parse_tzid(tzid: &str) -> Option<Tz> {
    // Globally unique ids are prefixed with a solidus
    tzid.trim().trim_start_matches('/').parse::<Tz>().ok()
}

/// Resolves a wall-clock time in a zone. Ambiguous times pick the earlier
/// instant and times inside a DST gap are moved forward by an hour.
pub fn resolve_local(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => match tz.from_local_datetime(&(local + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => Utc.from_utc_datetime(&local),
        },
    }
}
