use super::date::{EventDate, InvalidDateError};
use super::duration::IcalDuration;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::{IcalAlarm, IcalEvent};
use ical::property::Property;
use ical::IcalParser;
use std::io::BufReader;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq)]
pub enum MalformedEventError {
    #[error("Unable to parse calendar data: {0}")]
    Unparseable(String),
    #[error("Calendar data does not contain a VEVENT")]
    MissingEvent,
    #[error("The VEVENT has no DTSTART")]
    MissingStart,
    #[error("The VEVENT has an invalid DTSTART: {0}")]
    InvalidStart(InvalidDateError),
}

/// Which edge of the event a relative alarm trigger is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRelation {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlarmTrigger {
    Absolute(DateTime<Utc>),
    Relative {
        offset: IcalDuration,
        related: TriggerRelation,
    },
}

/// A `VALARM` sub-component
#[derive(Debug, Clone, PartialEq)]
pub struct VAlarm {
    pub action: Option<String>,
    /// `None` when the alarm has no `TRIGGER` or it could not be understood
    pub trigger: Option<AlarmTrigger>,
}

/// The parts of a `VEVENT` that reminders care about
#[derive(Debug, Clone, PartialEq)]
pub struct VEvent {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
    pub start: EventDate,
    pub end: Option<EventDate>,
    pub duration: Option<IcalDuration>,
    pub alarms: Vec<VAlarm>,
}

impl VEvent {
    /// `DTEND` if present, otherwise `DTSTART` + `DURATION`. Without either an
    /// all-day event lasts one day and a timed event has no length.
    pub fn effective_end(&self) -> EventDate {
        if let Some(end) = &self.end {
            return end.clone();
        }
        if let Some(end) = self.duration.as_ref().and_then(|d| self.start.add(d)) {
            return end;
        }
        if !self.start.has_time() {
            if let Some(end) = self.start.add_days(1) {
                return end;
            }
        }
        self.start.clone()
    }

    pub fn is_all_day(&self) -> bool {
        !self.start.has_time()
    }
}

impl VAlarm {
    /// The instant this alarm should fire at for the given event
    pub fn effective_trigger(&self, event: &VEvent, floating_tz: Tz) -> Option<DateTime<Utc>> {
        match self.trigger.as_ref()? {
            AlarmTrigger::Absolute(at) => Some(*at),
            AlarmTrigger::Relative { offset, related } => {
                let anchor = match related {
                    TriggerRelation::Start => event.start.clone(),
                    TriggerRelation::End => event.effective_end(),
                };
                anchor.offset_instant(offset, floating_tz)
            }
        }
    }
}

/// Parses raw calendar data and returns its first (master) `VEVENT`
pub fn parse_calendar_object(raw: &[u8]) -> Result<VEvent, MalformedEventError> {
    let mut parser = IcalParser::new(BufReader::new(raw));
    let calendar = match parser.next() {
        Some(Ok(calendar)) => calendar,
        Some(Err(e)) => return Err(MalformedEventError::Unparseable(format!("{:?}", e))),
        None => return Err(MalformedEventError::Unparseable("empty calendar data".into())),
    };
    let event = calendar
        .events
        .into_iter()
        .next()
        .ok_or(MalformedEventError::MissingEvent)?;

    parse_event(&event)
}

fn parse_event(event: &IcalEvent) -> Result<VEvent, MalformedEventError> {
    let props = &event.properties;

    let start = find_property(props, "DTSTART").ok_or(MalformedEventError::MissingStart)?;
    let start = parse_date_property(start).map_err(MalformedEventError::InvalidStart)?;

    let end = find_property(props, "DTEND").and_then(|p| match parse_date_property(p) {
        Ok(end) => Some(end),
        Err(e) => {
            warn!("Ignoring invalid DTEND. Err: {}", e);
            None
        }
    });
    let duration = text_value(props, "DURATION").and_then(|d| match d.parse::<IcalDuration>() {
        Ok(d) => Some(d),
        Err(e) => {
            warn!("Ignoring invalid DURATION. Err: {}", e);
            None
        }
    });

    Ok(VEvent {
        uid: text_value(props, "UID"),
        summary: text_value(props, "SUMMARY"),
        description: text_value(props, "DESCRIPTION"),
        location: text_value(props, "LOCATION"),
        url: text_value(props, "URL"),
        status: text_value(props, "STATUS"),
        start,
        end,
        duration,
        alarms: event.alarms.iter().map(parse_alarm).collect(),
    })
}

fn parse_alarm(alarm: &IcalAlarm) -> VAlarm {
    let props = &alarm.properties;
    let trigger = find_property(props, "TRIGGER").and_then(parse_trigger);
    VAlarm {
        action: text_value(props, "ACTION").map(|a| a.to_uppercase()),
        trigger,
    }
}

fn parse_trigger(prop: &Property) -> Option<AlarmTrigger> {
    let value = prop.value.as_deref()?.trim();
    let is_date_time = param(prop, "VALUE")
        .map(|v| v.eq_ignore_ascii_case("DATE-TIME"))
        .unwrap_or(false);

    if is_date_time {
        return match EventDate::parse(value, None, None) {
            Ok(EventDate::Utc(at)) => Some(AlarmTrigger::Absolute(at)),
            _ => {
                warn!("Absolute alarm trigger must be in UTC, got: {}", value);
                None
            }
        };
    }

    let related = match param(prop, "RELATED") {
        Some(r) if r.eq_ignore_ascii_case("END") => TriggerRelation::End,
        _ => TriggerRelation::Start,
    };
    match value.parse::<IcalDuration>() {
        Ok(offset) => Some(AlarmTrigger::Relative { offset, related }),
        Err(e) => {
            warn!("Ignoring alarm with invalid trigger. Err: {}", e);
            None
        }
    }
}

fn parse_date_property(prop: &Property) -> Result<EventDate, InvalidDateError> {
    let value = prop.value.as_deref().unwrap_or_default();
    EventDate::parse(value, param(prop, "VALUE"), param(prop, "TZID"))
}

fn find_property<'a>(props: &'a [Property], name: &str) -> Option<&'a Property> {
    props.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

fn param<'a>(prop: &'a Property, name: &str) -> Option<&'a str> {
    prop.params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(|v| v.as_str())
}

fn text_value(props: &[Property], name: &str) -> Option<String> {
    find_property(props, name)
        .and_then(|p| p.value.as_deref())
        .map(unescape_text)
}

/// Reverses TEXT escaping, e.g. `\n` and `\,`
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
