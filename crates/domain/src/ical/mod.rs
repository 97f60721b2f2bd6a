mod date;
mod duration;
mod event;

pub use date::{resolve_local, EventDate, InvalidDateError};
pub use duration::{IcalDuration, InvalidDurationError};
pub use event::{
    parse_calendar_object, AlarmTrigger, MalformedEventError, TriggerRelation, VAlarm, VEvent,
};
