mod format;
pub mod ical;
mod locale;
mod notification;
mod reminder;
mod share;
mod shared;
mod summary;
mod trigger;
mod user;

pub use format::{format_event_when, format_when};
pub use locale::{Locale, UnsupportedLocaleError};
pub use notification::{
    Attachment, EmailMessage, InAppNotification, Mailbox, REMINDER_APP, REMINDER_OBJECT_TYPE,
    REMINDER_SUBJECT,
};
pub use reminder::{AlarmType, DueReminder, Reminder};
pub use share::{Principal, Recipients, Share};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use summary::EventSummary;
pub use trigger::{extract_triggers, extract_triggers_from_payload, ObjectRef};
pub use user::User;

pub use chrono_tz::Tz;
