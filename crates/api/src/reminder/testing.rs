use calendar_reminders_domain::{Locale, Tz, User};
use calendar_reminders_infra::{
    CalendarInfo, InMemoryCalendarBackend, InMemoryGroupResolver, InMemoryMailer,
    InMemoryNotificationStore, InMemoryUserDirectory, ReminderContext, Services, StaticTimeSys,
};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

pub const CALENDAR_ID: i64 = 1;
pub const OBJECT_URI: &str = "standup.ics";
pub const OWNER: &str = "principals/users/alice";

/// In memory context with handles to the collaborators behind it
pub struct TestEnv {
    pub ctx: ReminderContext,
    pub calendars: Arc<InMemoryCalendarBackend>,
    pub groups: Arc<InMemoryGroupResolver>,
    pub users: Arc<InMemoryUserDirectory>,
    pub mailer: Arc<InMemoryMailer>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub sys: Arc<StaticTimeSys>,
}

impl TestEnv {
    pub fn new() -> Self {
        let calendars = Arc::new(InMemoryCalendarBackend::new());
        let groups = Arc::new(InMemoryGroupResolver::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let mailer = Arc::new(InMemoryMailer::new());
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let sys = Arc::new(StaticTimeSys::new(0));

        let mut ctx = ReminderContext::create_inmemory();
        ctx.services = Services {
            calendars: calendars.clone(),
            groups: groups.clone(),
            users: users.clone(),
            mailer: mailer.clone(),
            notifications: notifications.clone(),
        };
        ctx.sys = sys.clone();
        ctx.config.default_locale = Locale::EnUs;
        ctx.config.default_timezone = Tz::UTC;
        ctx.config.claim_lease_millis = 5 * 60 * 1000;

        calendars.put_calendar(CalendarInfo {
            id: CALENDAR_ID,
            display_name: Some("Personal".into()),
            principal_uri: Some(OWNER.into()),
        });
        users.put_user(user("alice", Some("alice@example.com")));

        Self {
            ctx,
            calendars,
            groups,
            users,
            mailer,
            notifications,
            sys,
        }
    }
}

pub fn user(uid: &str, email: Option<&str>) -> User {
    User {
        uid: uid.into(),
        display_name: uid.to_uppercase(),
        email: email.map(String::from),
    }
}

pub fn millis(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .timestamp_millis()
}

/// Event on 2024-06-01 10:00-11:00 UTC with the given alarms
pub fn standup(alarms: &[(&str, &str)]) -> String {
    let alarms = alarms
        .iter()
        .map(|(action, trigger)| {
            format!(
                "BEGIN:VALARM\r\nACTION:{}\r\nTRIGGER:{}\r\nEND:VALARM\r\n",
                action, trigger
            )
        })
        .collect::<String>();
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\nBEGIN:VEVENT\r\nUID:standup-1\r\nSUMMARY:Standup\r\nLOCATION:Room 1\r\nDTSTART:20240601T100000Z\r\nDTEND:20240601T110000Z\r\n{}END:VEVENT\r\nEND:VCALENDAR\r\n",
        alarms
    )
}
