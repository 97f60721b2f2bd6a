use super::{
    CalendarInfo, ICalendarBackend, IGroupResolver, IMailer, INotificationStore, IUserDirectory,
    TransportError,
};
use calendar_reminders_domain::{EmailMessage, InAppNotification, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Calendar backend used for local runs and tests
#[derive(Default)]
pub struct InMemoryCalendarBackend {
    calendars: Mutex<HashMap<i64, CalendarInfo>>,
    objects: Mutex<HashMap<(i64, String), Vec<u8>>>,
    unavailable: AtomicBool,
}

impl InMemoryCalendarBackend {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn put_calendar(&self, calendar: CalendarInfo) {
        lock(&self.calendars).insert(calendar.id, calendar);
    }

    pub fn put_object(&self, calendar_id: i64, object_uri: &str, data: impl Into<Vec<u8>>) {
        lock(&self.objects).insert((calendar_id, object_uri.to_string()), data.into());
    }

    pub fn remove_object(&self, calendar_id: i64, object_uri: &str) {
        lock(&self.objects).remove(&(calendar_id, object_uri.to_string()));
    }

    /// Makes every lookup fail until set back to `false`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> anyhow::Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            anyhow::bail!("Calendar backend is unavailable");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ICalendarBackend for InMemoryCalendarBackend {
    async fn get_raw_payload(
        &self,
        calendar_id: i64,
        object_uri: &str,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        self.check_available()?;
        Ok(lock(&self.objects)
            .get(&(calendar_id, object_uri.to_string()))
            .cloned())
    }

    async fn get_calendar(&self, calendar_id: i64) -> anyhow::Result<Option<CalendarInfo>> {
        self.check_available()?;
        Ok(lock(&self.calendars).get(&calendar_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryGroupResolver {
    groups: Mutex<HashMap<String, Vec<String>>>,
    unavailable: AtomicBool,
}

impl InMemoryGroupResolver {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn put_group(&self, group_id: &str, members: Vec<String>) {
        lock(&self.groups).insert(group_id.to_string(), members);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl IGroupResolver for InMemoryGroupResolver {
    async fn get_group_members(&self, group_id: &str) -> anyhow::Result<Option<Vec<String>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            anyhow::bail!("Group backend is unavailable");
        }
        Ok(lock(&self.groups).get(group_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, User>>,
    locales: Mutex<HashMap<String, String>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn put_user(&self, user: User) {
        lock(&self.users).insert(user.uid.clone(), user);
    }

    pub fn remove_user(&self, uid: &str) {
        lock(&self.users).remove(uid);
    }

    pub fn set_locale(&self, uid: &str, locale: &str) {
        lock(&self.locales).insert(uid.to_string(), locale.to_string());
    }
}

#[async_trait::async_trait]
impl IUserDirectory for InMemoryUserDirectory {
    async fn get_user(&self, uid: &str) -> anyhow::Result<Option<User>> {
        Ok(lock(&self.users).get(uid).cloned())
    }

    async fn get_preferred_locale(&self, uid: &str) -> anyhow::Result<Option<String>> {
        Ok(lock(&self.locales).get(uid).cloned())
    }
}

/// Records sent messages instead of delivering them
#[derive(Default)]
pub struct InMemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        lock(&self.sent).clone()
    }
}

#[async_trait::async_trait]
impl IMailer for InMemoryMailer {
    async fn send(&self, message: &EmailMessage) -> Result<Vec<String>, TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Request("mail transport is down".into()));
        }
        lock(&self.sent).push(message.clone());
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: Mutex<Vec<InAppNotification>>,
    failing: AtomicBool,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn notifications(&self) -> Vec<InAppNotification> {
        lock(&self.notifications).clone()
    }
}

#[async_trait::async_trait]
impl INotificationStore for InMemoryNotificationStore {
    async fn notify(&self, notification: &InAppNotification) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Request("notification store is down".into()));
        }
        lock(&self.notifications).push(notification.clone());
        Ok(())
    }
}
