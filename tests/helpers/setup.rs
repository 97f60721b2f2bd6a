use calendar_reminders_api::{Application, API_KEY_HEADER};
use calendar_reminders_domain::User;
use calendar_reminders_infra::{
    CalendarInfo, Config, InMemoryCalendarBackend, InMemoryGroupResolver, InMemoryMailer,
    InMemoryNotificationStore, InMemoryUserDirectory, ReminderContext, Services,
};
use std::sync::Arc;

pub const CALENDAR_ID: i64 = 7;
pub const OWNER: &str = "principals/users/alice";

pub struct TestApp {
    pub config: Config,
    pub address: String,
    pub client: reqwest::Client,
    pub calendars: Arc<InMemoryCalendarBackend>,
    pub groups: Arc<InMemoryGroupResolver>,
    pub users: Arc<InMemoryUserDirectory>,
    pub mailer: Arc<InMemoryMailer>,
    pub notifications: Arc<InMemoryNotificationStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    /// Request carrying the api key of the running application
    pub fn authorized(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(API_KEY_HEADER, self.config.api_secret.clone())
    }
}

// Launch the application as a background task
pub async fn spawn_app() -> TestApp {
    let calendars = Arc::new(InMemoryCalendarBackend::new());
    let groups = Arc::new(InMemoryGroupResolver::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let mailer = Arc::new(InMemoryMailer::new());
    let notifications = Arc::new(InMemoryNotificationStore::new());

    let mut ctx = ReminderContext::create_inmemory();
    ctx.services = Services {
        calendars: calendars.clone(),
        groups: groups.clone(),
        users: users.clone(),
        mailer: mailer.clone(),
        notifications: notifications.clone(),
    };
    ctx.config.port = 0; // Random port
    ctx.config.scan_interval_secs = 0;
    ctx.config.api_secret = "integration-secret".into();
    ctx.config.default_timezone = calendar_reminders_domain::Tz::UTC;

    calendars.put_calendar(CalendarInfo {
        id: CALENDAR_ID,
        display_name: Some("Work".into()),
        principal_uri: Some(OWNER.into()),
    });
    users.put_user(User {
        uid: "alice".into(),
        display_name: "Alice".into(),
        email: Some("alice@example.com".into()),
    });

    let config = ctx.config.clone();
    let application = Application::new(ctx)
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp {
        config,
        address,
        client: reqwest::Client::new(),
        calendars,
        groups,
        users,
        mailer,
        notifications,
    }
}
