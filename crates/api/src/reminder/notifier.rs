use crate::error::ReminderApiError;
use crate::shared::auth::protect_route;
use actix_web::{web, HttpRequest, HttpResponse};
use calendar_reminders_api_structs::render_notification::*;
use calendar_reminders_domain::{InAppNotification, Locale, REMINDER_APP, REMINDER_SUBJECT};
use calendar_reminders_infra::{t_args, t_plural, IStringCatalog, ReminderContext};
use std::sync::Arc;
use thiserror::Error;

const MINUTE: i64 = 1000 * 60;
const HOUR: i64 = MINUTE * 60;
const DAY: i64 = HOUR * 24;

#[derive(Error, Debug, PartialEq)]
pub enum NotifierError {
    #[error("Notification of app: {0} is not handled by reminders")]
    UnknownApp(String),
    #[error("Unknown notification subject: {0}")]
    UnknownSubject(String),
}

pub async fn render_notification_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderApiError> {
    protect_route(&http_req, &ctx)?;

    let body = body.0;
    let locale = Locale::resolve(body.locale.as_deref(), ctx.config.default_locale);
    let now = body.now.unwrap_or_else(|| ctx.sys.get_timestamp_millis());

    Notifier::new(ctx.catalog.clone())
        .prepare(&body.notification, locale, now)
        .map(|rendered| {
            HttpResponse::Ok().json(APIResponse {
                subject: rendered.subject,
                message: rendered.message,
            })
        })
        .map_err(|e| ReminderApiError::BadClientData(e.to_string()))
}

/// A reminder notification rendered for display
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub subject: String,
    pub message: Option<String>,
}

/// Renders stored reminder notifications when they are displayed, so the
/// relative start time is computed from the time of reading
pub struct Notifier {
    catalog: Arc<dyn IStringCatalog>,
}

impl Notifier {
    pub fn new(catalog: Arc<dyn IStringCatalog>) -> Self {
        Self { catalog }
    }

    pub fn prepare(
        &self,
        notification: &InAppNotification,
        locale: Locale,
        now: i64,
    ) -> Result<RenderedNotification, NotifierError> {
        if notification.app != REMINDER_APP {
            return Err(NotifierError::UnknownApp(notification.app.clone()));
        }
        if notification.subject != REMINDER_SUBJECT {
            return Err(NotifierError::UnknownSubject(notification.subject.clone()));
        }

        let catalog = self.catalog.as_ref();
        let params = &notification.subject_params;
        let title = params
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or_default();
        let start = params.get("start").and_then(|s| s.as_i64()).unwrap_or(now);

        let subject = if start <= now {
            t_args(catalog, locale, "Your event \"%s\" has started", &[title])
        } else {
            let until = self.relative_time(locale, start.saturating_sub(now));
            t_args(catalog, locale, "Your event \"%s\" is in %s", &[title, &until])
        };
        let message = notification
            .message_params
            .get("when")
            .and_then(|w| w.as_str())
            .filter(|w| !w.is_empty())
            .map(String::from);

        Ok(RenderedNotification { subject, message })
    }

    /// e.g. `15 minutes`, `3 hours` or `2 days`, rounded to the nearest unit
    fn relative_time(&self, locale: Locale, millis: i64) -> String {
        let catalog = self.catalog.as_ref();
        let rounded = |unit: i64| millis.saturating_add(unit / 2) / unit;
        let minutes = rounded(MINUTE).max(1);
        if minutes < 60 {
            return t_plural(catalog, locale, "%n minute", "%n minutes", minutes);
        }
        let hours = rounded(HOUR);
        if hours < 24 {
            t_plural(catalog, locale, "%n hour", "%n hours", hours)
        } else {
            t_plural(catalog, locale, "%n day", "%n days", rounded(DAY))
        }
    }
}
