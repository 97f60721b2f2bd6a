use super::dispatcher::{dispatch, DispatchError, DispatchOutcome};
use crate::error::ReminderApiError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use calendar_reminders_api_structs::dtos::ScanReportDTO;
use calendar_reminders_api_structs::send_due_reminders::*;
use calendar_reminders_domain::{DueReminder, Reminder};
use calendar_reminders_infra::ReminderContext;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

fn handle_error(e: UseCaseError) -> ReminderApiError {
    match e {
        UseCaseError::StorageError => ReminderApiError::InternalError,
    }
}

pub async fn send_due_reminders_controller(
    http_req: HttpRequest,
    body: Option<web::Json<RequestBody>>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderApiError> {
    protect_route(&http_req, &ctx)?;

    let now = body
        .and_then(|b| b.now)
        .unwrap_or_else(|| ctx.sys.get_timestamp_millis());
    let usecase = SendDueRemindersUseCase { now };

    execute(usecase, &ctx)
        .await
        .map(|report| HttpResponse::Ok().json(APIResponse::from(report)))
        .map_err(handle_error)
}

/// What happened to the reminders claimed by one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub now: i64,
    pub claimed: usize,
    /// Delivered, or nothing to deliver to
    pub sent: usize,
    /// Dropped because the event had already started
    pub stale: usize,
    /// Dropped because the recipient or the calendar object is gone
    pub undeliverable: usize,
    /// Dropped because no channel handles the alarm type
    pub skipped: usize,
    /// Left for the next scan
    pub failed: usize,
}

impl From<ScanReport> for ScanReportDTO {
    fn from(report: ScanReport) -> Self {
        Self {
            now: report.now,
            claimed: report.claimed,
            sent: report.sent,
            stale: report.stale,
            undeliverable: report.undeliverable,
            skipped: report.skipped,
            failed: report.failed,
        }
    }
}

/// Due reminders joined with their calendar data
#[derive(Debug, Default)]
pub struct PoppedReminders {
    pub due: Vec<DueReminder>,
    pub stale_deleted: i64,
    /// Claims given back because the calendar backend could not be reached
    pub released: usize,
}

/// Claims the reminders that are due at `now` and loads the calendar name and
/// calendar data of each. A reminder whose calendar object does not exist
/// anymore is returned without calendar data.
pub async fn pop_due_reminders(ctx: &ReminderContext, now: i64) -> anyhow::Result<PoppedReminders> {
    let claimed = ctx
        .repos
        .reminders
        .claim_due(now, ctx.config.claim_lease_millis)
        .await?;

    let mut calendar_names: HashMap<i64, Option<String>> = HashMap::new();
    let mut payloads: HashMap<(i64, String), Option<Vec<u8>>> = HashMap::new();
    let mut popped = PoppedReminders {
        stale_deleted: claimed.stale_deleted,
        ..Default::default()
    };

    for reminder in claimed.due {
        match load_object(ctx, &reminder, &mut calendar_names, &mut payloads).await {
            Ok((calendar_display_name, calendar_data)) => popped.due.push(DueReminder {
                reminder,
                calendar_display_name,
                calendar_data,
            }),
            Err(e) => {
                warn!(
                    "Unable to load calendar object: {} for reminder: {}. Err: {:?}",
                    reminder.object_uri, reminder.id, e
                );
                ctx.repos.reminders.release_claim(&reminder.id).await?;
                popped.released += 1;
            }
        }
    }

    Ok(popped)
}

async fn load_object(
    ctx: &ReminderContext,
    reminder: &Reminder,
    calendar_names: &mut HashMap<i64, Option<String>>,
    payloads: &mut HashMap<(i64, String), Option<Vec<u8>>>,
) -> anyhow::Result<(Option<String>, Option<Vec<u8>>)> {
    let calendars = &ctx.services.calendars;

    let name = match calendar_names.get(&reminder.calendar_id) {
        Some(name) => name.clone(),
        None => {
            let name = calendars
                .get_calendar(reminder.calendar_id)
                .await?
                .and_then(|c| c.display_name);
            calendar_names.insert(reminder.calendar_id, name.clone());
            name
        }
    };

    let key = (reminder.calendar_id, reminder.object_uri.clone());
    let payload = match payloads.get(&key) {
        Some(payload) => payload.clone(),
        None => {
            let payload = calendars
                .get_raw_payload(reminder.calendar_id, &reminder.object_uri)
                .await?;
            payloads.insert(key, payload.clone());
            payload
        }
    };

    Ok((name, payload))
}

#[derive(Debug)]
pub struct SendDueRemindersUseCase {
    /// Millis
    pub now: i64,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendDueRemindersUseCase {
    type Response = ScanReport;

    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let now = self.now;
        let popped = pop_due_reminders(ctx, now).await.map_err(|e| {
            error!("Unable to claim due reminders. Err: {:?}", e);
            UseCaseError::StorageError
        })?;

        let mut report = ScanReport {
            now,
            claimed: popped.due.len() + popped.released,
            stale: popped.stale_deleted as usize,
            failed: popped.released,
            ..Default::default()
        };

        // Rows are independent of each other, a failure only affects its own row
        let results = join_all(popped.due.iter().map(|due| dispatch(due, ctx, now))).await;

        for (due, result) in popped.due.iter().zip(results) {
            let reminder = &due.reminder;
            let remove = match result {
                Ok(DispatchOutcome::Sent) | Ok(DispatchOutcome::NoOp) => {
                    report.sent += 1;
                    true
                }
                Ok(DispatchOutcome::Skipped) => {
                    report.skipped += 1;
                    true
                }
                Err(e) if !e.is_retryable() => {
                    info!("Dropping undeliverable reminder: {}. Reason: {}", reminder.id, e);
                    report.undeliverable += 1;
                    true
                }
                Err(e) => {
                    match &e {
                        DispatchError::Transport(_) => {
                            warn!("Unable to send reminder: {}. Err: {}", reminder.id, e)
                        }
                        _ => error!("Unable to send reminder: {}. Err: {:?}", reminder.id, e),
                    }
                    report.failed += 1;
                    false
                }
            };

            let res = if remove {
                ctx.repos.reminders.delete(&reminder.id).await.map(|_| ())
            } else {
                ctx.repos.reminders.release_claim(&reminder.id).await
            };
            if let Err(e) = res {
                error!(
                    "Unable to update reminder: {} after dispatch, aborting scan. Err: {:?}",
                    reminder.id, e
                );
                return Err(UseCaseError::StorageError);
            }
        }

        if report.claimed > 0 || report.stale > 0 {
            info!("Reminder scan finished: {:?}", report);
        } else {
            debug!("Reminder scan found nothing to do at {}", now);
        }
        Ok(report)
    }
}
