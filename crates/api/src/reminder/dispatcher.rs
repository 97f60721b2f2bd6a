use super::channels::{Delivery, EmailChannel, InAppChannel, NotificationChannel, Recipient};
use calendar_reminders_domain::{
    ical::{parse_calendar_object, MalformedEventError},
    AlarmType, DueReminder, EventSummary, Locale, Mailbox,
};
use calendar_reminders_infra::{ReminderContext, TransportError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Malformed calendar object: {0}")]
    Malformed(#[from] MalformedEventError),
    #[error("Recipient: {0} was not found")]
    RecipientNotFound(String),
    #[error("Calendar object no longer exists")]
    ObjectNotFound,
    #[error("Delivery failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Collaborator lookup failed: {0}")]
    Backend(anyhow::Error),
}

impl DispatchError {
    /// Whether a later attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Malformed(_) | Self::Transport(_) | Self::Backend(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// The channel had nothing to deliver to
    NoOp,
    /// No channel handles the alarm type
    Skipped,
}

/// Chooses the channel for an alarm type
fn channel_for(
    alarm_type: &AlarmType,
    ctx: &ReminderContext,
    now: i64,
) -> Option<Box<dyn NotificationChannel>> {
    match alarm_type {
        AlarmType::Email => Some(Box::new(EmailChannel::new(
            ctx.services.mailer.clone(),
            ctx.catalog.clone(),
            Mailbox::new(
                ctx.config.mail_from_address.clone(),
                Some(ctx.config.mail_from_name.clone()),
            ),
        ))),
        AlarmType::Display => Some(Box::new(InAppChannel::new(
            ctx.services.notifications.clone(),
            now,
        ))),
        AlarmType::Audio | AlarmType::Other(_) => None,
    }
}

async fn resolve_recipient(uid: &str, ctx: &ReminderContext) -> Result<Recipient, DispatchError> {
    let user = ctx
        .services
        .users
        .get_user(uid)
        .await
        .map_err(DispatchError::Backend)?
        .ok_or_else(|| DispatchError::RecipientNotFound(uid.to_string()))?;

    let locale = match ctx.services.users.get_preferred_locale(uid).await {
        Ok(tag) => Locale::resolve(tag.as_deref(), ctx.config.default_locale),
        Err(e) => {
            warn!(
                "Unable to look up locale of user: {}, using the default. Err: {:?}",
                uid, e
            );
            ctx.config.default_locale
        }
    };

    Ok(Recipient { user, locale })
}

/// Parses the calendar data of a due reminder, builds the summary in the
/// recipient's locale and hands it to the channel of the alarm type.
pub async fn dispatch(
    due: &DueReminder,
    ctx: &ReminderContext,
    now: i64,
) -> Result<DispatchOutcome, DispatchError> {
    let reminder = &due.reminder;
    let channel = match channel_for(&reminder.alarm_type, ctx, now) {
        Some(channel) => channel,
        None => {
            debug!(
                "No channel for alarm type: {}, reminder: {}",
                reminder.alarm_type, reminder.id
            );
            return Ok(DispatchOutcome::Skipped);
        }
    };

    let raw = due
        .calendar_data
        .as_deref()
        .ok_or(DispatchError::ObjectNotFound)?;
    let event = parse_calendar_object(raw)?;
    let recipient = resolve_recipient(&reminder.user_id, ctx).await?;
    let summary = EventSummary::new(
        &event,
        recipient.locale,
        ctx.config.default_timezone,
        due.calendar_display_name.clone(),
    );

    match channel.send(&summary, raw, &recipient).await? {
        Delivery::Delivered => Ok(DispatchOutcome::Sent),
        Delivery::NoOp => Ok(DispatchOutcome::NoOp),
    }
}
