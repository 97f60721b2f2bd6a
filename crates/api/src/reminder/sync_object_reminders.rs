use crate::error::ReminderApiError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use calendar_reminders_api_structs::dtos::ReminderDTO;
use calendar_reminders_api_structs::sync_object_reminders::*;
use calendar_reminders_domain::{
    extract_triggers_from_payload, ical::MalformedEventError, ObjectRef, Principal, Recipients,
    Reminder, Share,
};
use calendar_reminders_infra::{CalendarInfo, ReminderContext};
use tracing::{debug, error, warn};

fn handle_error(e: UseCaseError) -> ReminderApiError {
    match e {
        UseCaseError::MissingCalendarData => ReminderApiError::BadClientData(
            "Calendar data is required when an object is created or updated".into(),
        ),
        UseCaseError::MalformedEvent(e) => ReminderApiError::BadClientData(e.to_string()),
        UseCaseError::StorageError | UseCaseError::GroupLookupError => {
            ReminderApiError::InternalError
        }
    }
}

pub async fn sync_object_reminders_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderApiError> {
    protect_route(&http_req, &ctx)?;

    let body = body.0;
    let usecase = SyncObjectRemindersUseCase {
        action: body.action,
        calendar: CalendarInfo {
            id: body.calendar.id,
            display_name: body.calendar.display_name,
            principal_uri: body.calendar.principal_uri,
        },
        shares: body.shares,
        object_uri: body.object.uri,
        calendar_data: body.object.calendar_data,
        session_user: body.session_user,
    };

    execute(usecase, &ctx)
        .await
        .map(|reminders| {
            HttpResponse::Ok().json(APIResponse {
                reminders: reminders.into_iter().map(ReminderDTO::new).collect(),
            })
        })
        .map_err(handle_error)
}

/// Recomputes the reminders of a calendar object after it was created,
/// updated or deleted
#[derive(Debug)]
pub struct SyncObjectRemindersUseCase {
    pub action: ObjectAction,
    pub calendar: CalendarInfo,
    pub shares: Vec<Share>,
    pub object_uri: String,
    pub calendar_data: Option<String>,
    /// The user that mutated the object, always reminded
    pub session_user: Option<String>,
}

#[derive(Debug)]
pub enum UseCaseError {
    MissingCalendarData,
    MalformedEvent(MalformedEventError),
    StorageError,
    GroupLookupError,
}

impl SyncObjectRemindersUseCase {
    /// Owner, sharees with groups expanded to their current members, and the session user
    /// A group that cannot be expanded fails the whole resolution, since the
    /// stored reminders are a snapshot of the recipients.
    async fn resolve_recipients(
        &self,
        owner: &str,
        ctx: &ReminderContext,
    ) -> Result<Recipients, UseCaseError> {
        let mut recipients = Recipients::default();
        if let Principal::User(uid) = Principal::parse(owner) {
            recipients.add(&uid);
        }

        for share in &self.shares {
            match share.principal() {
                Principal::User(uid) => recipients.add(&uid),
                Principal::Group(gid) => match ctx.services.groups.get_group_members(&gid).await {
                    Ok(Some(members)) => recipients.extend(members),
                    Ok(None) => warn!("Ignoring share with unknown group: {}", gid),
                    Err(e) => {
                        error!("Unable to expand group: {}. Err: {:?}", gid, e);
                        return Err(UseCaseError::GroupLookupError);
                    }
                },
                Principal::Other(principal) => {
                    debug!("Ignoring share with principal: {}", principal)
                }
            }
        }

        if let Some(session_user) = &self.session_user {
            recipients.add(session_user);
        }

        Ok(recipients)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SyncObjectRemindersUseCase {
    type Response = Vec<Reminder>;

    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let calendar_id = self.calendar.id;
        let reminders_repo = &ctx.repos.reminders;

        if self.action == ObjectAction::Deleted {
            reminders_repo
                .delete_for_object(calendar_id, &self.object_uri)
                .await
                .map_err(|_| UseCaseError::StorageError)?;
            return Ok(Vec::new());
        }

        let owner = match &self.calendar.principal_uri {
            Some(owner) => owner.clone(),
            None => {
                debug!(
                    "Calendar: {} has no principal, not computing reminders",
                    calendar_id
                );
                return Ok(Vec::new());
            }
        };
        let calendar_data = self
            .calendar_data
            .as_deref()
            .ok_or(UseCaseError::MissingCalendarData)?;

        let recipients = self.resolve_recipients(&owner, ctx).await?;
        let object = ObjectRef {
            calendar_id,
            object_uri: &self.object_uri,
        };
        let reminders = match extract_triggers_from_payload(
            calendar_data.as_bytes(),
            object,
            recipients.as_slice(),
            ctx.config.default_timezone,
        ) {
            Ok(reminders) => reminders,
            Err(e) => {
                error!(
                    "Unable to compute reminders for object: {} in calendar: {}. Err: {}",
                    self.object_uri, calendar_id, e
                );
                // The previous version of the object is gone, so are its reminders
                reminders_repo
                    .delete_for_object(calendar_id, &self.object_uri)
                    .await
                    .map_err(|_| UseCaseError::StorageError)?;
                return Err(UseCaseError::MalformedEvent(e));
            }
        };

        reminders_repo
            .upsert_triggers(calendar_id, &self.object_uri, &reminders)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(reminders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::testing::*;
    use calendar_reminders_domain::AlarmType;

    fn usecase(action: ObjectAction, data: Option<String>) -> SyncObjectRemindersUseCase {
        SyncObjectRemindersUseCase {
            action,
            calendar: CalendarInfo {
                id: CALENDAR_ID,
                display_name: Some("Personal".into()),
                principal_uri: Some(OWNER.into()),
            },
            shares: Vec::new(),
            object_uri: OBJECT_URI.into(),
            calendar_data: data,
            session_user: None,
        }
    }

    fn share(principal: &str) -> Share {
        Share {
            principal: principal.into(),
            read_only: false,
        }
    }

    #[actix_web::test]
    async fn creates_reminders_for_owner() {
        let env = TestEnv::new();
        let data = standup(&[("DISPLAY", "-PT15M")]);

        let reminders = execute(usecase(ObjectAction::Created, Some(data)), &env.ctx)
            .await
            .unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].user_id, "alice");
        assert_eq!(reminders[0].alarm_type, AlarmType::Display);
        assert_eq!(reminders[0].remind_at, millis(2024, 6, 1, 9, 45));
        assert_eq!(reminders[0].event_start, millis(2024, 6, 1, 10, 0));

        let stored = env
            .ctx
            .repos
            .reminders
            .find_by_object(CALENDAR_ID, OBJECT_URI)
            .await
            .unwrap();
        assert_eq!(stored, reminders);
    }

    #[actix_web::test]
    async fn expands_shares_groups_and_session_user() {
        let env = TestEnv::new();
        env.groups
            .put_group("team", vec!["bob".into(), "carol".into(), "alice".into()]);

        let mut usecase = usecase(
            ObjectAction::Created,
            Some(standup(&[("EMAIL", "-PT1H")])),
        );
        usecase.shares = vec![
            share("principals/users/dave"),
            share("principals/groups/team"),
            share("principals/groups/unknown"),
            share("principals/calendar-resources/room"),
        ];
        usecase.session_user = Some("erin".into());

        let reminders = execute(usecase, &env.ctx).await.unwrap();
        let users = reminders.iter().map(|r| r.user_id.as_str()).collect::<Vec<_>>();
        assert_eq!(users, vec!["alice", "dave", "bob", "carol", "erin"]);
    }

    #[actix_web::test]
    async fn keeps_reminders_when_groups_cannot_be_expanded() {
        let env = TestEnv::new();
        env.groups.put_group("team", vec!["bob".into()]);
        let shared = |data: String| {
            let mut usecase = usecase(ObjectAction::Updated, Some(data));
            usecase.shares = vec![share("principals/groups/team")];
            usecase
        };

        let before = execute(shared(standup(&[("EMAIL", "-PT1H")])), &env.ctx)
            .await
            .unwrap();
        assert_eq!(before.len(), 2);

        env.groups.set_unavailable(true);
        let res = execute(shared(standup(&[("EMAIL", "-PT30M")])), &env.ctx).await;
        assert!(matches!(res, Err(UseCaseError::GroupLookupError)));

        let stored = env
            .ctx
            .repos
            .reminders
            .find_by_object(CALENDAR_ID, OBJECT_URI)
            .await
            .unwrap();
        assert_eq!(stored, before);
    }

    #[actix_web::test]
    async fn updates_replace_previous_reminders() {
        let env = TestEnv::new();
        let first = standup(&[("DISPLAY", "-PT15M"), ("EMAIL", "-PT1H")]);
        let second = standup(&[("DISPLAY", "-PT30M")]);

        execute(usecase(ObjectAction::Created, Some(first)), &env.ctx)
            .await
            .unwrap();
        execute(usecase(ObjectAction::Updated, Some(second.clone())), &env.ctx)
            .await
            .unwrap();
        execute(usecase(ObjectAction::Updated, Some(second)), &env.ctx)
            .await
            .unwrap();

        let stored = env
            .ctx
            .repos
            .reminders
            .find_by_object(CALENDAR_ID, OBJECT_URI)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].remind_at, millis(2024, 6, 1, 9, 30));
    }

    #[actix_web::test]
    async fn deletion_removes_reminders() {
        let env = TestEnv::new();
        execute(
            usecase(ObjectAction::Created, Some(standup(&[("DISPLAY", "-PT15M")]))),
            &env.ctx,
        )
        .await
        .unwrap();

        let res = execute(usecase(ObjectAction::Deleted, None), &env.ctx).await;
        assert!(res.unwrap().is_empty());
        assert!(env
            .ctx
            .repos
            .reminders
            .find_by_object(CALENDAR_ID, OBJECT_URI)
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_web::test]
    async fn ignores_calendars_without_principal() {
        let env = TestEnv::new();
        let mut usecase = usecase(
            ObjectAction::Created,
            Some(standup(&[("DISPLAY", "-PT15M")])),
        );
        usecase.calendar.principal_uri = None;
        assert!(execute(usecase, &env.ctx).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn malformed_update_clears_reminders() {
        let env = TestEnv::new();
        execute(
            usecase(ObjectAction::Created, Some(standup(&[("DISPLAY", "-PT15M")]))),
            &env.ctx,
        )
        .await
        .unwrap();

        let no_start = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:x\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let res = execute(
            usecase(ObjectAction::Updated, Some(no_start.into())),
            &env.ctx,
        )
        .await;
        assert!(matches!(
            res,
            Err(UseCaseError::MalformedEvent(MalformedEventError::MissingStart))
        ));
        assert!(env
            .ctx
            .repos
            .reminders
            .find_by_object(CALENDAR_ID, OBJECT_URI)
            .await
            .unwrap()
            .is_empty());

        let res = execute(usecase(ObjectAction::Updated, None), &env.ctx).await;
        assert!(matches!(res, Err(UseCaseError::MissingCalendarData)));
    }
}
