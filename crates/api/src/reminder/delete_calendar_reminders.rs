use crate::error::ReminderApiError;
use crate::shared::{
    auth::protect_route,
    usecase::{execute, UseCase},
};
use actix_web::{web, HttpRequest, HttpResponse};
use calendar_reminders_api_structs::delete_calendar_reminders::*;
use calendar_reminders_infra::ReminderContext;

fn handle_error(e: UseCaseError) -> ReminderApiError {
    match e {
        UseCaseError::StorageError => ReminderApiError::InternalError,
    }
}

pub async fn delete_calendar_reminders_controller(
    http_req: HttpRequest,
    path_params: web::Path<PathParams>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ReminderApiError> {
    protect_route(&http_req, &ctx)?;

    let usecase = DeleteCalendarRemindersUseCase {
        calendar_id: path_params.calendar_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|deleted_count| HttpResponse::Ok().json(APIResponse { deleted_count }))
        .map_err(handle_error)
}

/// Removes every reminder of a deleted calendar
#[derive(Debug)]
pub struct DeleteCalendarRemindersUseCase {
    pub calendar_id: i64,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeleteCalendarRemindersUseCase {
    type Response = i64;

    type Errors = UseCaseError;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        ctx.repos
            .reminders
            .delete_for_calendar(self.calendar_id)
            .await
            .map(|res| res.deleted_count)
            .map_err(|_| UseCaseError::StorageError)
    }
}
