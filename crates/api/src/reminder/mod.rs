mod channels;
mod delete_calendar_reminders;
mod dispatcher;
mod notifier;
mod send_due_reminders;
mod sync_object_reminders;
#[cfg(test)]
mod testing;

use actix_web::web;
use delete_calendar_reminders::delete_calendar_reminders_controller;
use notifier::render_notification_controller;
use send_due_reminders::send_due_reminders_controller;
pub use send_due_reminders::{ScanReport, SendDueRemindersUseCase};
use sync_object_reminders::sync_object_reminders_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/reminders/objects",
        web::post().to(sync_object_reminders_controller),
    );
    cfg.route(
        "/reminders/calendars/{calendar_id}",
        web::delete().to(delete_calendar_reminders_controller),
    );
    cfg.route(
        "/reminders/scan",
        web::post().to(send_due_reminders_controller),
    );
    cfg.route(
        "/reminders/notifications/render",
        web::post().to(render_notification_controller),
    );
}
