mod telemetry;

use calendar_reminders_api::Application;
use calendar_reminders_infra::{run_migration, setup_context};
use telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber("calendar_reminders".into(), "info".into());
    init_subscriber(subscriber);

    run_migration()
        .await
        .expect("Database migrations to succeed");
    let context = setup_context().await;

    let app = Application::new(context).await?;
    app.start().await
}
