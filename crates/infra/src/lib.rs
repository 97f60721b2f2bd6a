mod config;
mod l10n;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use l10n::{t, t_args, t_plural, IStringCatalog, StaticCatalog};
pub use repos::{ClaimedReminders, DeleteResult, IReminderRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};
use tracing::info;

#[derive(Clone)]
pub struct ReminderContext {
    pub repos: Repos,
    pub services: Services,
    pub catalog: Arc<dyn IStringCatalog>,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

impl ReminderContext {
    async fn create(config: Config) -> Self {
        let repos = match &config.database_url {
            Some(url) => Repos::create_postgres(url)
                .await
                .expect("Postgres credentials must be valid"),
            None => {
                info!("DATABASE_URL is not set, reminders are kept in memory");
                Repos::create_inmemory()
            }
        };
        let services = match &config.platform_api_url {
            Some(url) => Services::create_platform(PlatformClient::new(
                url,
                config.platform_api_token.clone(),
            )),
            None => {
                info!("PLATFORM_API_URL is not set, using in memory collaborators");
                Services::create_inmemory()
            }
        };
        Self {
            repos,
            services,
            catalog: Arc::new(StaticCatalog::new()),
            config,
            sys: Arc::new(RealSys {}),
        }
    }

    /// Context where everything is kept in memory
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            services: Services::create_inmemory(),
            catalog: Arc::new(StaticCatalog::new()),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> ReminderContext {
    ReminderContext::create(Config::new()).await
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let connection_string = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            info!("DATABASE_URL is not set, skipping migrations");
            return Ok(());
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
