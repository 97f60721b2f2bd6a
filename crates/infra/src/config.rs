use calendar_reminders_domain::{Locale, Tz};
use calendar_reminders_utils::create_random_secret;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Secret expected in the `x-reminders-api-key` header of mutating requests
    pub api_secret: String,
    /// Port for the application to run on
    pub port: usize,
    /// Seconds between each scan for due reminders run by the service itself.
    /// `0` means scans are only triggered externally.
    pub scan_interval_secs: u64,
    /// How long in millis a scan owns the reminders it claimed. Claims of a
    /// crashed scan are handed out again after this.
    pub claim_lease_millis: i64,
    /// Used for users without a preferred locale
    pub default_locale: Locale,
    /// Floating times and all-day events are interpreted in this timezone
    pub default_timezone: Tz,
    pub mail_from_address: String,
    pub mail_from_name: String,
    pub database_url: Option<String>,
    pub platform_api_url: Option<String>,
    pub platform_api_token: String,
}

fn env_or<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn new() -> Self {
        let api_secret = match env_opt("REMINDERS_API_SECRET") {
            Some(secret) => secret,
            None => {
                info!("Did not find REMINDERS_API_SECRET environment variable. Going to create one.");
                let secret = create_random_secret(16);
                info!("Secret for the reminders api was generated and set to: {}", secret);
                secret
            }
        };
        let default_locale = match env_opt("DEFAULT_LOCALE") {
            Some(tag) => match tag.parse::<Locale>() {
                Ok(locale) => locale,
                Err(e) => {
                    warn!("{}, falling back to: {}.", e, Locale::default());
                    Locale::default()
                }
            },
            None => Locale::default(),
        };
        let default_timezone = match env_opt("DEFAULT_TIMEZONE") {
            Some(tz) => match tz.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    warn!(
                        "The given DEFAULT_TIMEZONE: {} is not valid, falling back to UTC.",
                        tz
                    );
                    Tz::UTC
                }
            },
            None => Tz::UTC,
        };
        let claim_lease_secs = env_or("REMINDER_CLAIM_LEASE_SECS", 300u64);

        Self {
            api_secret,
            port: env_or("PORT", 5000usize),
            scan_interval_secs: env_or("REMINDER_SCAN_INTERVAL_SECS", 60u64),
            claim_lease_millis: claim_lease_secs as i64 * 1000,
            default_locale,
            default_timezone,
            mail_from_address: env_opt("MAIL_FROM_ADDRESS")
                .unwrap_or_else(|| "reminders-noreply@localhost".into()),
            mail_from_name: env_opt("MAIL_FROM_NAME").unwrap_or_else(|| "Calendar".into()),
            database_url: env_opt("DATABASE_URL"),
            platform_api_url: env_opt("PLATFORM_API_URL"),
            platform_api_token: env_opt("PLATFORM_API_TOKEN").unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
