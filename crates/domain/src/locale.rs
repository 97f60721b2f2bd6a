use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Locales reminders can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    EnUs,
    EnGb,
    De,
    Fr,
    Es,
    It,
    Nl,
}

#[derive(Error, Debug, PartialEq)]
#[error("Unsupported locale: `{0}`")]
pub struct UnsupportedLocaleError(pub String);

struct Patterns {
    date: &'static str,
    date_time: &'static str,
    time: &'static str,
}

impl Default for Locale {
    fn default() -> Self {
        Self::EnUs
    }
}

impl Locale {
    /// Resolves a tag like `de`, `de_DE` or `en-GB`, falling back to `fallback`
    pub fn resolve(tag: Option<&str>, fallback: Locale) -> Self {
        tag.and_then(|t| t.parse().ok()).unwrap_or(fallback)
    }

    /// The language part of the locale, used to look up translated strings
    pub fn language(&self) -> &'static str {
        match self {
            Self::EnUs | Self::EnGb => "en",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::It => "it",
            Self::Nl => "nl",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::EnUs => "en_US",
            Self::EnGb => "en_GB",
            Self::De => "de_DE",
            Self::Fr => "fr_FR",
            Self::Es => "es_ES",
            Self::It => "it_IT",
            Self::Nl => "nl_NL",
        }
    }

    fn chrono_locale(&self) -> chrono::Locale {
        match self {
            Self::EnUs => chrono::Locale::en_US,
            Self::EnGb => chrono::Locale::en_GB,
            Self::De => chrono::Locale::de_DE,
            Self::Fr => chrono::Locale::fr_FR,
            Self::Es => chrono::Locale::es_ES,
            Self::It => chrono::Locale::it_IT,
            Self::Nl => chrono::Locale::nl_NL,
        }
    }

    fn patterns(&self) -> Patterns {
        match self {
            Self::EnUs => Patterns {
                date: "%B %-d, %Y",
                date_time: "%A, %B %-d, %Y %-I:%M %p",
                time: "%-I:%M %p",
            },
            Self::EnGb => Patterns {
                date: "%-d %B %Y",
                date_time: "%A, %-d %B %Y %H:%M",
                time: "%H:%M",
            },
            Self::De => Patterns {
                date: "%-d. %B %Y",
                date_time: "%A, %-d. %B %Y %H:%M",
                time: "%H:%M",
            },
            Self::Fr | Self::Es | Self::It | Self::Nl => Patterns {
                date: "%-d %B %Y",
                date_time: "%A %-d %B %Y %H:%M",
                time: "%H:%M",
            },
        }
    }

    /// Long date, e.g. `June 1, 2024`
    pub fn format_date(&self, dt: NaiveDateTime) -> String {
        self.format(dt, self.patterns().date)
    }

    /// Weekday, long date and time of day, e.g. `Saturday, June 1, 2024 10:00 AM`
    pub fn format_date_time(&self, dt: NaiveDateTime) -> String {
        self.format(dt, self.patterns().date_time)
    }

    /// Time of day, e.g. `10:00 AM`
    pub fn format_time(&self, dt: NaiveDateTime) -> String {
        self.format(dt, self.patterns().time)
    }

    fn format(&self, dt: NaiveDateTime, pattern: &str) -> String {
        // Only the wall-clock fields are rendered, the zone is irrelevant here
        Utc.from_utc_datetime(&dt)
            .format_localized(pattern, self.chrono_locale())
            .to_string()
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().replace('-', "_").to_lowercase();
        let mut parts = tag.split('_');
        let language = parts.next().unwrap_or_default();
        let region = parts.next();
        let locale = match (language, region) {
            ("en", Some("gb")) | ("en", Some("ie")) | ("en", Some("au")) => Self::EnGb,
            ("en", _) => Self::EnUs,
            ("de", _) => Self::De,
            ("fr", _) => Self::Fr,
            ("es", _) => Self::Es,
            ("it", _) => Self::It,
            ("nl", _) => Self::Nl,
            _ => return Err(UnsupportedLocaleError(s.to_string())),
        };
        Ok(locale)
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    #[test]
    fn parses_tags() {
        assert_eq!("en".parse::<Locale>(), Ok(Locale::EnUs));
        assert_eq!("en-GB".parse::<Locale>(), Ok(Locale::EnGb));
        assert_eq!("de_DE".parse::<Locale>(), Ok(Locale::De));
        assert_eq!("NL".parse::<Locale>(), Ok(Locale::Nl));
        assert!("tlh".parse::<Locale>().is_err());
        assert_eq!(Locale::resolve(Some("xx"), Locale::De), Locale::De);
        assert_eq!(Locale::resolve(None, Locale::EnUs), Locale::EnUs);
    }

    #[test]
    fn formats_in_english() {
        let l = Locale::EnUs;
        assert_eq!(l.format_date(dt()), "June 1, 2024");
        assert_eq!(l.format_time(dt()), "2:05 PM");
        assert_eq!(l.format_date_time(dt()), "Saturday, June 1, 2024 2:05 PM");
    }

    #[test]
    fn formats_in_german() {
        let l = Locale::De;
        assert_eq!(l.format_date(dt()), "1. Juni 2024");
        assert_eq!(l.format_time(dt()), "14:05");
        assert_eq!(l.format_date_time(dt()), "Samstag, 1. Juni 2024 14:05");
    }
}
