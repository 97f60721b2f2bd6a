use chrono::{Days, Duration, Months, NaiveDateTime};
use std::convert::TryFrom;
use std::str::FromStr;
use thiserror::Error;

/// A duration as written in `DURATION` and relative `TRIGGER` values,
/// e.g. `-PT15M`, `P1DT2H` or `P2W`.
///
/// Calendar units (years, months, weeks, days) are kept apart from exact units
/// (hours, minutes, seconds) because adding a month or a day to a date-time depends
/// on where in the calendar it is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IcalDuration {
    pub negative: bool,
    pub months: u32,
    pub days: u64,
    pub seconds: u64,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid duration: `{0}`")]
pub struct InvalidDurationError(pub String);

impl IcalDuration {
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            negative: minutes < 0,
            seconds: minutes.unsigned_abs() * 60,
            ..Default::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.seconds == 0
    }

    /// True when the duration has no hour, minute or second component
    pub fn is_whole_days(&self) -> bool {
        self.seconds == 0
    }

    /// Applies the duration to a wall-clock time. Calendar units are applied before exact units.
    pub fn add_to(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        let months = Months::new(self.months);
        let days = Days::new(self.days);
        let seconds = Duration::seconds(i64::try_from(self.seconds).ok()?);
        if self.negative {
            dt.checked_sub_months(months)?
                .checked_sub_days(days)?
                .checked_sub_signed(seconds)
        } else {
            dt.checked_add_months(months)?
                .checked_add_days(days)?
                .checked_add_signed(seconds)
        }
    }
}

impl FromStr for IcalDuration {
    type Err = InvalidDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDurationError(s.to_string());
        let value = s.trim();

        let (negative, rest) = match value.as_bytes().first() {
            Some(b'-') => (true, &value[1..]),
            Some(b'+') => (false, &value[1..]),
            _ => (false, value),
        };
        let rest = rest
            .strip_prefix('P')
            .or_else(|| rest.strip_prefix('p'))
            .ok_or_else(invalid)?;

        let mut duration = IcalDuration {
            negative,
            ..Default::default()
        };
        let mut in_time = false;
        let mut time_components = 0;
        let mut components = 0;
        let mut number = String::new();

        for c in rest.chars() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            let designator = c.to_ascii_uppercase();
            if designator == 'T' {
                if in_time || !number.is_empty() {
                    return Err(invalid());
                }
                in_time = true;
                continue;
            }
            if number.is_empty() {
                return Err(invalid());
            }
            let n = number.parse::<u64>().map_err(|_| invalid())?;
            number.clear();
            match (in_time, designator) {
                (false, 'Y') => {
                    let years = u32::try_from(n).map_err(|_| invalid())?;
                    duration.months += years.checked_mul(12).ok_or_else(invalid)?;
                }
                (false, 'M') => {
                    duration.months += u32::try_from(n).map_err(|_| invalid())?;
                }
                (false, 'W') => duration.days += n.checked_mul(7).ok_or_else(invalid)?,
                (false, 'D') => duration.days += n,
                (true, 'H') => duration.seconds += n.checked_mul(3600).ok_or_else(invalid)?,
                (true, 'M') => duration.seconds += n.checked_mul(60).ok_or_else(invalid)?,
                (true, 'S') => duration.seconds += n,
                _ => return Err(invalid()),
            }
            components += 1;
            if in_time {
                time_components += 1;
            }
        }

        // Trailing digits without a designator, an empty duration or a dangling `T`
        if !number.is_empty() || components == 0 || (in_time && time_components == 0) {
            return Err(invalid());
        }

        Ok(duration)
    }
}
