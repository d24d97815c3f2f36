//! The reference "now" that reports are computed against.

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Serde helpers for timezone-naive datetimes, e.g. `2024-01-15T09:30:00`.
pub(crate) mod datetime_format {
    use time::PrimitiveDateTime;

    time::serde::format_description!(
        iso_datetime,
        PrimitiveDateTime,
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    );

    pub use iso_datetime::{deserialize, serialize};
}

/// Where the current date and time comes from.
///
/// Reports never read the system clock themselves, the handlers ask the clock
/// in the app state and pass the result down.
#[derive(Debug, Clone, PartialEq)]
pub enum Clock {
    /// Wall-clock time in a canonical timezone, e.g. "Pacific/Auckland".
    Local(String),
    /// Always the same instant. Used for reproducible tests and demos.
    Fixed(PrimitiveDateTime),
}

impl Clock {
    /// The current local date and time.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the timezone of a
    /// [Clock::Local] is not a canonical timezone name.
    pub fn now(&self) -> Result<PrimitiveDateTime, Error> {
        match self {
            Clock::Fixed(now) => Ok(*now),
            Clock::Local(timezone) => {
                let offset = get_local_offset(timezone).ok_or_else(|| {
                    tracing::error!("Invalid timezone {}", timezone);
                    Error::InvalidTimezoneError(timezone.to_owned())
                })?;

                let now = OffsetDateTime::now_utc().to_offset(offset);

                Ok(PrimitiveDateTime::new(now.date(), now.time()))
            }
        }
    }
}

/// Get the current UTC offset for a canonical timezone name.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}
