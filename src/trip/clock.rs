use crate::error::ValidationError;
use crate::features::DayOfWeek;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, Time};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// `09:05 PM`
const CLOCK_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12]:[minute] [period]");

/// Local wall-clock time, UTC when the local offset cannot be determined.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn departure_from(now: OffsetDateTime) -> (Time, DayOfWeek) {
    (now.time(), DayOfWeek::from(now.weekday()))
}

/// Parse `HH:MM` on a 24-hour clock. A single-digit hour is accepted.
pub fn parse_time_of_day(raw: &str) -> Result<Time, ValidationError> {
    let invalid = || ValidationError::InvalidTime(raw.to_string());
    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
        return Err(invalid());
    }
    let hour: u8 = hour.parse().map_err(|_| invalid())?;
    let minute: u8 = minute.parse().map_err(|_| invalid())?;
    Time::from_hms(hour, minute, 0).map_err(|_| invalid())
}

/// Clock time `minutes` after `departure`, wrapping past midnight.
pub fn arrival_time(departure: Time, minutes: f64) -> Result<Time, ValidationError> {
    if !minutes.is_finite() {
        return Err(ValidationError::NonFinite("predicted minutes"));
    }
    let offset = (minutes * 60.0).round().rem_euclid(SECONDS_PER_DAY) as i64;
    Ok(departure + Duration::seconds(offset))
}

pub fn format_clock(time: Time) -> Result<String, time::error::Format> {
    time.format(CLOCK_FORMAT)
}
