use chrono::{
    offset::LocalResult, DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike,
    Utc, Weekday,
};
use chrono_tz::Tz;

use crate::error::{AppError, AppResult};
use crate::models::scheduling::TimeRange;

pub fn add_minutes(dt: DateTime<Utc>, minutes: i64) -> AppResult<DateTime<Utc>> {
    Duration::try_minutes(minutes)
        .and_then(|delta| dt.checked_add_signed(delta))
        .ok_or_else(|| AppError::invalid_input("time arithmetic out of range"))
}

pub fn add_days(dt: DateTime<Utc>, days: i64) -> AppResult<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|delta| dt.checked_add_signed(delta))
        .ok_or_else(|| AppError::invalid_input("time arithmetic out of range"))
}

/// Half-open overlap of `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Resolves a local wall-clock time on `day` to an instant. DST gaps yield
/// `None`; ambiguous times resolve to the earlier instant.
pub fn local_instant(day: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&day.and_time(time)) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, _) => Some(first.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Instants bounding a local range on `day`.
pub fn local_range(day: NaiveDate, range: &TimeRange, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_instant(day, range.start, tz)?;
    let end = local_instant(day, range.end, tz)?;
    (end > start).then_some((start, end))
}

pub fn local_hour(dt: DateTime<Utc>, tz: Tz) -> u32 {
    dt.with_timezone(&tz).hour()
}

pub fn local_weekday(dt: DateTime<Utc>, tz: Tz) -> Weekday {
    dt.with_timezone(&tz).weekday()
}

pub fn local_date(dt: DateTime<Utc>, tz: Tz) -> NaiveDate {
    dt.with_timezone(&tz).date_naive()
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Calendar days from `start` to `end`, both inclusive.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}
