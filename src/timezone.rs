use time::{Date, Duration, OffsetDateTime, UtcOffset};
use time_tz::{Offset, PrimitiveDateTimeExt, TimeZone, Tz};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date-time in `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// # Errors
///
/// Returns [Error::InvalidTimezone] if `canonical_timezone` is not a known timezone.
pub fn local_now(canonical_timezone: &str) -> Result<OffsetDateTime, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset))
}

/// Look up a canonical timezone name, e.g. "Pacific/Auckland".
///
/// # Errors
///
/// Returns [Error::InvalidTimezone] if `canonical_timezone` is not a known timezone.
pub fn get_timezone(canonical_timezone: &str) -> Result<&'static Tz, Error> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))
}

/// The instant `date` begins in `tz`.
///
/// This is local midnight with the offset in effect at midnight, which differs
/// from the offset later in the day when the clocks change. If midnight
/// happens twice the earlier one is used. If the clocks skip midnight the day
/// begins at the end of the gap.
pub fn start_of_day(date: Date, tz: &Tz) -> Result<OffsetDateTime, Error> {
    let midnight = date.midnight();

    (0..=4)
        .filter_map(|half_hours| midnight.checked_add(Duration::minutes(30 * half_hours)))
        .find_map(|local| local.assume_timezone(tz).take_first())
        .ok_or_else(|| Error::InvalidPeriod(format!("{date} has no start in {}", tz.name())))
}
