//! Resolves the server's configured timezone into offsets and dates.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset of a canonical timezone, e.g. "Pacific/Auckland".
///
/// Returns `None` if the timezone name is not in the timezone database.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Get today's date in the timezone `canonical_timezone`.
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if the timezone name is not valid.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;

    use crate::{Error, timezone::{get_local_offset, local_today}};

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn unknown_timezone_has_no_offset() {
        assert_eq!(get_local_offset("Middle/Earth"), None);
    }

    #[test]
    fn local_today_fails_on_unknown_timezone() {
        assert_eq!(
            local_today("Middle/Earth"),
            Err(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }

    #[test]
    fn local_today_is_within_a_day_of_utc() {
        let utc_today = time::OffsetDateTime::now_utc().date();

        let today = local_today("Pacific/Auckland").unwrap();

        assert!((today - utc_today).whole_days().abs() <= 1);
    }
}
