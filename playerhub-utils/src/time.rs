use chrono::{DateTime, Utc};

use crate::parse::{ISO_DATE_FORMAT, parse_iso_date};

/// Shown in place of timestamps chrono cannot represent.
pub const UNKNOWN_DATE: &str = "unknown";

/// Return the current unix timestamp in seconds.
pub fn now_unix_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

fn from_unix_secs(secs: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)
}

/// Midnight UTC of an ISO `YYYY-MM-DD` date, if valid and not before the epoch.
pub fn unix_from_iso_date(raw: &str) -> Option<u64> {
    let midnight = parse_iso_date(raw)?.and_hms_opt(0, 0, 0)?;
    u64::try_from(midnight.and_utc().timestamp()).ok()
}

/// Format a unix timestamp as `YYYY-MM-DD` (UTC).
pub fn format_unix_date(secs: u64) -> String {
    from_unix_secs(secs).map_or_else(
        || UNKNOWN_DATE.to_owned(),
        |at| at.format(ISO_DATE_FORMAT).to_string(),
    )
}

/// Format a unix timestamp as `YYYY-MM-DD HH:MM` (UTC).
pub fn format_unix_datetime(secs: u64) -> String {
    from_unix_secs(secs).map_or_else(
        || UNKNOWN_DATE.to_owned(),
        |at| at.format("%Y-%m-%d %H:%M").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::{UNKNOWN_DATE, format_unix_date, format_unix_datetime, unix_from_iso_date};

    #[test]
    fn epoch_is_first_of_january_1970() {
        assert_eq!(format_unix_date(0), "1970-01-01");
    }

    #[test]
    fn handles_leap_days() {
        // 2024-02-29T12:00:00Z
        assert_eq!(format_unix_date(1_709_208_000), "2024-02-29");
        assert_eq!(format_unix_date(1_709_251_200), "2024-03-01");
    }

    #[test]
    fn datetime_includes_hours_and_minutes() {
        // 2015-05-19T08:30:00Z
        assert_eq!(format_unix_datetime(1_432_024_200), "2015-05-19 08:30");
    }

    #[test]
    fn unrepresentable_timestamps_are_not_rendered_as_dates() {
        assert_eq!(format_unix_date(u64::MAX), UNKNOWN_DATE);
        assert_eq!(format_unix_datetime(u64::MAX), UNKNOWN_DATE);
    }

    #[test]
    fn iso_dates_become_midnight_timestamps() {
        assert_eq!(unix_from_iso_date("2015-05-19"), Some(1_431_993_600));
        assert_eq!(unix_from_iso_date("1969-12-31"), None);
        assert_eq!(unix_from_iso_date("2015-02-30"), None);
        assert_eq!(unix_from_iso_date("+015-05-19"), None);
    }
}
