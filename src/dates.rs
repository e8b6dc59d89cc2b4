//! Timestamp parsing for server dates and user supplied filter arguments.

use crate::{Result, WishlistError};
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Format the collection API uses for `added` and `date_followed`.
const BANDCAMP_FORMAT: &str = "%d %b %Y %H:%M:%S GMT";

const NAIVE_FORMATS: &[&str] = &[
    BANDCAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn relative_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\s*(minute|hour|day|week|month|year)s?\s+ago$")
            .expect("relative date pattern is valid")
    })
}

/// Parse an absolute timestamp, as found in collection records.
///
/// Accepts Bandcamp's `21 Jan 2023 17:02:13 GMT`, RFC 3339, RFC 2822 and a
/// few ISO-like layouts. Timestamps without a zone are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a date given on the command line, relative to `now`.
///
/// On top of [`parse_timestamp`] this understands `today`, `yesterday`,
/// `now` and `N days ago` style expressions.
pub fn parse_user_date(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let normalized = value.trim().to_lowercase();

    let midnight = |dt: DateTime<Utc>| {
        dt.date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
    };

    let parsed = match normalized.as_str() {
        "now" => Some(now),
        "today" => midnight(now),
        "yesterday" => midnight(now - Duration::days(1)),
        _ => match relative_pattern().captures(&normalized) {
            Some(caps) => {
                let amount: u32 = caps[1].parse().map_err(|_| {
                    WishlistError::Configuration(format!("Date offset too large: '{value}'"))
                })?;
                match &caps[2] {
                    "minute" => now.checked_sub_signed(Duration::minutes(amount.into())),
                    "hour" => now.checked_sub_signed(Duration::hours(amount.into())),
                    "day" => now.checked_sub_signed(Duration::days(amount.into())),
                    "week" => now.checked_sub_signed(Duration::weeks(amount.into())),
                    "month" => now.checked_sub_months(Months::new(amount)),
                    "year" => amount
                        .checked_mul(12)
                        .and_then(|months| now.checked_sub_months(Months::new(months))),
                    _ => None,
                }
            }
            None => parse_timestamp(value),
        },
    };

    parsed.ok_or_else(|| WishlistError::Configuration(format!("Unrecognized date: '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_bandcamp_format() {
        assert_eq!(
            parse_timestamp("21 Jan 2023 17:02:13 GMT"),
            Some(at(2023, 1, 21, 17, 2, 13))
        );
    }

    #[test]
    fn test_iso_formats() {
        assert_eq!(
            parse_timestamp("2023-01-21T17:02:13+02:00"),
            Some(at(2023, 1, 21, 15, 2, 13))
        );
        assert_eq!(parse_timestamp("2023-01-21"), Some(at(2023, 1, 21, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("2023-01-21 08:30:00"),
            Some(at(2023, 1, 21, 8, 30, 0))
        );
        assert_eq!(parse_timestamp("last tuesday"), None);
    }

    #[test]
    fn test_relative_dates() {
        let now = at(2024, 3, 31, 12, 0, 0);
        assert_eq!(parse_user_date("3 days ago", now).unwrap(), at(2024, 3, 28, 12, 0, 0));
        assert_eq!(parse_user_date("2 weeks ago", now).unwrap(), at(2024, 3, 17, 12, 0, 0));
        assert_eq!(parse_user_date("1 month ago", now).unwrap(), at(2024, 2, 29, 12, 0, 0));
        assert_eq!(parse_user_date("1 Year Ago", now).unwrap(), at(2023, 3, 31, 12, 0, 0));
        assert_eq!(parse_user_date("yesterday", now).unwrap(), at(2024, 3, 30, 0, 0, 0));
        assert_eq!(parse_user_date("today", now).unwrap(), at(2024, 3, 31, 0, 0, 0));
    }

    #[test]
    fn test_user_date_falls_back_to_absolute() {
        let now = at(2024, 3, 31, 12, 0, 0);
        assert_eq!(parse_user_date("2020-05-01", now).unwrap(), at(2020, 5, 1, 0, 0, 0));
        assert!(matches!(
            parse_user_date("sometime", now),
            Err(WishlistError::Configuration(_))
        ));
    }
}
