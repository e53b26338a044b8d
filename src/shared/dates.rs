//! Calendar-day classification for checkpoint dates.
//!
//! Checkpoint dates are plain `YYYY-MM-DD` calendar days. They are parsed
//! field by field into a [`NaiveDate`] and compared against the device's
//! local calendar day, so a stored "2024-12-25" is Christmas everywhere and
//! never drifts a day backwards through a UTC-midnight conversion.
//!
//! The `*_on` variants take "today" explicitly; the plain variants read the
//! local clock.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::shared::constants::DATE_TBD;
use crate::shared::validation::DATE_REGEX;

/// Whether a checkpoint date is still ahead (today counts) or already over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStatus {
    Upcoming,
    Past,
}

/// Today's calendar date in the local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an ISO `YYYY-MM-DD` string into a local calendar day.
///
/// Returns `None` for anything that is not exactly a valid year-month-day.
pub fn parse_local_date(date: &str) -> Option<NaiveDate> {
    let caps = DATE_REGEX.captures(date.trim())?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let day = caps[3].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn classify(date: NaiveDate, today: NaiveDate) -> DateStatus {
    if date >= today {
        DateStatus::Upcoming
    } else {
        DateStatus::Past
    }
}

fn parse_opt(date: Option<&str>) -> Option<NaiveDate> {
    date.filter(|d| !d.trim().is_empty())
        .and_then(parse_local_date)
}

pub fn is_today(date: Option<&str>) -> bool {
    is_today_on(date, today())
}

pub fn is_today_on(date: Option<&str>, today: NaiveDate) -> bool {
    parse_opt(date).is_some_and(|d| d == today)
}

pub fn is_upcoming(date: Option<&str>) -> bool {
    is_upcoming_on(date, today())
}

/// True when the date is today or later. Missing dates are neither upcoming nor past.
pub fn is_upcoming_on(date: Option<&str>, today: NaiveDate) -> bool {
    parse_opt(date).is_some_and(|d| classify(d, today) == DateStatus::Upcoming)
}

pub fn is_past(date: Option<&str>) -> bool {
    is_past_on(date, today())
}

pub fn is_past_on(date: Option<&str>, today: NaiveDate) -> bool {
    parse_opt(date).is_some_and(|d| classify(d, today) == DateStatus::Past)
}

/// Display form of a date: the stored string as-is, or "Date TBD" when absent
pub fn format_date(date: Option<&str>) -> String {
    match date {
        Some(d) if !d.trim().is_empty() => d.to_string(),
        _ => DATE_TBD.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_local_date() {
        assert_eq!(parse_local_date("2024-12-25"), Some(day(2024, 12, 25)));
        assert_eq!(parse_local_date(" 2024-01-05 "), Some(day(2024, 1, 5)));
        assert_eq!(parse_local_date("2024-02-30"), None);
        assert_eq!(parse_local_date("2024-1-5"), None);
        assert_eq!(parse_local_date("2024-12-25T00:00:00Z"), None);
        assert_eq!(parse_local_date("tomorrow"), None);
    }

    #[test]
    fn test_today_counts_as_upcoming_not_past() {
        let today = day(2024, 12, 25);
        assert!(is_upcoming_on(Some("2024-12-25"), today));
        assert!(!is_past_on(Some("2024-12-25"), today));
        assert!(is_today_on(Some("2024-12-25"), today));
    }

    #[test]
    fn test_upcoming_and_past_are_exclusive_for_present_dates() {
        let today = day(2024, 6, 15);
        for d in ["2023-01-01", "2024-06-14", "2024-06-15", "2024-06-16", "2030-12-31"] {
            let upcoming = is_upcoming_on(Some(d), today);
            let past = is_past_on(Some(d), today);
            assert!(upcoming ^ past, "{} should be exactly one of upcoming/past", d);
        }
    }

    #[test]
    fn test_missing_dates_are_neither_upcoming_nor_past() {
        let today = day(2024, 6, 15);
        for d in [None, Some(""), Some("   ")] {
            assert!(!is_upcoming_on(d, today));
            assert!(!is_past_on(d, today));
            assert!(!is_today_on(d, today));
        }
    }

    #[test]
    fn test_is_today_uses_local_calendar_day() {
        // 03:00 UTC on Dec 26 is still Dec 25 in UTC-8
        let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 12, 26, 3, 0, 0)
            .unwrap()
            .with_timezone(&pacific);
        let local_today = now.date_naive();

        assert!(is_today_on(Some("2024-12-25"), local_today));
        assert!(!is_today_on(Some("2024-12-26"), local_today));
        assert!(is_upcoming_on(Some("2024-12-25"), local_today));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2024-12-25")), "2024-12-25");
        assert_eq!(format_date(None), "Date TBD");
        assert_eq!(format_date(Some("")), "Date TBD");
    }

    #[test]
    fn test_classify() {
        let today = day(2024, 3, 1);
        assert_eq!(classify(day(2024, 2, 29), today), DateStatus::Past);
        assert_eq!(classify(day(2024, 3, 1), today), DateStatus::Upcoming);
    }
}
