//! Due-date classification in the shop's local calendar.
//!
//! "Today" is always the wall-clock date in the shop's timezone, never the UTC date,
//! so a shop in Honolulu still sees "Due today" at 8pm local time. Every call site
//! goes through [`days_until_due`], which keeps labels, predicates and the priority
//! comparator in agreement.

use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// How urgent a due date is relative to the shop's today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDateUrgency {
    /// Past due by this many days (always >= 1)
    Overdue(i64),
    /// Due on the shop's current calendar day
    Today,
    /// Due on the next calendar day
    Tomorrow,
    /// Due this many days ahead (always >= 2)
    Upcoming(i64),
    /// No due date recorded
    NoDate,
}

impl DueDateUrgency {
    /// Classifies an optional due date against `today`.
    #[must_use]
    pub fn classify(due: Option<NaiveDate>, today: NaiveDate) -> Self {
        match due.map(|d| days_until_due(d, today)) {
            None => Self::NoDate,
            Some(0) => Self::Today,
            Some(1) => Self::Tomorrow,
            Some(n) if n > 1 => Self::Upcoming(n),
            Some(n) => Self::Overdue(-n),
        }
    }

    /// Short human label, e.g. `"Due in 3 days"` or `"1 day overdue"`.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::NoDate => "No due date".to_string(),
            Self::Today => "Due today".to_string(),
            Self::Tomorrow => "Due tomorrow".to_string(),
            Self::Upcoming(n) => format!("Due in {n} days"),
            Self::Overdue(1) => "1 day overdue".to_string(),
            Self::Overdue(n) => format!("{n} days overdue"),
        }
    }
}

/// Resolves an IANA timezone name such as `"America/Chicago"`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| Error::InvalidTimezone {
        name: name.to_string(),
    })
}

/// The shop's calendar date at instant `now`.
#[must_use]
pub fn shop_today(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// The shop's calendar date right now.
#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
    shop_today(tz, Utc::now())
}

/// Signed number of calendar days from `today` until `due`.
///
/// Zero means due today, negative means overdue by that many days.
#[must_use]
pub fn days_until_due(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// Parses a stored due date.
///
/// Accepts a plain `YYYY-MM-DD` calendar date, or an RFC 3339 timestamp whose date is
/// taken in the shop timezone. Empty or whitespace-only input means "no due date".
pub fn parse_due_date(raw: Option<&str>, tz: Tz) -> Result<Option<NaiveDate>> {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| Some(dt.with_timezone(&tz).date_naive()))
        .map_err(|_| Error::InvalidDate {
            value: value.to_string(),
        })
}

/// True when `due` is strictly before the shop's today.
#[must_use]
pub fn is_overdue(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    due.is_some_and(|d| days_until_due(d, today) < 0)
}

/// True when `due` is the shop's today.
#[must_use]
pub fn is_due_today(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    due.is_some_and(|d| days_until_due(d, today) == 0)
}

/// Label for an already-parsed due date.
#[must_use]
pub fn due_date_label(due: Option<NaiveDate>, today: NaiveDate) -> String {
    DueDateUrgency::classify(due, today).label()
}

/// Label for a stored date string, computed against the shop's current local day.
///
/// `None`, empty strings and whitespace all yield `"No due date"`.
pub fn get_detailed_due_date_display(raw: Option<&str>, tz: Tz) -> Result<String> {
    detailed_due_date_display_at(raw, tz, Utc::now())
}

/// Same as [`get_detailed_due_date_display`] with an explicit clock.
pub fn detailed_due_date_display_at(
    raw: Option<&str>,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<String> {
    let due = parse_due_date(raw, tz)?;
    Ok(due_date_label(due, shop_today(tz, now)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::{Days, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_labels_relative_to_today() {
        let today = day(2026, 3, 10);
        assert_eq!(due_date_label(None, today), "No due date");
        assert_eq!(due_date_label(Some(today), today), "Due today");
        assert_eq!(due_date_label(Some(day(2026, 3, 11)), today), "Due tomorrow");
        assert_eq!(due_date_label(Some(day(2026, 3, 15)), today), "Due in 5 days");
        assert_eq!(due_date_label(Some(day(2026, 3, 9)), today), "1 day overdue");
        assert_eq!(due_date_label(Some(day(2026, 3, 7)), today), "3 days overdue");
    }

    #[test]
    fn test_detailed_display_uses_shop_today() {
        let tz = chrono_tz::America::New_York;
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 16, 0, 0).unwrap();
        let today = shop_today(tz, now);
        let three_back = today.checked_sub_days(Days::new(3)).unwrap();

        let raw = three_back.format("%Y-%m-%d").to_string();
        assert_eq!(
            detailed_due_date_display_at(Some(&raw), tz, now).unwrap(),
            "3 days overdue"
        );
        let raw_today = today.format("%Y-%m-%d").to_string();
        assert_eq!(
            detailed_due_date_display_at(Some(&raw_today), tz, now).unwrap(),
            "Due today"
        );
        assert_eq!(
            detailed_due_date_display_at(None, tz, now).unwrap(),
            "No due date"
        );
        assert_eq!(
            detailed_due_date_display_at(Some("  "), tz, now).unwrap(),
            "No due date"
        );
    }

    #[test]
    fn test_shop_today_differs_from_utc_date() {
        // 03:00 UTC on the 16th is still the evening of the 15th in Los Angeles.
        let now = Utc.with_ymd_and_hms(2026, 6, 16, 3, 0, 0).unwrap();
        let la = chrono_tz::America::Los_Angeles;
        assert_eq!(shop_today(la, now), day(2026, 6, 15));
        assert_eq!(now.date_naive(), day(2026, 6, 16));

        assert_eq!(
            detailed_due_date_display_at(Some("2026-06-15"), la, now).unwrap(),
            "Due today"
        );
        assert_eq!(
            detailed_due_date_display_at(Some("2026-06-15"), chrono_tz::UTC, now).unwrap(),
            "1 day overdue"
        );
    }

    #[test]
    fn test_parse_due_date_formats() {
        let tz = chrono_tz::America::Chicago;
        assert_eq!(
            parse_due_date(Some("2026-01-05"), tz).unwrap(),
            Some(day(2026, 1, 5))
        );
        // Late evening UTC-6 stored as UTC timestamp on the next day
        assert_eq!(
            parse_due_date(Some("2026-01-06T02:30:00Z"), tz).unwrap(),
            Some(day(2026, 1, 5))
        );
        assert_eq!(parse_due_date(Some(""), tz).unwrap(), None);
        assert!(matches!(
            parse_due_date(Some("next tuesday"), tz),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_predicates_agree_with_labels() {
        let today = day(2026, 3, 10);
        for offset in -5_i64..=5 {
            let due = today + chrono::Duration::days(offset);
            let label = due_date_label(Some(due), today);
            assert_eq!(is_overdue(Some(due), today), label.ends_with("overdue"));
            assert_eq!(is_due_today(Some(due), today), label == "Due today");
        }
        assert!(!is_overdue(None, today));
        assert!(!is_due_today(None, today));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(
            parse_timezone("Europe/London").unwrap(),
            chrono_tz::Europe::London
        );
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(Error::InvalidTimezone { .. })
        ));
    }
}
