//! Approximate absolute timestamps from relative-time text.
//!
//! "N years/months/weeks/days/hours/minutes/seconds ago" is converted by
//! subtracting `N × unit` from the current time, with a year of 365 days
//! and a month of 30 days. Anything else is tried as a calendar date, and
//! falls back to "now".

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn relative_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(\d+\s*|(?:an?|one)\s+)(year|month|week|day|hour|minute|second)s?\b")
            .unwrap_or_else(|e| panic!("relative time pattern is invalid: {e}"))
    })
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y"];

/// Duration of one `unit`, using calendar approximations.
fn unit_duration(unit: &str) -> Option<Duration> {
    match unit.to_ascii_lowercase().as_str() {
        "year" => Some(Duration::days(365)),
        "month" => Some(Duration::days(30)),
        "week" => Some(Duration::weeks(1)),
        "day" => Some(Duration::days(1)),
        "hour" => Some(Duration::hours(1)),
        "minute" => Some(Duration::minutes(1)),
        "second" => Some(Duration::seconds(1)),
        _ => None,
    }
}

/// Elapsed time described by `text`, if it is a relative form.
pub fn parse_relative(text: &str) -> Option<Duration> {
    let caps = relative_pattern().captures(text)?;
    let count: i32 = match caps[1].trim().to_ascii_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        digits => digits.parse().ok()?,
    };
    unit_duration(&caps[2])?.checked_mul(count)
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    DATE_FORMATS.iter().find_map(|format| {
        let date = NaiveDate::parse_from_str(text, format).ok()?;
        Utc.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
    })
}

/// Approximate publication time for a review's time text.
pub fn parse_review_time(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let text = text.trim();
    if text.is_empty() {
        return now;
    }
    if let Some(elapsed) = parse_relative(text) {
        return now.checked_sub_signed(elapsed).unwrap_or(now);
    }
    parse_absolute(text).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_years_ago_within_a_day() {
        let got = parse_review_time("2 years ago", now());
        let expected = now() - Duration::hours(2 * 365 * 24);
        assert!((got - expected).num_seconds().abs() <= 86_400);
    }

    #[test]
    fn test_minutes_ago_within_a_minute() {
        let got = parse_review_time("5 minutes ago", now());
        let expected = now() - Duration::seconds(5 * 60);
        assert!((got - expected).num_seconds().abs() <= 60);
    }

    #[test]
    fn test_every_unit() {
        let cases = [
            ("3 months ago", Duration::days(90)),
            ("1 week ago", Duration::days(7)),
            ("4 days ago", Duration::days(4)),
            ("6 hours ago", Duration::hours(6)),
            ("30 seconds ago", Duration::seconds(30)),
        ];
        for (text, elapsed) in cases {
            assert_eq!(parse_review_time(text, now()), now() - elapsed, "{text}");
        }
    }

    #[test]
    fn test_article_forms_count_as_one() {
        assert_eq!(parse_review_time("a year ago", now()), now() - Duration::days(365));
        assert_eq!(parse_review_time("an hour ago", now()), now() - Duration::hours(1));
        assert_eq!(
            parse_review_time("Edited a month ago", now()),
            now() - Duration::days(30)
        );
    }

    #[test]
    fn test_count_glued_to_unit() {
        assert_eq!(parse_review_time("2years ago", now()), now() - Duration::days(730));
        assert_eq!(parse_review_time("3weeks ago", now()), now() - Duration::weeks(3));
        // Articles still need a separating space.
        assert_eq!(parse_review_time("aday ago", now()), now());
    }

    #[test]
    fn test_absolute_dates() {
        assert_eq!(
            parse_review_time("2024-03-15", now()),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_review_time("March 15, 2024", now()),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_review_time("2024-03-15T10:30:00Z", now()),
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_unrecognized_defaults_to_now() {
        assert_eq!(parse_review_time("", now()), now());
        assert_eq!(parse_review_time("recently", now()), now());
        assert_eq!(parse_review_time("vor 2 Jahren", now()), now());
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        assert_eq!(parse_review_time("999999999999 years ago", now()), now());
        assert_eq!(parse_review_time("99999999 years ago", now()), now());
    }
}
