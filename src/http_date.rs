//! RFC 7231 HTTP-date (IMF-fixdate) parsing and formatting.
//!
//! Only the preferred fixed-GMT form is accepted, e.g. `Mon, 02 Jan 2006 15:04:05 GMT`.
//! The weekday name must be present but is not checked against the date.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `strftime`-style layout of an IMF-fixdate.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Layout after the `"<weekday>, "` prefix.
const DATE_TIME_FORMAT: &str = "%d %b %Y %H:%M:%S GMT";

/// Parse an IMF-fixdate into a UTC timestamp. Returns `None` on any mismatch.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let (weekday, rest) = value.trim().split_once(", ")?;
    if weekday.is_empty() || !weekday.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(rest, DATE_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a timestamp as an IMF-fixdate. Sub-second precision is dropped.
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

/// HTTP-date for `now` offset by `delta_seconds` (negative = in the past).
pub fn http_date_from_now(now: DateTime<Utc>, delta_seconds: i64) -> String {
    format_http_date(now + chrono::Duration::seconds(delta_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_reference_date() {
        let parsed = parse_http_date("Mon, 02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
    }

    #[test]
    fn weekday_is_not_cross_checked() {
        let parsed = parse_http_date("Tue, 02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
        assert!(parse_http_date("02 Jan 2006 15:04:05 GMT").is_none());
        assert!(parse_http_date("1, 02 Jan 2006 15:04:05 GMT").is_none());
    }

    #[test]
    fn format_matches_layout() {
        let at = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(format_http_date(at), "Wed, 21 Oct 2015 07:28:00 GMT");
    }

    #[test]
    fn rejects_other_layouts() {
        assert!(parse_http_date("2006-01-02T15:04:05Z").is_none());
        assert!(parse_http_date("Monday, 02-Jan-06 15:04:05 GMT").is_none());
        assert!(parse_http_date("Mon, 02 Jan 2006 15:04:05 UTC").is_none());
        assert!(parse_http_date("").is_none());
    }

    #[test]
    fn offset_from_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(http_date_from_now(now, 30), "Mon, 01 Jan 2024 00:00:30 GMT");
        assert_eq!(http_date_from_now(now, -1), "Sun, 31 Dec 2023 23:59:59 GMT");
    }
}
