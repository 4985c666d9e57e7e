//! Month and date parsing helpers.

use crate::error::ReportError;
use crate::events::types::Period;
use chrono::NaiveDate;

/// Parse a month given as `MM-YYYY` (configuration style) or `YYYY-MM`.
///
/// `_` and `/` are accepted as separators as well, and single-digit months
/// are allowed (`8-2025`).
pub fn parse_month(value: &str) -> Result<Period, ReportError> {
    let invalid = || ReportError::InvalidMonth(value.to_string());
    let trimmed = value.trim();
    let (first, second) = trimmed
        .split_once(['-', '_', '/'])
        .ok_or_else(invalid)?;

    let (month, year) = if first.len() == 4 {
        (second, first)
    } else {
        (first, second)
    };

    if year.len() != 4 {
        return Err(invalid());
    }
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;

    Period::new(year, month).ok_or_else(invalid)
}

/// Parse the `YYYY-MM-DD` date that must open a log line.
///
/// Returns `None` when the first ten bytes are not a well-formed calendar
/// date, which callers treat as "not a record".
pub fn parse_leading_date(line: &str) -> Option<NaiveDate> {
    let head = line.as_bytes().get(..10)?;
    let shape_ok = head.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }

    // The ten bytes are ASCII, so this slice is on a char boundary.
    let text = &line[..10];
    let year = text[0..4].parse().ok()?;
    let month = text[5..7].parse().ok()?;
    let day = text[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format a date the way it appears in the Detail and Summary sheets.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_month_config_style() {
        let p = parse_month("08-2025").unwrap();
        assert_eq!((p.year(), p.month()), (2025, 8));
    }

    #[test]
    fn test_parse_month_iso_style() {
        let p = parse_month("2025-10").unwrap();
        assert_eq!((p.year(), p.month()), (2025, 10));
        assert_eq!(parse_month("9_2025").unwrap().month(), 9);
    }

    #[test]
    fn test_parse_month_rejects_garbage() {
        assert!(parse_month("13-2025").is_err());
        assert!(parse_month("2025").is_err());
        assert!(parse_month("aa-bbbb").is_err());
        assert!(parse_month("08-25").is_err());
    }

    #[test]
    fn test_parse_leading_date() {
        let d = parse_leading_date("2025-08-02 03:14:07 UTC triggered").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2025, 8, 2));
    }

    #[test]
    fn test_parse_leading_date_rejects() {
        assert!(parse_leading_date("Aug 2 2025 something").is_none());
        assert!(parse_leading_date(" 2025-08-02 indented").is_none());
        assert!(parse_leading_date("2025-02-30 impossible day").is_none());
        assert!(parse_leading_date("2025-08").is_none());
        assert!(parse_leading_date("").is_none());
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
        assert_eq!(format_date(d), "2025-08-02");
    }
}
