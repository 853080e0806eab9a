//! PDF date parsing
//!
//! PDF dates are strings of the form `D:YYYYMMDDHHmmSSOHH'mm'`, where every
//! field after the year is optional and `O` is `+`, `-` or `Z`.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

/// Parse a PDF date string
///
/// Supported forms:
/// - `D:2023` → 2023-01-01 00:00:00 UTC
/// - `D:20230303120000` → local time with no offset, treated as UTC
/// - `D:20230303120000Z`
/// - `D:20230303120000+01'00'` (trailing apostrophe optional)
/// - the same without the `D:` prefix
pub fn parse_pdf_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);

    // Split the digit run from the timezone designator
    let digits_end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, zone) = value.split_at(digits_end);

    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(s) => s.parse().ok(),
            None => Some(default),
        }
    };

    let year: i32 = digits[..4].parse().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let offset = parse_offset(zone)?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    offset.from_local_datetime(&naive).single()
}

/// Parse the timezone part of a PDF date (`Z`, `+HH'mm'`, `-HH`, or empty)
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    let sign = match zone.chars().next() {
        None | Some('Z') | Some('z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };

    let rest: String = zone[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = rest.get(..2).unwrap_or("0").parse().ok()?;
    let minutes: i32 = rest.get(2..4).unwrap_or("0").parse().ok()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Format a date for display (e.g., "March 3, 2023")
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_full_date_with_offset() {
        let date = parse_pdf_date("D:20230303142530+01'00'").unwrap();
        assert_eq!(date.year(), 2023);
        assert_eq!(date.month(), 3);
        assert_eq!(date.day(), 3);
        assert_eq!(date.hour(), 14);
        assert_eq!(date.minute(), 25);
        assert_eq!(date.second(), 30);
        assert_eq!(date.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_parse_negative_offset_without_trailing_quote() {
        let date = parse_pdf_date("D:20230303142530-05'30").unwrap();
        assert_eq!(date.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
    }

    #[test]
    fn test_parse_utc_date() {
        let date = parse_pdf_date("D:20230303120000Z").unwrap();
        assert_eq!(date.offset().local_minus_utc(), 0);
        assert_eq!(date.hour(), 12);
    }

    #[test]
    fn test_parse_year_only() {
        let date = parse_pdf_date("D:2023").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2023, 1, 1));
    }

    #[test]
    fn test_parse_without_prefix() {
        assert!(parse_pdf_date("20230303").is_some());
    }

    #[test]
    fn test_parse_invalid_dates() {
        assert!(parse_pdf_date("").is_none());
        assert!(parse_pdf_date("D:20").is_none());
        assert!(parse_pdf_date("D:20231340").is_none());
        assert!(parse_pdf_date("yesterday").is_none());
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 3).unwrap();
        assert_eq!(format_date(&date), "March 3, 2023");
    }
}
