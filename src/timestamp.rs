//! Timestamp parsing, formatting and epoch conversions shared by the
//! spreadsheet reader, the weather reader, the codec and the HTTP layer.
//!
//! All timestamps are naive. Inputs carrying an explicit offset (`Z`,
//! `+01:00`) are converted to UTC before the offset is dropped.

use crate::constants::{DATE_FORMATS, TIMESTAMP_FORMATS};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse a textual timestamp in any of the accepted layouts
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    if let Some(stripped) = text.strip_suffix('Z') {
        if let Some(naive) = parse_naive(stripped) {
            return Some(naive);
        }
    }

    parse_naive(text)
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// ISO-8601 rendering without offset; sub-second digits only when present
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

pub fn to_epoch_millis(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

pub fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Serials past this many days lie outside chrono's date range
const MAX_SERIAL_DAYS: f64 = 1.0e8;

/// Convert an Excel serial date (days since 1899-12-30) to a timestamp
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(chrono::Duration::try_milliseconds(millis)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_accepted_layouts() {
        let expected = ts("2021-01-01 23:00:00");
        assert_eq!(parse_timestamp("2021-01-01T23:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-01 23:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-01T23:00"), Some(expected));
        assert_eq!(parse_timestamp("01.01.2021 23:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-01T23:00:00.000Z"), Some(expected));
        assert_eq!(
            parse_timestamp("2021-01-02T00:00:00+01:00"),
            Some(expected)
        );
        assert_eq!(parse_timestamp("2021-01-01"), Some(ts("2021-01-01 00:00:00")));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2021-13-01"), None);
    }

    #[test]
    fn test_format_omits_zero_fraction() {
        assert_eq!(format_timestamp(&ts("2020-03-14 15:00:00")), "2020-03-14T15:00:00");
    }

    #[test]
    fn test_epoch_millis_conversion() {
        let t = ts("2020-07-31 20:00:00");
        let millis = to_epoch_millis(&t);
        assert_eq!(millis, 1_596_225_600_000);
        assert_eq!(from_epoch_millis(millis), Some(t));
    }

    #[test]
    fn test_excel_serial_conversion() {
        // 44197.5 is 2021-01-01 12:00 in the 1900 date system
        assert_eq!(from_excel_serial(44197.5), Some(ts("2021-01-01 12:00:00")));
        assert_eq!(from_excel_serial(f64::NAN), None);
    }

    #[test]
    fn test_excel_serial_out_of_range() {
        assert_eq!(from_excel_serial(-1e300), None);
        assert_eq!(from_excel_serial(1e300), None);
        assert_eq!(from_excel_serial(-1.1e8), None);
        assert!(from_excel_serial(-1.0e6).is_some());
    }
}
