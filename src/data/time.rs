use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-time layouts tried after RFC 3339, in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

/// Layouts with an explicit UTC offset but a space separator.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f %#z"];

/// Date-only layouts, read as midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Layout used when timestamps are written back out. `%.f` prints nothing
/// for whole seconds, so this reads back through `DATETIME_FORMATS`.
pub const EXPORT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse a timestamp, ISO-8601 first. Values carrying an offset are
/// converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(EXPORT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn iso_forms() {
        let expected = ymd_hms(2024, 3, 1, 12, 30, 0);
        assert_eq!(parse_timestamp("2024-03-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T07:30:00-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 07:30:00-05:00"), Some(expected));
    }

    #[test]
    fn fallback_forms() {
        assert_eq!(
            parse_timestamp("03/01/2024 12:30"),
            Some(ymd_hms(2024, 3, 1, 12, 30, 0))
        );
        assert_eq!(
            parse_timestamp("2024/03/01"),
            Some(ymd_hms(2024, 3, 1, 0, 0, 0))
        );
        assert_eq!(
            parse_timestamp("01.03.2024"),
            Some(ymd_hms(2024, 3, 1, 0, 0, 0))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }

    #[test]
    fn export_format_reads_back() {
        let whole = ymd_hms(2024, 3, 1, 12, 30, 5);
        assert_eq!(format_timestamp(&whole), "2024-03-01 12:30:05");
        assert_eq!(parse_timestamp(&format_timestamp(&whole)), Some(whole));

        let fractional = whole + chrono::Duration::milliseconds(250);
        let text = format_timestamp(&fractional);
        assert_eq!(text, "2024-03-01 12:30:05.250");
        assert_eq!(parse_timestamp(&text), Some(fractional));
    }
}
