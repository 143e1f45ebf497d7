use chrono::{DateTime, NaiveDateTime, Utc};

/// SQLite's `CURRENT_TIMESTAMP` format (UTC, no zone marker).
const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a timestamp the way SQLite's `CURRENT_TIMESTAMP` does.
///
/// Columns that get compared against `CURRENT_TIMESTAMP` in SQL (token
/// expiry, ledger times) must be written in this format so that plain
/// string comparison orders correctly.
pub fn format_sqlite(t: DateTime<Utc>) -> String {
    t.format(SQLITE_FORMAT).to_string()
}

/// Parse a stored timestamp: RFC 3339 first, then the SQLite
/// `CURRENT_TIMESTAMP` shape. Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, SQLITE_FORMAT)
        .ok()
        .map(|n| n.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_both_stored_formats() {
        let rfc = parse_timestamp("2026-08-25T10:30:00+00:00").unwrap();
        let lite = parse_timestamp("2026-08-25 10:30:00").unwrap();
        assert_eq!(rfc, lite);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn sqlite_format_roundtrips() {
        let t = Utc.with_ymd_and_hms(2026, 8, 25, 1, 2, 3).unwrap();
        let s = format_sqlite(t);
        assert_eq!(s, "2026-08-25 01:02:03");
        assert_eq!(parse_timestamp(&s).unwrap(), t);
    }
}
