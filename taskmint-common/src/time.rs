//! Timestamp utilities
//!
//! Stored timestamps are RFC 3339 UTC strings with a fixed microsecond
//! fraction, so lexical order in SQL equals chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::{Error, Result};

/// Current UTC timestamp at storage precision (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for storage
pub fn to_db_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn from_db_string(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_now_survives_storage_round_trip() {
        let ts = now();
        assert_eq!(from_db_string(&to_db_string(&ts)).unwrap(), ts);
    }

    #[test]
    fn test_db_string_has_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1);

        let sa = to_db_string(&a);
        let sb = to_db_string(&b);

        assert_eq!(sa, "2024-03-01T09:00:00.000000Z");
        assert_eq!(sa.len(), sb.len());
        assert!(sa < sb);
    }

    #[test]
    fn test_db_string_parses_back() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let parsed = from_db_string(&to_db_string(&ts)).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_from_db_string_rejects_garbage() {
        let result = from_db_string("yesterday");
        assert!(matches!(result, Err(Error::Internal(_))));
    }
}
