//! Wall-clock helpers shared by services.
//!
//! # Invariants
//! - Stored timestamps are UTC epoch milliseconds.
//! - "Day" boundaries are evaluated in the server's local time zone.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

/// Current time as UTC epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Local calendar date containing `epoch_ms`.
pub fn local_date(epoch_ms: i64) -> NaiveDate {
    to_local(epoch_ms).date_naive()
}

/// Epoch milliseconds of local midnight on the day containing `epoch_ms`.
pub fn local_day_start_ms(epoch_ms: i64) -> i64 {
    let local = to_local(epoch_ms);
    epoch_ms
        - i64::from(local.num_seconds_from_midnight()) * 1000
        - i64::from(local.timestamp_subsec_millis())
}

/// Epoch milliseconds of local midnight starting `date`.
///
/// Returns `None` when midnight does not exist locally (DST gap).
pub fn local_date_start_ms(date: NaiveDate) -> Option<i64> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|value| value.timestamp_millis())
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn to_local(epoch_ms: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .unwrap_or_default()
        .with_timezone(&Local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_start_is_same_local_date_and_not_after_input() {
        let now = now_ms();
        let start = local_day_start_ms(now);
        assert!(start <= now);
        assert!(now - start < 24 * 60 * 60 * 1000 + 60 * 60 * 1000);
        assert_eq!(local_date(start), local_date(now));
    }

    #[test]
    fn parse_date_accepts_iso_day_only() {
        assert!(parse_date("2025-06-28").is_some());
        assert!(parse_date("2025/06/28").is_none());
        assert!(parse_date("2025-13-01").is_none());
    }
}
