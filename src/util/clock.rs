//! Wall-clock helpers.

use time::OffsetDateTime;

/// Milliseconds since the Unix epoch for `time`.
pub fn epoch_millis(time: OffsetDateTime) -> i64 {
    (time.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    epoch_millis(OffsetDateTime::now_utc())
}
