//! Conversion between filesystem timestamps and cached milliseconds.
//!
//! Cached mtimes are whole milliseconds since the Unix epoch. Sub-millisecond
//! precision is floored away, so a restored mtime reads back as exactly the
//! cached value.

use filetime::FileTime;

const MILLIS_PER_SEC: i64 = 1_000;
const NANOS_PER_MILLI: u32 = 1_000_000;

/// Floor a filesystem timestamp to milliseconds since the epoch.
#[must_use]
pub fn to_millis(time: FileTime) -> i64 {
    time.unix_seconds()
        .saturating_mul(MILLIS_PER_SEC)
        .saturating_add(i64::from(time.nanoseconds() / NANOS_PER_MILLI))
}

/// Build a filesystem timestamp from milliseconds since the epoch.
#[must_use]
pub fn from_millis(millis: i64) -> FileTime {
    let seconds = millis.div_euclid(MILLIS_PER_SEC);
    // rem_euclid is in 0..1000
    let nanos = millis.rem_euclid(MILLIS_PER_SEC) as u32 * NANOS_PER_MILLI;
    FileTime::from_unix_time(seconds, nanos)
}
