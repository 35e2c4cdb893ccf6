use chrono::{DateTime, Utc};

/// Difference between the FILETIME epoch (1601-01-01) and the Unix epoch,
/// in 100ns ticks.
const EPOCH_DIFFERENCE_TICKS: u64 = 116_444_736_000_000_000;

/// Convert a FILETIME (100ns ticks since 1601-01-01 UTC) to Unix seconds.
/// Returns `None` for timestamps before 1970.
#[inline]
pub(crate) fn filetime_to_unix(filetime: u64) -> Option<i64> {
    let ticks = filetime.checked_sub(EPOCH_DIFFERENCE_TICKS)?;
    i64::try_from(ticks / 10_000_000).ok()
}

/// Render a FILETIME as `YYYY.MM.DD-HH:MM:SS` (UTC).
/// Returns `None` when the value has no calendar representation; callers
/// fall back to printing the raw value in hex.
pub(crate) fn format_filetime(filetime: u64) -> Option<String> {
    let unix = filetime_to_unix(filetime)?;
    let datetime: DateTime<Utc> = DateTime::from_timestamp(unix, 0)?;
    Some(datetime.format("%Y.%m.%d-%H:%M:%S").to_string())
}
