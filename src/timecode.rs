//! Timestamp rendering for reports.

use std::time::Duration;

/// Render a timestamp as `MM:SS`, `HH:MM:SS`, or `Dd:HH:MM:SS`.
///
/// Sub-second precision is truncated. Hours are shown once the timestamp
/// reaches one hour, days once it reaches one day.
///
/// ```
/// use std::time::Duration;
///
/// use shotdetect::format_timestamp;
///
/// assert_eq!(format_timestamp(Duration::ZERO), "00:00");
/// assert_eq!(format_timestamp(Duration::from_millis(61_000)), "01:01");
/// assert_eq!(format_timestamp(Duration::from_millis(3_661_000)), "01:01:01");
/// assert_eq!(format_timestamp(Duration::from_millis(90_061_000)), "1d:01:01:01");
/// ```
pub fn format_timestamp(timestamp: Duration) -> String {
    let mut remaining = timestamp.as_secs();
    let seconds = remaining % 60;
    remaining /= 60;
    let minutes = remaining % 60;
    remaining /= 60;
    let hours = remaining % 24;
    let days = remaining / 24;

    match (days, hours) {
        (0, 0) => format!("{minutes:02}:{seconds:02}"),
        (0, _) => format!("{hours:02}:{minutes:02}:{seconds:02}"),
        _ => format!("{days}d:{hours:02}:{minutes:02}:{seconds:02}"),
    }
}
