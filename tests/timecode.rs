//! Report timestamp formatting tests.

use std::time::Duration;

use shotdetect::format_timestamp;

fn millis(value: u64) -> String {
    format_timestamp(Duration::from_millis(value))
}

#[test]
fn minutes_and_seconds() {
    assert_eq!(millis(0), "00:00");
    assert_eq!(millis(999), "00:00");
    assert_eq!(millis(61_000), "01:01");
    assert_eq!(millis(3_599_999), "59:59");
}

#[test]
fn hours_appear_from_one_hour() {
    assert_eq!(millis(3_600_000), "01:00:00");
    assert_eq!(millis(3_661_000), "01:01:01");
    assert_eq!(millis(86_399_000), "23:59:59");
}

#[test]
fn days_appear_from_one_day() {
    assert_eq!(millis(86_400_000), "1d:00:00:00");
    assert_eq!(millis(90_061_000), "1d:01:01:01");
    assert_eq!(millis(12 * 86_400_000 + 5_000), "12d:00:00:05");
}
