// clipmine-core/tests/utils_tests.rs

use clipmine_core::utils::{
    calculate_size_reduction, format_bytes, format_duration, parse_ffmpeg_time,
};

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(0.0), "00:00:00");
    assert_eq!(format_duration(59.9), "00:00:59");
    assert_eq!(format_duration(61.0), "00:01:01");
    assert_eq!(format_duration(3661.0), "01:01:01");
    assert_eq!(format_duration(-1.0), "??:??:??");
}

#[test]
fn test_format_bytes() {
    assert_eq!(format_bytes(0), "0 B");
    assert_eq!(format_bytes(1023), "1023 B");
    assert_eq!(format_bytes(1536), "1.50 KiB");
    assert_eq!(format_bytes(50 * 1024 * 1024), "50.00 MiB");
    assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GiB");
}

#[test]
fn test_parse_ffmpeg_time() {
    assert_eq!(parse_ffmpeg_time("00:02:00.00"), Some(120.0));
    assert_eq!(parse_ffmpeg_time("01:00:01.50"), Some(3601.5));
    assert_eq!(parse_ffmpeg_time("2:00"), None);
    assert_eq!(parse_ffmpeg_time("N/A"), None);
}

#[test]
fn test_calculate_size_reduction() {
    assert_eq!(calculate_size_reduction(1000, 250), 75);
    assert_eq!(calculate_size_reduction(1000, 1200), 0);
    assert_eq!(calculate_size_reduction(0, 10), 0);
}
