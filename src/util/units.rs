//! Units formatting and conversion utilities
//!
//! Bandwidth is reported in MB/s where 1 MB = 1,048,576 bytes.

use std::time::Duration;

use crate::MB;

/// Convert a byte count into (binary) megabytes
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / MB as f64
}

/// Format a byte count as megabytes, dropping the fraction for whole values
///
/// # Examples
/// ```
/// use bwprobe::util::units::format_megabytes;
///
/// assert_eq!(format_megabytes(64 * 1024 * 1024), "64 MB");
/// assert_eq!(format_megabytes(512 * 1024), "0.50 MB");
/// ```
pub fn format_megabytes(bytes: u64) -> String {
    if bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{:.2} MB", bytes_to_mb(bytes))
    }
}

/// Format bytes into human-readable size with appropriate units
///
/// # Examples
/// ```
/// use bwprobe::util::units::format_bytes;
///
/// assert_eq!(format_bytes(4096), "4.0 KiB");
/// assert_eq!(format_bytes(4194304), "4.0 MiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    const THRESHOLD: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration into a short human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs > 0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
    }
}

/// Calculate throughput in MB/s from bytes and duration.
/// A zero duration yields 0 rather than infinity.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use bwprobe::util::units::calculate_throughput_mbps;
///
/// let throughput = calculate_throughput_mbps(1048576, Duration::from_secs(1));
/// assert!((throughput - 1.0).abs() < 0.01);
/// ```
pub fn calculate_throughput_mbps(bytes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }

    bytes_to_mb(bytes) / duration.as_secs_f64()
}

/// Calculate IOPS (Input/Output Operations Per Second)
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use bwprobe::util::units::calculate_iops;
///
/// let iops = calculate_iops(1000, Duration::from_secs(1));
/// assert!((iops - 1000.0).abs() < 0.01);
/// ```
pub fn calculate_iops(operations: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }

    operations as f64 / duration.as_secs_f64()
}
