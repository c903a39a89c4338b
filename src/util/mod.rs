//! Utility functions module
//!
//! Unit conversion and formatting helpers for the report output.

pub mod units;

pub use units::{
    bytes_to_mb, calculate_iops, calculate_throughput_mbps, format_bytes, format_duration,
    format_megabytes,
};
