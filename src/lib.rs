//! bwprobe - storage bandwidth probe
//!
//! Measures sequential write, sequential read, random read and random
//! write throughput against a single scratch file on a mounted filesystem.

use std::fmt;

pub mod bench;
pub mod config;
pub mod io;
pub mod logging;
pub mod models;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum ProbeError {
    /// I/O operation failed
    IoError(std::io::Error),
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Benchmark phase could not produce a measurement
    BenchmarkError(String),
    /// Permission denied for disk operations
    PermissionDenied(String),
    /// Page cache control not available on this platform or without privileges
    CacheControlUnsupported(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::IoError(err) => write!(f, "I/O error: {}", err),
            ProbeError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ProbeError::BenchmarkError(msg) => write!(f, "Benchmark error: {}", msg),
            ProbeError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            ProbeError::CacheControlUnsupported(msg) => {
                write!(f, "Cache control not supported: {}", msg)
            }
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ProbeError::PermissionDenied(format!("Access denied: {}", err))
            }
            _ => ProbeError::IoError(err),
        }
    }
}

/// Result type alias for bwprobe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Error reporting helpers
pub mod error {
    use super::ProbeError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &ProbeError) -> String {
        match error {
            ProbeError::PermissionDenied(msg) => format!(
                "{}. Choose a directory you can write to or run with elevated privileges.",
                msg
            ),
            ProbeError::CacheControlUnsupported(_) => {
                "Page cache could not be dropped. Random read results may include cache hits."
                    .to_string()
            }
            ProbeError::ConfigError(msg) => msg.clone(),
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "bwprobe";
pub const CONFIG_FILE: &str = "bwprobe.toml";
pub const SCRATCH_FILE_NAME: &str = "test.dat";

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;
