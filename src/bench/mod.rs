//! Benchmark engine module
//!
//! The four measurement phases and the probe that runs them in order.

pub mod probe;
pub mod random;
pub mod sequential;

pub use probe::BandwidthProbe;
pub use random::StrideOffsets;

use crate::ProbeError;

/// Attach context to an I/O error, keeping permission problems distinct
pub(crate) fn io_context(context: &str, err: std::io::Error) -> ProbeError {
    match ProbeError::from(err) {
        ProbeError::IoError(e) => ProbeError::BenchmarkError(format!("{}: {}", context, e)),
        ProbeError::PermissionDenied(msg) => {
            ProbeError::PermissionDenied(format!("{}: {}", context, msg))
        }
        other => other,
    }
}
