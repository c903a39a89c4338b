//! Benchmark result data models
//!
//! Per-phase measurements and the end-of-run summary table.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::util::units::{calculate_iops, calculate_throughput_mbps};

/// Random-read bandwidth above this (MB/s) suggests the page cache served the reads
pub const RANDOM_READ_CACHE_WARN_MBPS: f64 = 500.0;
/// Random-write bandwidth above this (MB/s) suggests writes were absorbed by a cache
pub const RANDOM_WRITE_CACHE_WARN_MBPS: f64 = 1000.0;

const SUMMARY_RULE: &str = "========================================";

/// The four measurement phases, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SequentialWrite,
    SequentialRead,
    RandomRead,
    RandomWrite,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::SequentialWrite,
        Phase::SequentialRead,
        Phase::RandomRead,
        Phase::RandomWrite,
    ];

    /// Get a human-readable description of the phase
    pub fn description(&self) -> &'static str {
        match self {
            Phase::SequentialWrite => "Sequential Write",
            Phase::SequentialRead => "Sequential Read",
            Phase::RandomRead => "Random Read",
            Phase::RandomWrite => "Random Write",
        }
    }

    /// Advisory bandwidth ceiling beyond which cache effects are suspected
    pub fn cache_warning_threshold(&self) -> Option<f64> {
        match self {
            Phase::RandomRead => Some(RANDOM_READ_CACHE_WARN_MBPS),
            Phase::RandomWrite => Some(RANDOM_WRITE_CACHE_WARN_MBPS),
            _ => None,
        }
    }
}

/// Operation counts for a random phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationStats {
    /// Offsets drawn, including those whose seek failed
    pub attempted: u64,
    /// Operations that transferred at least one byte
    pub successful: u64,
    /// Successful operations per second
    pub iops: f64,
}

/// Outcome of a single phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Bytes transferred inside the timing window
    pub bytes_processed: u64,
    /// Length of the timing window
    pub elapsed_time: Duration,
    /// Bandwidth in MB/s
    pub throughput_mbps: f64,
    /// Present for random phases
    pub operations: Option<OperationStats>,
}

impl PhaseResult {
    /// Result of a sequential phase
    pub fn sequential(phase: Phase, bytes_processed: u64, elapsed_time: Duration) -> Self {
        Self {
            phase,
            bytes_processed,
            elapsed_time,
            throughput_mbps: calculate_throughput_mbps(bytes_processed, elapsed_time),
            operations: None,
        }
    }

    /// Result of a random phase. Zero successful operations yields zero
    /// bandwidth and IOPS regardless of the elapsed time.
    pub fn random(
        phase: Phase,
        bytes_processed: u64,
        elapsed_time: Duration,
        attempted: u64,
        successful: u64,
    ) -> Self {
        let (throughput_mbps, iops) = if successful == 0 {
            (0.0, 0.0)
        } else {
            (
                calculate_throughput_mbps(bytes_processed, elapsed_time),
                calculate_iops(successful, elapsed_time),
            )
        };

        Self {
            phase,
            bytes_processed,
            elapsed_time,
            throughput_mbps,
            operations: Some(OperationStats {
                attempted,
                successful,
                iops,
            }),
        }
    }

    /// Zero result for a phase that could not be measured
    pub fn failed(phase: Phase) -> Self {
        Self {
            phase,
            bytes_processed: 0,
            elapsed_time: Duration::ZERO,
            throughput_mbps: 0.0,
            operations: None,
        }
    }

    pub fn iops(&self) -> Option<f64> {
        self.operations.map(|ops| ops.iops)
    }

    /// True when bandwidth exceeds the phase's cache-suspicion threshold
    pub fn cache_effect_suspected(&self) -> bool {
        self.phase
            .cache_warning_threshold()
            .map_or(false, |limit| self.throughput_mbps > limit)
    }
}

/// All phase results of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub results: Vec<PhaseResult>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            results: Vec::with_capacity(Phase::ALL.len()),
        }
    }

    pub fn push(&mut self, result: PhaseResult) {
        self.results.push(result);
    }

    pub fn get(&self, phase: Phase) -> Option<&PhaseResult> {
        self.results.iter().find(|r| r.phase == phase)
    }

    /// Bandwidth of a phase; 0 if the phase has no result
    pub fn bandwidth(&self, phase: Phase) -> f64 {
        self.get(phase).map_or(0.0, |r| r.throughput_mbps)
    }

    /// Render the aligned summary table
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{}", SUMMARY_RULE);
        let _ = writeln!(out, "              SUMMARY");
        let _ = writeln!(out, "{}", SUMMARY_RULE);
        for phase in Phase::ALL {
            let label = format!("{}:", phase.description());
            let _ = write!(out, "{:<18}{:.2} MB/s", label, self.bandwidth(phase));
            if let Some(iops) = self.get(phase).and_then(PhaseResult::iops) {
                let _ = write!(out, "  ({:.0} IOPS)", iops);
            }
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "Started:          {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = write!(out, "{}", SUMMARY_RULE);
        out
    }
}
