//! Bandwidth probe
//!
//! Owns the run configuration, the scratch file and the offset RNG, and
//! drives the phases in fixed order. Phase failures are printed and turned
//! into zero results; they never abort the run.

use std::fs::File;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::random::{self, StrideOffsets};
use super::{io_context, sequential};
use crate::config::ProbeConfig;
use crate::error::user_friendly_message;
use crate::io::{create_disk_io, DiskIO, ScratchFile, WriteMode};
use crate::models::{Phase, PhaseResult, RunReport};
use crate::util::units::{format_bytes, format_duration, format_megabytes};
use crate::{ProbeError, Result};

const BANNER_RULE: &str = "========================================";

pub struct BandwidthProbe {
    config: ProbeConfig,
    disk_io: Box<dyn DiskIO>,
    scratch: ScratchFile,
    rng: SmallRng,
}

impl BandwidthProbe {
    /// Create a probe using the platform's filesystem facilities
    pub fn new(config: ProbeConfig) -> Result<Self> {
        Self::with_disk_io(config, create_disk_io())
    }

    /// Create a probe with explicit filesystem facilities.
    ///
    /// A test directory that cannot be created is only logged; the first
    /// phase that opens the scratch file reports the failure.
    pub fn with_disk_io(config: ProbeConfig, disk_io: Box<dyn DiskIO>) -> Result<Self> {
        config.validate()?;

        if let Err(e) = disk_io.ensure_directory(&config.test_dir) {
            warn!(
                dir = %config.test_dir.display(),
                error = %e,
                "Could not create test directory"
            );
        }

        let seed = config.seed.unwrap_or_else(clock_seed);
        debug!(seed, "Seeding offset generator");

        Ok(Self {
            scratch: ScratchFile::new(config.scratch_path()),
            rng: SmallRng::seed_from_u64(seed),
            config,
            disk_io,
        })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn scratch_file(&self) -> &ScratchFile {
        &self.scratch
    }

    /// Sequential write of `file_size` bytes; creates the scratch file
    pub fn sequential_write(&mut self, file_size: u64) -> PhaseResult {
        println!("\n=== Sequential Write Test ===");
        println!("File size: {}", format_megabytes(file_size));

        let progress = self.progress_bar(file_size);
        let outcome = sequential::sequential_write(
            self.scratch.path(),
            file_size,
            self.config.buffer_size,
            &progress,
        );
        progress.finish_and_clear();

        match outcome {
            Ok(result) => {
                println!("Write bandwidth: {:.2} MB/s", result.throughput_mbps);
                debug!(elapsed = %format_duration(result.elapsed_time), "Sequential write timing");
                result
            }
            Err(e) => report_failure(Phase::SequentialWrite, &e),
        }
    }

    /// Sequential read of the whole scratch file through the page cache
    pub fn sequential_read(&mut self, file_size: u64) -> PhaseResult {
        println!("\n=== Sequential Read Test ===");
        println!("File size: {}", format_megabytes(file_size));

        self.ensure_scratch_file(file_size);

        let progress = self.progress_bar(file_size);
        let outcome = sequential::sequential_read(
            self.scratch.path(),
            self.config.buffer_size,
            &progress,
        );
        progress.finish_and_clear();

        match outcome {
            Ok(result) => {
                println!("Read bandwidth: {:.2} MB/s", result.throughput_mbps);
                debug!(elapsed = %format_duration(result.elapsed_time), "Sequential read timing");
                result
            }
            Err(e) => report_failure(Phase::SequentialRead, &e),
        }
    }

    /// `operations` random block reads after a best-effort page cache drop
    pub fn random_read(&mut self, file_size: u64, operations: usize) -> PhaseResult {
        println!("\n=== Random Read Test ===");
        println!("Number of random reads: {}", operations);

        self.ensure_scratch_file(file_size);

        if let Err(e) = self.disk_io.drop_page_cache() {
            warn!(error = %e, "Page cache drop failed");
            let limitation = ProbeError::CacheControlUnsupported(e.to_string());
            println!("Note: {}", user_friendly_message(&limitation));
        } else {
            debug!("Page cache dropped");
        }

        let offsets = match self.offsets(file_size, operations) {
            Ok(offsets) => offsets,
            Err(e) => return report_failure(Phase::RandomRead, &e),
        };

        let mut file = match File::open(self.scratch.path()) {
            Ok(file) => file,
            Err(e) => {
                let err = io_context("Cannot open test file for random reading", e);
                return report_failure(Phase::RandomRead, &err);
            }
        };

        let result = random::random_read(
            &mut file,
            &offsets,
            self.config.block_size,
            operations,
            &mut self.rng,
        );
        drop(file);

        print_random_result(result, "reads", "read")
    }

    /// `operations` random block writes, synchronous where the platform allows
    pub fn random_write(&mut self, file_size: u64, operations: usize) -> PhaseResult {
        println!("\n=== Random Write Test ===");
        println!("Number of random writes: {}", operations);

        self.ensure_scratch_file(file_size);

        let offsets = match self.offsets(file_size, operations) {
            Ok(offsets) => offsets,
            Err(e) => return report_failure(Phase::RandomWrite, &e),
        };

        let (mut file, mode) = match self.disk_io.open_sync_write(self.scratch.path()) {
            Ok(opened) => opened,
            Err(e) => {
                let err = io_context("Cannot open test file for random writing", e);
                return report_failure(Phase::RandomWrite, &err);
            }
        };

        if mode == WriteMode::Buffered {
            warn!("Synchronous open unavailable, random writes are buffered until the final sync");
        }
        println!("Write mode: {}", mode.description());

        let result = random::random_write(
            &mut file,
            &offsets,
            self.config.block_size,
            operations,
            &mut self.rng,
        );
        drop(file);

        print_random_result(result, "writes", "write")
    }

    /// Run all four phases in order and print the summary table
    pub fn run_all(&mut self) -> RunReport {
        let file_size = self.config.file_size;
        let operations = self.config.random_ops;
        let mut report = RunReport::new(Utc::now());

        println!("\n{}", BANNER_RULE);
        println!("     Simple Disk Bandwidth Test");
        println!("{}", BANNER_RULE);
        println!("Test directory: {}", self.config.test_dir.display());
        println!("Test file size: {}", format_megabytes(file_size));

        info!(
            dir = %self.config.test_dir.display(),
            file_size = %format_bytes(file_size),
            buffer_size = %format_bytes(self.config.buffer_size as u64),
            block_size = %format_bytes(self.config.block_size as u64),
            operations,
            "Starting bandwidth run"
        );

        report.push(self.sequential_write(file_size));
        report.push(self.sequential_read(file_size));
        report.push(self.random_read(file_size, operations));
        report.push(self.random_write(file_size, operations));

        println!("{}", report.summary());
        info!("Bandwidth run complete");
        report
    }

    /// Recreate the scratch file when it is missing or shorter than `file_size`
    fn ensure_scratch_file(&mut self, file_size: u64) {
        let current = std::fs::metadata(self.scratch.path()).map(|m| m.len()).ok();
        match current {
            Some(len) if len >= file_size => {}
            Some(len) => {
                debug!(len, file_size, "Scratch file too short, recreating");
                println!("Creating test file...");
                self.sequential_write(file_size);
            }
            None => {
                println!("Creating test file...");
                self.sequential_write(file_size);
            }
        }
    }

    fn offsets(&self, file_size: u64, operations: usize) -> Result<StrideOffsets> {
        StrideOffsets::new(file_size, self.config.block_size, operations).ok_or_else(|| {
            ProbeError::BenchmarkError(format!(
                "Target size {} holds no {} blocks",
                format_bytes(file_size),
                format_bytes(self.config.block_size as u64)
            ))
        })
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner} {bytes}/{total_bytes} {binary_bytes_per_sec} ({eta})",
        ) {
            progress.set_style(style);
        }
        progress
    }
}

fn print_random_result(result: PhaseResult, noun: &str, verb: &str) -> PhaseResult {
    let ops = match result.operations {
        Some(ops) if ops.successful > 0 => ops,
        _ => {
            eprintln!("Error: No successful random {}", noun);
            return result;
        }
    };

    println!("Successful {}: {}/{}", noun, ops.successful, ops.attempted);
    println!("Random {} bandwidth: {:.2} MB/s", verb, result.throughput_mbps);
    println!("Random {} IOPS: {:.0}", verb, ops.iops);

    if result.cache_effect_suspected() {
        println!(
            "Warning: Random {} speed seems unrealistically high (possible cache effect)",
            verb
        );
    }

    result
}

fn report_failure(phase: Phase, err: &ProbeError) -> PhaseResult {
    eprintln!(
        "Error: {} failed: {}",
        phase.description(),
        user_friendly_message(err)
    );
    PhaseResult::failed(phase)
}

/// Non-deterministic seed from the wall clock's nanoseconds
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn small_config(dir: PathBuf) -> ProbeConfig {
        ProbeConfig::new()
            .with_test_dir(dir)
            .with_file_size(256 * 1024)
            .with_buffer_size(64 * 1024)
            .with_random_ops(32)
            .with_show_progress(false)
            .with_seed(Some(5))
    }

    #[test]
    fn test_new_creates_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().join("bwtest").join("nested");

        let probe = BandwidthProbe::new(small_config(dir.clone())).unwrap();
        assert!(dir.is_dir());
        assert_eq!(probe.scratch_file().path(), dir.join("test.dat"));
        assert!(!probe.scratch_file().exists());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let temp_dir = tempdir().unwrap();
        let config = small_config(temp_dir.path().to_path_buf()).with_file_size(0);
        assert!(matches!(
            BandwidthProbe::new(config),
            Err(ProbeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_random_phase_with_sub_block_target_fails_cleanly() {
        let temp_dir = tempdir().unwrap();
        let mut probe = BandwidthProbe::new(small_config(temp_dir.path().to_path_buf())).unwrap();

        let result = probe.random_read(1000, 10);
        assert_eq!(result, PhaseResult::failed(Phase::RandomRead));
    }

    #[test]
    fn test_undersized_scratch_file_is_recreated() {
        let temp_dir = tempdir().unwrap();
        let mut probe = BandwidthProbe::new(small_config(temp_dir.path().to_path_buf())).unwrap();
        std::fs::write(probe.scratch_file().path(), b"short").unwrap();

        let result = probe.random_read(256 * 1024, 16);

        assert_eq!(
            std::fs::metadata(probe.scratch_file().path()).unwrap().len(),
            256 * 1024
        );
        assert_eq!(result.operations.unwrap().successful, 16);
    }

    #[test]
    fn test_clock_seed_varies() {
        let a = clock_seed();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_ne!(a, clock_seed());
    }
}
