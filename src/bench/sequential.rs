//! Sequential benchmark operations
//!
//! Large-buffer write and read passes over the scratch file. The write
//! timing window ends only after `sync_all` returns, so it measures the
//! device rather than the page cache absorbing the data.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use indicatif::ProgressBar;
use tracing::debug;

use super::io_context;
use crate::models::{Phase, PhaseResult};
use crate::{ProbeError, Result};

/// Write `file_size` bytes to `path` (truncating it) in `buffer_size` chunks
pub fn sequential_write(
    path: &Path,
    file_size: u64,
    buffer_size: usize,
    progress: &ProgressBar,
) -> Result<PhaseResult> {
    let buffer = create_test_pattern(buffer_size);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| io_context("Cannot create test file", e))?;

    let start_time = Instant::now();

    let mut bytes_written = 0u64;
    while bytes_written < file_size {
        let remaining = file_size - bytes_written;
        let write_size = std::cmp::min(remaining, buffer_size as u64) as usize;

        let written = file
            .write(&buffer[..write_size])
            .map_err(|e| io_context(&format!("Write failed at byte {}", bytes_written), e))?;

        if written == 0 {
            return Err(ProbeError::BenchmarkError(format!(
                "Write returned 0 bytes at byte {}",
                bytes_written
            )));
        }

        bytes_written += written as u64;
        progress.set_position(bytes_written);
    }

    file.sync_all()
        .map_err(|e| io_context("Sync failed", e))?;
    let elapsed = start_time.elapsed();
    drop(file);

    debug!(bytes_written, ?elapsed, "Sequential write finished");
    Ok(PhaseResult::sequential(
        Phase::SequentialWrite,
        bytes_written,
        elapsed,
    ))
}

/// Read `path` to end of file in `buffer_size` chunks
pub fn sequential_read(
    path: &Path,
    buffer_size: usize,
    progress: &ProgressBar,
) -> Result<PhaseResult> {
    let mut buffer = vec![0u8; buffer_size];

    let mut file =
        File::open(path).map_err(|e| io_context("Cannot open test file for reading", e))?;

    let start_time = Instant::now();

    let mut bytes_read = 0u64;
    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|e| io_context(&format!("Read failed at byte {}", bytes_read), e))?;
        if read == 0 {
            break;
        }
        bytes_read += read as u64;
        progress.set_position(bytes_read);
    }

    let elapsed = start_time.elapsed();
    drop(file);

    debug!(bytes_read, ?elapsed, "Sequential read finished");
    Ok(PhaseResult::sequential(
        Phase::SequentialRead,
        bytes_read,
        elapsed,
    ))
}

/// Repeating 0..=255 byte pattern; keeps writes from being all-zero pages
pub fn create_test_pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}
