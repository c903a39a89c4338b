//! Random read and write operations
//!
//! Fixed-size block accesses at stride-spread offsets. Per-operation
//! failures are skipped, not retried; the phase only fails when no
//! operation succeeded.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::time::Instant;

use rand::Rng;
use tracing::{debug, warn};

use crate::models::{Phase, PhaseResult};

/// Offset generator spreading block indices over the whole file.
///
/// A uniform draw in `[0, max_blocks)` is multiplied by
/// `stride = max(1, max_blocks / operations)` and reduced modulo
/// `max_blocks`, then scaled to bytes. Every offset is a multiple of the
/// block size and lies below `max_blocks * block_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrideOffsets {
    max_blocks: u64,
    stride: u64,
    block_size: u64,
}

impl StrideOffsets {
    /// `None` when the target holds less than one block
    pub fn new(target_size: u64, block_size: usize, operations: usize) -> Option<Self> {
        let block_size = block_size as u64;
        if block_size == 0 {
            return None;
        }
        let max_blocks = target_size / block_size;
        if max_blocks == 0 {
            return None;
        }
        let stride = std::cmp::max(1, max_blocks / std::cmp::max(1, operations as u64));
        Some(Self {
            max_blocks,
            stride,
            block_size,
        })
    }

    pub fn max_blocks(&self) -> u64 {
        self.max_blocks
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Byte offset for a drawn block index
    pub fn offset_for(&self, index: u64) -> u64 {
        let block = (index as u128 * self.stride as u128) % self.max_blocks as u128;
        block as u64 * self.block_size
    }

    /// Draw the next byte offset
    pub fn next_offset<R: Rng>(&self, rng: &mut R) -> u64 {
        self.offset_for(rng.gen_range(0..self.max_blocks))
    }
}

/// Issue `operations` random block reads against `reader`
pub fn random_read<F, R>(
    reader: &mut F,
    offsets: &StrideOffsets,
    block_size: usize,
    operations: usize,
    rng: &mut R,
) -> PhaseResult
where
    F: Read + Seek,
    R: Rng,
{
    let mut buffer = vec![0u8; block_size];
    debug!(
        max_blocks = offsets.max_blocks(),
        stride = offsets.stride(),
        operations,
        "Starting random reads"
    );

    let start_time = Instant::now();

    let mut attempted = 0u64;
    let mut successful = 0u64;
    let mut bytes_read = 0u64;
    for _ in 0..operations {
        let offset = offsets.next_offset(rng);
        attempted += 1;

        if reader.seek(SeekFrom::Start(offset)).is_err() {
            continue;
        }

        if let Ok(read) = reader.read(&mut buffer) {
            if read > 0 {
                bytes_read += read as u64;
                successful += 1;
            }
        }
    }

    let elapsed = start_time.elapsed();
    PhaseResult::random(Phase::RandomRead, bytes_read, elapsed, attempted, successful)
}

/// Issue `operations` random block writes to `file`, then sync once
pub fn random_write<R: Rng>(
    file: &mut File,
    offsets: &StrideOffsets,
    block_size: usize,
    operations: usize,
    rng: &mut R,
) -> PhaseResult {
    let mut buffer = vec![0u8; block_size];
    debug!(
        max_blocks = offsets.max_blocks(),
        stride = offsets.stride(),
        operations,
        "Starting random writes"
    );

    let start_time = Instant::now();

    let (attempted, successful, bytes_written) =
        write_blocks(file, offsets, &mut buffer, operations, rng);

    // One trailing sync; a synchronous open has already made each write durable.
    if let Err(e) = file.sync_all() {
        warn!(error = %e, "Final sync after random writes failed");
    }
    let elapsed = start_time.elapsed();

    PhaseResult::random(
        Phase::RandomWrite,
        bytes_written,
        elapsed,
        attempted,
        successful,
    )
}

/// Seek-and-write loop; returns (attempted, successful, bytes written)
fn write_blocks<W, R>(
    writer: &mut W,
    offsets: &StrideOffsets,
    buffer: &mut [u8],
    operations: usize,
    rng: &mut R,
) -> (u64, u64, u64)
where
    W: Write + Seek,
    R: Rng,
{
    let mut attempted = 0u64;
    let mut successful = 0u64;
    let mut bytes_written = 0u64;
    for iteration in 0..operations {
        let offset = offsets.next_offset(rng);
        attempted += 1;

        fill_write_pattern(buffer, iteration);

        if writer.seek(SeekFrom::Start(offset)).is_err() {
            continue;
        }

        if let Ok(written) = writer.write(buffer) {
            if written > 0 {
                bytes_written += written as u64;
                successful += 1;
            }
        }
    }
    (attempted, successful, bytes_written)
}

/// Payload that differs per write so the storage path cannot deduplicate it
pub fn fill_write_pattern(buffer: &mut [u8], iteration: usize) {
    let base = iteration.wrapping_mul(37).wrapping_add(0xAA);
    for (i, byte) in buffer.iter_mut().enumerate() {
        *byte = (i.wrapping_add(base) % 256) as u8;
    }
}
