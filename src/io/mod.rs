//! I/O operations module
//!
//! Platform filesystem and cache-control facilities, kept behind a small
//! trait so the benchmark phases stay platform-agnostic.

pub mod disk;

pub use disk::{create_disk_io, DiskIO, PlatformDiskIO, ScratchFile, WriteMode};
