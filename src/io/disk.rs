use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Durability mode the random-write phase ended up with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every write returns only after reaching stable storage
    Synchronous,
    /// Regular buffered writes
    Buffered,
}

impl WriteMode {
    pub fn description(&self) -> &'static str {
        match self {
            WriteMode::Synchronous => "synchronous (O_SYNC)",
            WriteMode::Buffered => "buffered (synchronous open unavailable)",
        }
    }
}

/// Platform filesystem and cache-control facilities used by the probe
pub trait DiskIO {
    /// Create the directory and its parents if missing
    fn ensure_directory(&self, path: &Path) -> io::Result<()>;

    /// Flush dirty data and ask the OS to drop its page cache
    fn drop_page_cache(&self) -> io::Result<()>;

    /// Open an existing file for writing, preferring synchronous writes
    fn open_sync_write(&self, path: &Path) -> io::Result<(File, WriteMode)>;
}

/// Scratch file path with automatic cleanup
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Platform-specific disk I/O implementation
#[derive(Clone)]
pub struct PlatformDiskIO;

impl PlatformDiskIO {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlatformDiskIO {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_FLAG_WRITE_THROUGH: u32 = 0x80000000;

    impl DiskIO for PlatformDiskIO {
        fn ensure_directory(&self, path: &Path) -> io::Result<()> {
            fs::create_dir_all(path)
        }

        fn drop_page_cache(&self) -> io::Result<()> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "page cache drop is not available on Windows",
            ))
        }

        fn open_sync_write(&self, path: &Path) -> io::Result<(File, WriteMode)> {
            match OpenOptions::new()
                .write(true)
                .custom_flags(FILE_FLAG_WRITE_THROUGH)
                .open(path)
            {
                Ok(file) => Ok((file, WriteMode::Synchronous)),
                Err(_) => {
                    let file = OpenOptions::new().write(true).open(path)?;
                    Ok((file, WriteMode::Buffered))
                }
            }
        }
    }
}

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use std::os::unix::fs::OpenOptionsExt;

    #[cfg(any(target_os = "linux", target_os = "android"))]
    const DROP_CACHES_PATH: &str = "/proc/sys/vm/drop_caches";

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn write_drop_caches() -> io::Result<()> {
        // Requires root; 3 = page cache plus dentries and inodes.
        fs::write(DROP_CACHES_PATH, "3")
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn write_drop_caches() -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "page cache drop is only available on Linux",
        ))
    }

    impl DiskIO for PlatformDiskIO {
        fn ensure_directory(&self, path: &Path) -> io::Result<()> {
            fs::create_dir_all(path)
        }

        fn drop_page_cache(&self) -> io::Result<()> {
            // SAFETY: sync(2) takes no arguments and cannot fail.
            unsafe {
                libc::sync();
            }
            write_drop_caches()
        }

        fn open_sync_write(&self, path: &Path) -> io::Result<(File, WriteMode)> {
            match OpenOptions::new()
                .write(true)
                .custom_flags(libc::O_SYNC)
                .open(path)
            {
                Ok(file) => Ok((file, WriteMode::Synchronous)),
                Err(_) => {
                    // Fallback to a regular writable open
                    let file = OpenOptions::new().write(true).open(path)?;
                    Ok((file, WriteMode::Buffered))
                }
            }
        }
    }
}

/// Create a new platform-specific disk I/O instance
pub fn create_disk_io() -> Box<dyn DiskIO> {
    Box::new(PlatformDiskIO::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_scratch_file_removed_on_drop() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.dat");
        fs::write(&path, b"scratch").unwrap();

        let scratch = ScratchFile::new(path.clone());
        assert!(scratch.exists());
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_file_drop_without_file_is_silent() {
        let temp_dir = tempdir().unwrap();
        let scratch = ScratchFile::new(temp_dir.path().join("never-created.dat"));
        assert!(!scratch.exists());
        drop(scratch);
    }

    #[test]
    fn test_ensure_directory_creates_nested_dirs() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("c");
        let disk_io = PlatformDiskIO::new();

        disk_io.ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        // Already existing is fine
        disk_io.ensure_directory(&nested).unwrap();
    }

    #[test]
    fn test_open_sync_write_does_not_truncate() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.dat");
        fs::write(&path, vec![7u8; 8192]).unwrap();

        let disk_io = PlatformDiskIO::new();
        let (mut file, _mode) = disk_io.open_sync_write(&path).unwrap();
        file.write_all(&[1u8; 16]).unwrap();
        drop(file);

        assert_eq!(fs::metadata(&path).unwrap().len(), 8192);
    }

    #[test]
    fn test_open_sync_write_requires_existing_file() {
        let temp_dir = tempdir().unwrap();
        let disk_io = PlatformDiskIO::new();
        assert!(disk_io
            .open_sync_write(&temp_dir.path().join("missing.dat"))
            .is_err());
    }

    #[test]
    fn test_drop_page_cache_never_panics() {
        // Usually fails without root; either outcome is acceptable.
        let _ = PlatformDiskIO::new().drop_page_cache();
    }
}
