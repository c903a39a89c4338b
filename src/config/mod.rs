//! Configuration management module
//!
//! Holds the immutable run configuration and the optional TOML settings
//! file that supplies defaults for the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{ProbeError, Result, APP_NAME, CONFIG_FILE, KB, MB};

/// Largest accepted scratch file size, in MB.
pub const MAX_FILE_SIZE_MB: i64 = 10_000;
/// Scratch file size used when none is given, in MB.
pub const DEFAULT_FILE_SIZE_MB: u64 = 2048;
/// Sequential I/O buffer size.
pub const SEQUENTIAL_BUFFER_SIZE: usize = (4 * MB) as usize;
/// Random I/O block size.
pub const RANDOM_BLOCK_SIZE: usize = (4 * KB) as usize;
/// Operations per random phase.
pub const RANDOM_OPERATIONS: usize = 1000;

#[cfg(target_os = "android")]
pub const DEFAULT_TEST_DIR: &str = "/data/local/tmp/bandwidth";
#[cfg(not(target_os = "android"))]
pub const DEFAULT_TEST_DIR: &str = "/tmp/bandwidth";

/// Run configuration, fixed once the run starts
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Directory that holds the scratch file
    pub test_dir: PathBuf,
    /// Scratch file size (in bytes)
    pub file_size: u64,
    /// Buffer size for sequential I/O (in bytes)
    pub buffer_size: usize,
    /// Block size for random I/O (in bytes)
    pub block_size: usize,
    /// Operations issued by each random phase
    pub random_ops: usize,
    /// Whether sequential phases draw a progress bar
    pub show_progress: bool,
    /// Fixed RNG seed; a clock-derived seed is used when absent
    pub seed: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            test_dir: PathBuf::from(DEFAULT_TEST_DIR),
            file_size: DEFAULT_FILE_SIZE_MB * MB,
            buffer_size: SEQUENTIAL_BUFFER_SIZE,
            block_size: RANDOM_BLOCK_SIZE,
            random_ops: RANDOM_OPERATIONS,
            show_progress: true,
            seed: None,
        }
    }
}

impl ProbeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a size given in MB on the command line into bytes.
    ///
    /// Anything outside `1..=10000` is rejected.
    pub fn file_size_from_mb(size_mb: i64) -> Result<u64> {
        if size_mb <= 0 || size_mb > MAX_FILE_SIZE_MB {
            return Err(ProbeError::ConfigError(format!(
                "File size must be between 1 and {} MB",
                MAX_FILE_SIZE_MB
            )));
        }
        Ok(size_mb as u64 * MB)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.file_size == 0 {
            return Err(ProbeError::ConfigError(
                "File size must be greater than 0".to_string(),
            ));
        }

        let max_file_size = MAX_FILE_SIZE_MB as u64 * MB;
        if self.file_size > max_file_size {
            return Err(ProbeError::ConfigError(format!(
                "File size too large: {} bytes (max: {} bytes)",
                self.file_size, max_file_size
            )));
        }

        if self.buffer_size == 0 {
            return Err(ProbeError::ConfigError(
                "Buffer size must be greater than 0".to_string(),
            ));
        }

        if self.block_size == 0 {
            return Err(ProbeError::ConfigError(
                "Block size must be greater than 0".to_string(),
            ));
        }

        if self.block_size as u64 > self.file_size {
            return Err(ProbeError::ConfigError(
                "File size must be at least one random I/O block".to_string(),
            ));
        }

        if self.random_ops == 0 {
            return Err(ProbeError::ConfigError(
                "Random operation count must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the scratch file inside the test directory
    pub fn scratch_path(&self) -> PathBuf {
        self.test_dir.join(crate::SCRATCH_FILE_NAME)
    }

    /// Apply values from a settings file
    pub fn with_settings(mut self, settings: &Settings) -> Result<Self> {
        if let Some(dir) = &settings.test_dir {
            self.test_dir = dir.clone();
        }
        if let Some(size_mb) = settings.file_size_mb {
            self.file_size = Self::file_size_from_mb(size_mb)?;
        }
        if let Some(show) = settings.show_progress {
            self.show_progress = show;
        }
        Ok(self)
    }

    pub fn with_test_dir(mut self, path: PathBuf) -> Self {
        self.test_dir = path;
        self
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = size;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn with_random_ops(mut self, ops: usize) -> Self {
        self.random_ops = ops;
        self
    }

    pub fn with_show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// Optional defaults read from `bwprobe.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub test_dir: Option<PathBuf>,
    pub file_size_mb: Option<i64>,
    pub show_progress: Option<bool>,
}

impl Settings {
    /// Load settings from the standard location.
    /// Returns empty settings if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = match Self::config_file_path() {
            Ok(path) => path,
            Err(_) => return Ok(Self::default()),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load settings from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProbeError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            ProbeError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Get the standard settings file path
    /// Uses $CONFIG_HOME/bwprobe/bwprobe.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ProbeError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_fixed_parameters() {
        let config = ProbeConfig::default();
        assert_eq!(config.file_size, 2048 * 1024 * 1024);
        assert_eq!(config.buffer_size, 4 * 1024 * 1024);
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.random_ops, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_size_from_mb_range() {
        assert_eq!(ProbeConfig::file_size_from_mb(1).unwrap(), 1024 * 1024);
        assert_eq!(
            ProbeConfig::file_size_from_mb(10_000).unwrap(),
            10_000 * 1024 * 1024
        );

        for bad in [0, -1, -2048, 10_001, i64::MAX] {
            match ProbeConfig::file_size_from_mb(bad) {
                Err(ProbeError::ConfigError(msg)) => {
                    assert!(msg.contains("between 1 and 10000"))
                }
                other => panic!("expected config error for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_validate_rejects_degenerate_sizes() {
        assert!(ProbeConfig::new().with_file_size(0).validate().is_err());
        assert!(ProbeConfig::new()
            .with_file_size(10_001 * 1024 * 1024)
            .validate()
            .is_err());
        assert!(ProbeConfig::new().with_buffer_size(0).validate().is_err());
        assert!(ProbeConfig::new().with_block_size(0).validate().is_err());
        assert!(ProbeConfig::new().with_random_ops(0).validate().is_err());
        assert!(ProbeConfig::new()
            .with_file_size(1024)
            .with_block_size(4096)
            .validate()
            .is_err());
    }

    #[test]
    fn test_scratch_path_is_inside_test_dir() {
        let config = ProbeConfig::new().with_test_dir(PathBuf::from("/tmp/bwtest"));
        assert_eq!(config.scratch_path(), PathBuf::from("/tmp/bwtest/test.dat"));
    }

    #[test]
    fn test_settings_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bwprobe.toml");
        fs::write(
            &path,
            "test_dir = \"/mnt/fast\"\nfile_size_mb = 64\nshow_progress = false\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        let config = ProbeConfig::new().with_settings(&settings).unwrap();
        assert_eq!(config.test_dir, PathBuf::from("/mnt/fast"));
        assert_eq!(config.file_size, 64 * 1024 * 1024);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_settings_with_out_of_range_size_fail() {
        let settings = Settings {
            file_size_mb: Some(20_000),
            ..Settings::default()
        };
        assert!(ProbeConfig::new().with_settings(&settings).is_err());
    }

    #[test]
    fn test_settings_errors_are_config_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Settings::load_from(&missing),
            Err(ProbeError::ConfigError(_))
        ));

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "file_size_mb = \"lots\"\n").unwrap();
        assert!(matches!(
            Settings::load_from(&broken),
            Err(ProbeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_file_path() {
        if let Ok(path) = Settings::config_file_path() {
            assert!(path.to_string_lossy().contains("bwprobe"));
            assert!(path.to_string_lossy().ends_with("bwprobe.toml"));
        }
    }
}
