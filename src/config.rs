//! Configuration for StrataKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StrataError};

/// Main configuration for a StrataKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding every SSTable file of this engine.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 00000001700000000000000.db   (finalized tables)
    ///     └── 00000001700000000000042.tmp  (flush in progress)
    pub data_dir: PathBuf,

    /// What to do with unreadable table files found on open
    pub open_mode: OpenMode,

    /// fsync table files and the directory when publishing
    pub sync_on_publish: bool,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Flush once the memtable size estimate exceeds this many bytes
    pub flush_threshold_bytes: usize,
}

/// Handling of corrupt or unreadable SSTables during `Engine::open`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Fail the whole open with an aggregate error
    #[default]
    Strict,

    /// Log a warning and skip the file
    Lenient,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./stratakv_data"),
            open_mode: OpenMode::Strict,
            sync_on_publish: true,
            flush_threshold_bytes: 4 * 1024 * 1024, // 4 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold_bytes == 0 {
            return Err(StrataError::Config(
                "flush_threshold_bytes must be greater than zero".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(StrataError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the memtable flush threshold (in bytes)
    pub fn flush_threshold_bytes(mut self, size: usize) -> Self {
        self.config.flush_threshold_bytes = size;
        self
    }

    /// Set how unreadable tables are handled on open
    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.config.open_mode = mode;
        self
    }

    /// Enable or disable fsync on table publication
    pub fn sync_on_publish(mut self, sync: bool) -> Self {
        self.config.sync_on_publish = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
