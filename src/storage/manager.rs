//! Storage Manager
//!
//! Owns the on-disk directory: naming, discovery and publication of SSTable
//! files.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup (oldest → newest)
//! - Clean up temporary files left by an interrupted flush
//! - Publish new tables atomically (temp file → fsync → rename)
//! - Delete tables superseded by a compaction
//!
//! ## Naming
//! `{generation:020}.db` for finalized tables, `{generation:020}.tmp` while a
//! table is being written. The generation is the logical timestamp at which
//! the table was created, so name order is creation order.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{Config, OpenMode};
use crate::error::{Result, StrataError, TableOpenFailure};

use super::{SSTable, TableSummary};

const FINAL_SUFFIX: &str = ".db";
const TEMP_SUFFIX: &str = ".tmp";

/// Manages the table files of one data directory
#[derive(Debug)]
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,
    open_mode: OpenMode,
    sync_on_publish: bool,
}

impl StorageManager {
    /// Open or create storage in the configured directory
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        Ok(Self {
            data_dir: config.data_dir.clone(),
            open_mode: config.open_mode,
            sync_on_publish: config.sync_on_publish,
        })
    }

    /// Load every finalized table, oldest generation first
    ///
    /// Stale temporary files are deleted. Unreadable tables fail the whole
    /// call in strict mode and are skipped with a warning in lenient mode.
    pub fn discover(&self) -> Result<Vec<SSTable>> {
        let mut found: Vec<(u64, PathBuf)> = Vec::new();

        for dir_entry in fs::read_dir(&self.data_dir)? {
            let path = dir_entry?.path();
            if !path.is_file() {
                continue;
            }

            if Self::parse_generation(&path, TEMP_SUFFIX).is_some() {
                warn!(path = %path.display(), "removing unfinished SSTable");
                fs::remove_file(&path)?;
            } else if let Some(generation) = Self::parse_generation(&path, FINAL_SUFFIX) {
                found.push((generation, path));
            }
        }

        found.sort_unstable_by_key(|(generation, _)| *generation);

        let mut tables = Vec::with_capacity(found.len());
        let mut failures = Vec::new();

        for (generation, path) in found {
            match SSTable::open(&path) {
                Ok(table) => tables.push(table.with_generation(generation)),
                Err(error) => match self.open_mode {
                    OpenMode::Strict => failures.push(TableOpenFailure {
                        path,
                        error: Box::new(error),
                    }),
                    OpenMode::Lenient => {
                        warn!(path = %path.display(), %error, "skipping unreadable SSTable");
                    }
                },
            }
        }

        if !failures.is_empty() {
            return Err(StrataError::OpenFailed(failures));
        }
        Ok(tables)
    }

    /// Write a new table under `generation` and make it visible atomically
    ///
    /// `write` fills the temporary file. Only once it succeeded (and the
    /// file is synced) is the file renamed to its final name; on any failure
    /// the temporary file is removed and nothing appears under the final name.
    pub fn publish<F>(&self, generation: u64, write: F) -> Result<SSTable>
    where
        F: FnOnce(&mut File) -> Result<TableSummary>,
    {
        let temp_path = self.temp_path(generation);
        let final_path = self.table_path(generation);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;

        let written = write(&mut file).and_then(|summary| {
            if self.sync_on_publish {
                file.sync_all()?;
            }
            Ok(summary)
        });
        drop(file);

        let summary = match written.and_then(|s| {
            fs::rename(&temp_path, &final_path)?;
            Ok(s)
        }) {
            Ok(summary) => summary,
            Err(e) => {
                self.discard(&temp_path);
                return Err(e);
            }
        };

        if self.sync_on_publish {
            self.sync_dir()?;
        }

        debug!(
            generation,
            entries = summary.entry_count,
            bytes = summary.bytes_written,
            path = %final_path.display(),
            "published SSTable"
        );

        Ok(SSTable::open(&final_path)?.with_generation(generation))
    }

    /// Delete the files of superseded tables, in the order given
    ///
    /// Callers pass tables oldest first, so an interrupted retirement never
    /// leaves an old value without the newer tombstone that shadowed it.
    /// Stops at the first file that cannot be removed.
    pub fn retire(&self, tables: &[SSTable]) -> Result<()> {
        for table in tables {
            if let Some(path) = table.path() {
                fs::remove_file(path)?;
                debug!(generation = table.generation(), path = %path.display(), "removed SSTable");
            }
        }
        if self.sync_on_publish && !tables.is_empty() {
            self.sync_dir()?;
        }
        Ok(())
    }

    /// Highest generation among finalized table file names
    ///
    /// Counts every `.db` name, including tables that fail to open.
    pub fn newest_generation(&self) -> Result<Option<u64>> {
        let mut newest = None;
        for dir_entry in fs::read_dir(&self.data_dir)? {
            if let Some(generation) = Self::parse_generation(&dir_entry?.path(), FINAL_SUFFIX) {
                newest = newest.max(Some(generation));
            }
        }
        Ok(newest)
    }

    /// Total bytes of finalized table files in the directory
    pub fn disk_usage(&self) -> Result<u64> {
        let mut total = 0;
        for dir_entry in fs::read_dir(&self.data_dir)? {
            let dir_entry = dir_entry?;
            if Self::parse_generation(&dir_entry.path(), FINAL_SUFFIX).is_some() {
                total += dir_entry.metadata()?.len();
            }
        }
        Ok(total)
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Final file path of the table with the given generation
    pub fn table_path(&self, generation: u64) -> PathBuf {
        self.data_dir.join(format!("{:020}{}", generation, FINAL_SUFFIX))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn temp_path(&self, generation: u64) -> PathBuf {
        self.data_dir.join(format!("{:020}{}", generation, TEMP_SUFFIX))
    }

    /// "00000000000000000042.db" → Some(42)
    fn parse_generation(path: &Path, suffix: &str) -> Option<u64> {
        let name = path.file_name()?.to_str()?;
        let digits = name.strip_suffix(suffix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    fn discard(&self, temp_path: &Path) {
        if let Err(error) = fs::remove_file(temp_path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %temp_path.display(), %error, "failed to remove temporary SSTable");
            }
        }
    }

    #[cfg(unix)]
    fn sync_dir(&self) -> Result<()> {
        File::open(&self.data_dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<()> {
        Ok(())
    }
}
