//! Engine Module
//!
//! The storage engine that coordinates the memtable and the SSTables.
//!
//! ## Responsibilities
//! - Route writes to the memtable and flush it past the size threshold
//! - Answer point and range reads through the merge iterator
//! - Publish flushed and compacted tables atomically
//! - Load existing tables on startup

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::clock::LogicalClock;
use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::memtable::MemTable;
use crate::storage::{MergeIterator, RecordIterator, SSTable, SSTableBuilder, StorageManager};
use crate::table::{EntryIter, Table};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (upsert/remove/flush/compact) take the state write lock, so
///   only one runs at a time and no read starts while a flush or compaction
///   swaps the table list.
/// - **Reads** (get/iterator) take the read lock just long enough to open an
///   iterator on every table. The iterators own their snapshot (the
///   memtable's copy-on-write map and the tables' mappings), so a scan keeps
///   returning the data it started with after the lock is released.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Timestamp source for entries and table generations
    clock: Arc<LogicalClock>,

    /// Directory and table file handling
    storage: StorageManager,

    /// Memtable plus table list, swapped together
    state: RwLock<EngineState>,
}

struct EngineState {
    memtable: MemTable,
    /// Ordered oldest → newest
    sstables: Vec<SSTable>,
}

impl EngineState {
    /// Iterators over every table, positioned at `from`
    fn sources_from(&self, from: &[u8]) -> Result<Vec<EntryIter>> {
        let mut sources = Vec::with_capacity(self.sstables.len() + 1);
        sources.push(self.memtable.iterate_from(from)?);
        for table in &self.sstables {
            sources.push(table.iterate_from(from)?);
        }
        Ok(sources)
    }
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Load existing SSTables (strict or lenient per config)
    /// 3. Advance the clock past the newest table generation
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(LogicalClock::new()))
    }

    /// Open with a path and flush threshold (convenience method)
    pub fn open_path(path: &Path, flush_threshold_bytes: usize) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .flush_threshold_bytes(flush_threshold_bytes)
            .build();
        Self::open(config)
    }

    /// Open using an externally supplied clock
    pub fn open_with_clock(config: Config, clock: Arc<LogicalClock>) -> Result<Self> {
        config.validate()?;

        let storage = StorageManager::open(&config)?;
        let sstables = storage.discover()?;

        // Timestamps and file names must keep growing across restarts even
        // if the wall clock moved backwards in between. Tables skipped by a
        // lenient open still own their names.
        if let Some(newest) = storage.newest_generation()? {
            clock.observe(newest);
        }

        info!(
            data_dir = %config.data_dir.display(),
            sstables = sstables.len(),
            "opened engine"
        );

        Ok(Self {
            state: RwLock::new(EngineState {
                memtable: MemTable::new(Arc::clone(&clock)),
                sstables,
            }),
            config,
            clock,
            storage,
        })
    }

    /// Get the current value of `key`
    ///
    /// Fails with `KeyNotFound` if the key was never written or its newest
    /// version is a tombstone.
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        match self.iterator(key)?.next() {
            Some(Ok(record)) if record.key[..] == *key => Ok(record.value),
            Some(Err(e)) => Err(e),
            _ => Err(StrataError::KeyNotFound),
        }
    }

    /// Insert or overwrite a key
    pub fn upsert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        state
            .memtable
            .upsert(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));

        if state.memtable.should_flush(self.config.flush_threshold_bytes) {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    /// Delete a key; deleting an absent key is not an error
    pub fn remove(&self, key: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        state.memtable.remove(Bytes::copy_from_slice(key));

        if state.memtable.should_flush(self.config.flush_threshold_bytes) {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    /// Live records with key >= `from`, ascending, one per key
    pub fn iterator(&self, from: &[u8]) -> Result<RecordIterator> {
        let sources = self.state.read().sources_from(from)?;
        Ok(MergeIterator::new(sources)?.into_records())
    }

    /// Flush memtable to disk
    ///
    /// Forces a flush regardless of memtable size; no-op when it is empty.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        self.flush_locked(&mut state)
    }

    /// Internal flush implementation (called with the write lock held)
    ///
    /// The memtable is cleared only after the new table is renamed into
    /// place and registered.
    fn flush_locked(&self, state: &mut EngineState) -> Result<()> {
        if state.memtable.is_empty() {
            return Ok(());
        }

        let generation = self.clock.next();
        let memtable = &state.memtable;
        let table = self
            .storage
            .publish(generation, |file| memtable.write_to(file))?;

        info!(
            generation,
            entries = table.entry_count(),
            bytes = table.file_size(),
            "flushed memtable"
        );

        state.sstables.push(table);
        state.memtable.clear();
        Ok(())
    }

    /// Fold the memtable and every SSTable into one new SSTable
    ///
    /// The memtable is flushed first, so every tombstone it holds is on disk
    /// before any older table is deleted. Overwritten versions and tombstones
    /// are then dropped; when nothing live remains, no table is written at
    /// all. Superseded files are deleted oldest first once the new table
    /// list is in place.
    pub fn compact(&self) -> Result<()> {
        let mut state = self.state.write();
        self.flush_locked(&mut state)?;
        if state.sstables.is_empty() {
            return Ok(());
        }

        let bytes_before: u64 = state.sstables.iter().map(SSTable::file_size).sum();
        let mut merged = MergeIterator::new(state.sources_from(&[])?)?.peekable();

        let compacted = if merged.peek().is_some() {
            let generation = self.clock.next();
            let table = self.storage.publish(generation, |file| {
                let mut builder = SSTableBuilder::new(file);
                for entry in merged {
                    builder.add(&entry?)?;
                }
                builder.finish()
            })?;
            Some(table)
        } else {
            None
        };

        let bytes_after = compacted.as_ref().map_or(0, SSTable::file_size);
        let retired = std::mem::replace(&mut state.sstables, compacted.into_iter().collect());

        info!(
            tables_folded = retired.len(),
            bytes_before,
            bytes_after,
            "compacted"
        );

        // The new table list is already live. Files left behind stay
        // shadowed by the newer ones left with them until a reopen picks
        // them up again.
        if let Err(error) = self.storage.retire(&retired) {
            warn!(%error, "failed to remove superseded SSTables");
        }
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data; a no-op for an empty memtable.
    pub fn close(self) -> Result<()> {
        let mut state = self.state.write();
        self.flush_locked(&mut state)?;
        debug!(sstables = state.sstables.len(), "closed engine");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        self.storage.data_dir()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the current memtable size estimate
    pub fn memtable_size(&self) -> usize {
        self.state.read().memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.state.read().memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.state.read().sstables.len()
    }

    /// Bytes used by table files on disk
    pub fn disk_usage(&self) -> Result<u64> {
        self.storage.disk_usage()
    }
}
