//! MemTable implementation
//!
//! Copy-on-write BTreeMap keyed by the raw key bytes.

use std::collections::BTreeMap;
use std::io::Write;
use std::ops::Bound;
use std::sync::Arc;

use bytes::Bytes;

use crate::clock::LogicalClock;
use crate::entry::Entry;
use crate::error::Result;
use crate::storage::{SSTableBuilder, TableSummary};
use crate::table::{EntryIter, Table};

type EntryMap = BTreeMap<Bytes, Entry>;

/// In-memory table for recent writes
pub struct MemTable {
    /// Shared with in-flight iterators; cloned on write if one is alive
    map: Arc<EntryMap>,
    /// Approximate serialized size; only grows until the next clear
    size: usize,
    clock: Arc<LogicalClock>,
}

impl MemTable {
    /// Create a new empty MemTable stamping writes from `clock`
    pub fn new(clock: Arc<LogicalClock>) -> Self {
        Self {
            map: Arc::new(EntryMap::new()),
            size: 0,
            clock,
        }
    }

    /// Insert or overwrite `key`; returns the new size estimate
    pub fn upsert(&mut self, key: Bytes, value: Bytes) -> usize {
        let entry = Entry::live(key, value, self.clock.next());
        self.insert(entry)
    }

    /// Record a tombstone for `key`; the key need not exist
    pub fn remove(&mut self, key: Bytes) -> usize {
        let entry = Entry::tombstone(key, self.clock.next());
        self.insert(entry)
    }

    fn insert(&mut self, entry: Entry) -> usize {
        // Overwritten entries are not subtracted.
        self.size += entry.encoded_len();
        Arc::make_mut(&mut self.map).insert(entry.key.clone(), entry);
        self.size
    }

    /// The memtable's own version of `key`, tombstones included
    pub fn get(&self, key: &[u8]) -> Option<&Entry> {
        self.map.get(key)
    }

    /// Entries with key >= `from` in ascending order
    pub fn range_from(&self, from: &[u8]) -> MemTableIter {
        MemTableIter {
            map: Arc::clone(&self.map),
            lower: Some(Bound::Included(Bytes::copy_from_slice(from))),
        }
    }

    /// Serialize every entry in key order to `sink` in the SSTable format
    pub fn write_to<W: Write>(&self, sink: W) -> Result<TableSummary> {
        let mut builder = SSTableBuilder::new(sink);
        for entry in self.map.values() {
            builder.add(entry)?;
        }
        builder.finish()
    }

    /// `write_to` followed by `clear`
    pub fn flush_to<W: Write>(&mut self, sink: W) -> Result<TableSummary> {
        let summary = self.write_to(sink)?;
        self.clear();
        Ok(summary)
    }

    /// Drop all entries and reset the size estimate
    pub fn clear(&mut self) {
        self.map = Arc::new(EntryMap::new());
        self.size = 0;
    }

    /// Approximate size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn entry_count(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Check if the size estimate is past `threshold`
    pub fn should_flush(&self, threshold: usize) -> bool {
        self.size > threshold
    }
}

impl Table for MemTable {
    fn iterate_from(&self, from: &[u8]) -> Result<EntryIter> {
        Ok(Box::new(self.range_from(from).map(Ok)))
    }

    fn len(&self) -> usize {
        self.entry_count()
    }

    fn upsert(&mut self, key: Bytes, value: Bytes) -> Result<()> {
        MemTable::upsert(self, key, value);
        Ok(())
    }

    fn remove(&mut self, key: Bytes) -> Result<()> {
        MemTable::remove(self, key);
        Ok(())
    }
}

impl std::fmt::Debug for MemTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTable")
            .field("entries", &self.map.len())
            .field("size", &self.size)
            .finish()
    }
}

/// Iterator over a MemTable snapshot
///
/// Re-seeks past the last returned key on every step, so it owns no borrow
/// of the map and can outlive the MemTable it came from.
pub struct MemTableIter {
    map: Arc<EntryMap>,
    /// `None` once exhausted
    lower: Option<Bound<Bytes>>,
}

impl Iterator for MemTableIter {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let lower = self.lower.take()?;
        let bound: Bound<&[u8]> = match &lower {
            Bound::Included(key) => Bound::Included(&key[..]),
            Bound::Excluded(key) => Bound::Excluded(&key[..]),
            Bound::Unbounded => Bound::Unbounded,
        };

        let entry = self
            .map
            .range::<[u8], _>((bound, Bound::Unbounded))
            .next()
            .map(|(_, entry)| entry.clone())?;

        self.lower = Some(Bound::Excluded(entry.key.clone()));
        Some(entry)
    }
}
