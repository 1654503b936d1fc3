//! Table abstraction
//!
//! The mutable memtable and immutable SSTables expose the same read surface,
//! so the merge iterator can consume either. Mutations are only meaningful on
//! the memtable; SSTables keep the default implementations, which fail with
//! `Unsupported`.

use bytes::Bytes;

use crate::entry::Entry;
use crate::error::{Result, StrataError};

/// Owned, lazily evaluated stream of entries in ascending key order
pub type EntryIter = Box<dyn Iterator<Item = Result<Entry>> + Send>;

pub trait Table {
    /// Entries with key >= `from`, ascending
    fn iterate_from(&self, from: &[u8]) -> Result<EntryIter>;

    /// Number of entries (tombstones included)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn upsert(&mut self, _key: Bytes, _value: Bytes) -> Result<()> {
        Err(StrataError::Unsupported("table is immutable".to_string()))
    }

    fn remove(&mut self, _key: Bytes) -> Result<()> {
        Err(StrataError::Unsupported("table is immutable".to_string()))
    }
}
