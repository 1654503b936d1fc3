//! Merge Iterator
//!
//! K-way merge of memtable and SSTable iterators into one ascending stream.
//!
//! ## Resolution rules
//! - Entries are popped in (key ASC, timestamp DESC) order, so the first
//!   entry seen for a key is its newest version.
//! - Every other source positioned on that key is advanced past it; exactly
//!   one entry per key leaves the iterator.
//! - A winning tombstone hides the key unless tombstones were requested.
//!
//! Source order does not matter: only timestamps decide between versions.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::entry::{Entry, Record};
use crate::error::{Result, StrataError};
use crate::table::EntryIter;

/// Merged, de-duplicated view over several sorted sources
pub struct MergeIterator {
    sources: Vec<EntryIter>,
    heap: BinaryHeap<HeapEntry>,
    include_tombstones: bool,
    /// First error pulled from a source, yielded on the next call
    pending_error: Option<StrataError>,
    /// Set after an error; the iterator yields nothing more
    done: bool,
}

struct HeapEntry {
    entry: Entry,
    source: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on key, newest timestamp first among equal keys.
        other
            .entry
            .key
            .cmp(&self.entry.key)
            .then_with(|| self.entry.timestamp.cmp(&other.entry.timestamp))
            .then_with(|| other.source.cmp(&self.source))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl MergeIterator {
    /// Merge `sources`, each already positioned at the desired start key
    ///
    /// Pulls the first entry of every source; fails if any of them fails.
    pub fn new(sources: Vec<EntryIter>) -> Result<Self> {
        let mut merge = Self {
            heap: BinaryHeap::with_capacity(sources.len()),
            sources,
            include_tombstones: false,
            pending_error: None,
            done: false,
        };
        for source in 0..merge.sources.len() {
            merge.advance(source);
        }
        match merge.pending_error.take() {
            Some(e) => Err(e),
            None => Ok(merge),
        }
    }

    /// Yield winning tombstones instead of hiding their keys
    pub fn with_tombstones(mut self) -> Self {
        self.include_tombstones = true;
        self
    }

    /// Adapt to live `Record`s
    pub fn into_records(self) -> RecordIterator {
        RecordIterator { inner: self }
    }

    /// Pull the next entry of `source` into the heap
    fn advance(&mut self, source: usize) {
        match self.sources[source].next() {
            Some(Ok(entry)) => self.heap.push(HeapEntry { entry, source }),
            Some(Err(e)) => {
                self.pending_error.get_or_insert(e);
            }
            None => {}
        }
    }

    /// Pop the newest version of the smallest key and skip all older ones
    fn next_winner(&mut self) -> Option<Entry> {
        let winner = self.heap.pop()?;
        self.advance(winner.source);

        while let Some(top) = self.heap.peek() {
            if top.entry.key != winner.entry.key {
                break;
            }
            let source = top.source;
            self.heap.pop();
            self.advance(source);
        }

        Some(winner.entry)
    }
}

impl Iterator for MergeIterator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            // A failed source no longer shadows anything, so nothing after
            // the failure can be trusted.
            if let Some(e) = self.pending_error.take() {
                self.done = true;
                return Some(Err(e));
            }

            let entry = self.next_winner()?;
            if entry.is_tombstone() && !self.include_tombstones {
                continue;
            }
            return Some(Ok(entry));
        }
    }
}

/// Live key/value pairs from a merge
pub struct RecordIterator {
    inner: MergeIterator,
}

impl Iterator for RecordIterator {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(Entry {
                    key,
                    value: Some(value),
                    ..
                }) => return Some(Ok(Record { key, value })),
                // Only reachable when tombstones were requested.
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
