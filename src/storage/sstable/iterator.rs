//! SSTable Iterator
//!
//! Forward iteration over an SSTable from a seek position.

use crate::entry::Entry;
use crate::error::Result;

use super::SSTable;

/// Iterator over SSTable entries in sorted key order
///
/// Holds its own handle on the table's mapping, so it stays valid after the
/// table is dropped from the engine (or its file is deleted).
pub struct SSTableIterator {
    table: SSTable,
    position: usize,
}

impl SSTableIterator {
    pub(super) fn new(table: SSTable, position: usize) -> Self {
        Self { table, position }
    }
}

impl Iterator for SSTableIterator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.table.entry_count {
            return None;
        }

        let item = self.table.entry_at(self.position);
        // Stop after a decode error instead of yielding it again.
        self.position = if item.is_ok() {
            self.position + 1
        } else {
            self.table.entry_count
        };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.entry_count.saturating_sub(self.position);
        (0, Some(remaining))
    }
}
