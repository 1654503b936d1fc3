//! SSTable Module
//!
//! Sorted String Table - immutable on-disk sorted key-value storage.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Data Region (variable)                                  │
//! │   [KeyLen: u32][Key][Timestamp: i64][ValLen: u32][Value]│
//! │   ... repeated for each entry, ascending key order ...  │
//! │   (negative Timestamp = tombstone, no ValLen/Value)     │
//! ├─────────────────────────────────────────────────────────┤
//! │ Offset Table                                            │
//! │   [Offset: u32] per entry, start of entry in the data   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Trailer (8 bytes)                                       │
//! │   EntryCount: u32 (4) | Magic: u32 (4)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are big-endian.

mod builder;
mod iterator;
mod reader;

pub use builder::{SSTableBuilder, TableSummary};
pub use iterator::SSTableIterator;
pub use reader::SSTable;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Magic number closing every StrataKV SSTable file ("STKV")
pub(crate) const MAGIC: u32 = 0x5354_4B56;

/// Size of one offset table slot
pub(crate) const OFFSET_SIZE: usize = 4;

/// Trailer size: EntryCount (4) + Magic (4) = 8 bytes
pub(crate) const TRAILER_SIZE: usize = 8;
