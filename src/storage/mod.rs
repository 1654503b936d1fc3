//! Storage Module
//!
//! Persistent storage layer: immutable SSTables, the directory that holds
//! them, and the merge that reads across generations.
//!
//! ## Responsibilities
//! - Persist sorted entries to disk in the SSTable format
//! - Binary-search point lookups and range scans over memory-mapped files
//! - Atomic publication of flushed and compacted tables
//! - Merge every generation into one de-duplicated, ordered stream

mod manager;
mod merge;
mod sstable;

pub use manager::StorageManager;
pub use merge::{MergeIterator, RecordIterator};
pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, TableSummary};
