//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Absorb upserts and removals, stamping each with a logical timestamp
//! - Track an approximate serialized size for flush triggers
//! - Ordered, seekable iteration for reads and SSTable creation
//! - Serialize itself to the SSTable format
//!
//! ## Data Structure Choice
//! BTreeMap behind an `Arc` with copy-on-write:
//! - Ordered keys (required for SSTable generation)
//! - An iterator holds its own `Arc`, so later writes or a flush never
//!   change what an in-flight scan observes
//! - Writes only pay for a copy while such a scan is alive

mod table;

pub use table::{MemTable, MemTableIter};
