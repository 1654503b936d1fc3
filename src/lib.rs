//! # StrataKV
//!
//! An embedded log-structured-merge key-value storage engine with:
//! - An in-memory memtable absorbing every write
//! - Immutable, memory-mapped SSTables produced by flushes
//! - Tombstone deletes resolved by logical timestamps
//! - Full compaction folding every generation into one table
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │        get / upsert / remove / iterator / compact            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │ writes                  │ reads
//!          ▼                         ▼
//!   ┌─────────────┐          ┌────────────────┐
//!   │  MemTable   │─────────▶│ MergeIterator  │
//!   │ (BTreeMap)  │          │ newest wins    │
//!   └──────┬──────┘          └────────────────┘
//!          │ flush (tmp → rename)    ▲
//!          ▼                         │
//!   ┌─────────────┐                  │
//!   │  SSTables   │──────────────────┘
//!   │   (mmap)    │
//!   └─────────────┘
//! ```
//!
//! ## Example
//! ```no_run
//! use stratakv::{Config, Engine};
//!
//! let engine = Engine::open(Config::builder().data_dir("/tmp/strata").build())?;
//! engine.upsert(b"a", b"1")?;
//! assert_eq!(&engine.get(b"a")?[..], b"1");
//! engine.close()?;
//! # Ok::<(), stratakv::StrataError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod clock;
pub mod codec;
pub mod entry;
pub mod table;
pub mod memtable;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StrataError};
pub use config::{Config, OpenMode};
pub use clock::LogicalClock;
pub use entry::{Entry, Record};
pub use table::Table;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StrataKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
