//! SSTable Builder
//!
//! Streams sorted entries into any `Write` sink in the SSTable format.

use std::io::{BufWriter, Write};

use bytes::{Bytes, BytesMut};

use crate::codec;
use crate::entry::Entry;
use crate::error::{Result, StrataError};

use super::MAGIC;

/// What a finished builder wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSummary {
    pub entry_count: usize,
    pub bytes_written: u64,
}

/// Builder for creating SSTables from sorted entries
pub struct SSTableBuilder<W: Write> {
    /// Buffered writer for performance
    writer: BufWriter<W>,
    /// Start of each entry within the data region
    offsets: Vec<u32>,
    /// Current write position in the data region
    data_len: usize,
    /// Keys must be strictly ascending
    last_key: Option<Bytes>,
    /// Reused encoding buffer
    scratch: BytesMut,
}

impl<W: Write> SSTableBuilder<W> {
    /// Create a new SSTable builder writing into `sink`
    ///
    /// Call `add()` in ascending key order, then `finish()` to write the
    /// offset table and trailer.
    pub fn new(sink: W) -> Self {
        Self {
            writer: BufWriter::new(sink),
            offsets: Vec::new(),
            data_len: 0,
            last_key: None,
            scratch: BytesMut::new(),
        }
    }

    /// Append an entry (live or tombstone)
    pub fn add(&mut self, entry: &Entry) -> Result<()> {
        if let Some(last) = &self.last_key {
            if entry.key <= *last {
                return Err(StrataError::InvalidInput(format!(
                    "SSTable keys must be strictly ascending: {:?} after {:?}",
                    entry.key, last
                )));
            }
        }

        let offset = codec::checked_u32(self.data_len, "entry offset")?;

        self.scratch.clear();
        entry.encode(&mut self.scratch)?;
        self.writer.write_all(&self.scratch)?;

        self.offsets.push(offset);
        self.data_len += self.scratch.len();
        self.last_key = Some(entry.key.clone());
        Ok(())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> usize {
        self.offsets.len()
    }

    /// Write offset table and trailer, flush the sink
    pub fn finish(mut self) -> Result<TableSummary> {
        let count = codec::checked_u32(self.offsets.len(), "entry count")?;

        self.scratch.clear();
        for offset in &self.offsets {
            codec::put_u32(&mut self.scratch, *offset);
        }
        codec::put_u32(&mut self.scratch, count);
        codec::put_u32(&mut self.scratch, MAGIC);
        self.writer.write_all(&self.scratch)?;
        self.writer.flush()?;

        Ok(TableSummary {
            entry_count: self.offsets.len(),
            bytes_written: (self.data_len + self.scratch.len()) as u64,
        })
    }
}
