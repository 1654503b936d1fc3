//! SSTable Reader
//!
//! Memory-maps SSTable files and serves binary-search lookups straight out of
//! the mapping. Keys and values handed out are `Bytes` views into the map, so
//! nothing is copied and the map lives as long as any of them.

use std::cmp::Ordering;
use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;

use crate::codec;
use crate::entry::Entry;
use crate::error::{Result, StrataError};
use crate::table::{EntryIter, Table};

use super::iterator::SSTableIterator;
use super::{MAGIC, OFFSET_SIZE, TRAILER_SIZE};

/// An immutable, validated SSTable
#[derive(Debug, Clone)]
pub struct SSTable {
    /// Entry data region
    pub(super) data: Bytes,
    /// Offset table, one big-endian u32 per entry
    pub(super) offsets: Bytes,
    pub(super) entry_count: usize,
    file_size: usize,
    path: Option<PathBuf>,
    generation: u64,
}

impl SSTable {
    /// Open and memory-map an SSTable file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        // Mapping an empty file fails on some platforms; report it as the
        // truncation it is.
        if file_len < TRAILER_SIZE as u64 {
            return Err(StrataError::CorruptFormat(format!(
                "file is {} bytes, smaller than the {}-byte trailer",
                file_len, TRAILER_SIZE
            )));
        }

        // SAFETY: table files are written once under a temporary name and
        // never modified after the rename; the engine owns the directory
        // exclusively, so the mapping cannot change underneath us.
        let mmap = unsafe { Mmap::map(&file)? };

        let mut table = Self::from_region(Bytes::from_owner(mmap))?;
        table.path = Some(path.to_path_buf());
        Ok(table)
    }

    /// Validate and wrap an in-memory SSTable image
    ///
    /// Checks the magic number, that the offset table fits in the region,
    /// and that offsets are strictly increasing and inside the data region.
    pub fn from_region(region: Bytes) -> Result<Self> {
        let len = region.len();
        if len < TRAILER_SIZE {
            return Err(StrataError::CorruptFormat(format!(
                "region is {} bytes, smaller than the {}-byte trailer",
                len, TRAILER_SIZE
            )));
        }

        let magic = codec::read_u32(&region, len - 4)?;
        if magic != MAGIC {
            return Err(StrataError::CorruptFormat(format!(
                "bad magic: expected {:#010x}, got {:#010x}",
                MAGIC, magic
            )));
        }

        let entry_count = codec::read_u32(&region, len - TRAILER_SIZE)? as usize;
        let data_len = entry_count
            .checked_mul(OFFSET_SIZE)
            .and_then(|offsets_len| (len - TRAILER_SIZE).checked_sub(offsets_len))
            .ok_or_else(|| {
                StrataError::CorruptFormat(format!(
                    "{} entries advertised but region holds only {} bytes",
                    entry_count, len
                ))
            })?;

        let table = Self {
            data: region.slice(..data_len),
            offsets: region.slice(data_len..len - TRAILER_SIZE),
            entry_count,
            file_size: len,
            path: None,
            generation: 0,
        };
        table.validate_offsets()?;
        Ok(table)
    }

    fn validate_offsets(&self) -> Result<()> {
        let mut previous: Option<usize> = None;
        for i in 0..self.entry_count {
            let offset = self.offset_at(i)?;
            let in_order = previous.map_or(offset == 0, |p| offset > p);
            if !in_order || offset >= self.data.len() {
                return Err(StrataError::CorruptFormat(format!(
                    "offset {} of entry {} is out of order or outside the {}-byte data region",
                    offset,
                    i,
                    self.data.len()
                )));
            }
            previous = Some(offset);
        }
        Ok(())
    }

    /// Tag this table with the generation encoded in its file name
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub(super) fn offset_at(&self, index: usize) -> Result<usize> {
        codec::read_u32(&self.offsets, index * OFFSET_SIZE).map(|o| o as usize)
    }

    fn key_at(&self, index: usize) -> Result<&[u8]> {
        Entry::decode_key(&self.data, self.offset_at(index)?)
    }

    pub(super) fn entry_at(&self, index: usize) -> Result<Entry> {
        Entry::decode(&self.data, self.offset_at(index)?)
    }

    /// Index of the first entry whose key is >= `key`
    ///
    /// On an exact match the matching index is returned directly.
    pub fn seek(&self, key: &[u8]) -> Result<usize> {
        let mut left = 0usize;
        let mut right = self.entry_count;
        while left < right {
            let mid = left + (right - left) / 2;
            match self.key_at(mid)?.cmp(key) {
                Ordering::Less => left = mid + 1,
                Ordering::Greater => right = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Ok(left)
    }

    /// Point lookup; a tombstone is returned as such
    pub fn get(&self, key: &[u8]) -> Result<Option<Entry>> {
        let position = self.seek(key)?;
        if position < self.entry_count && self.key_at(position)? == key {
            return self.entry_at(position).map(Some);
        }
        Ok(None)
    }

    /// Lazy forward iterator starting at `seek(from)`
    pub fn iter_from(&self, from: &[u8]) -> Result<SSTableIterator> {
        let position = self.seek(from)?;
        Ok(SSTableIterator::new(self.clone(), position))
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Total size of the table image in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size as u64
    }

    /// Backing file, if opened from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Table for SSTable {
    fn iterate_from(&self, from: &[u8]) -> Result<EntryIter> {
        Ok(Box::new(self.iter_from(from)?))
    }

    fn len(&self) -> usize {
        self.entry_count
    }
}
