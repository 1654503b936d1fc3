//! Entry
//!
//! The unit of storage shared by the memtable, SSTables and the merge
//! iterator, plus its on-disk encoding:
//!
//! ```text
//! ┌──────────────┬──────────┬──────────────────┬──────────────┬────────────┐
//! │ KeyLen: u32  │ Key      │ Timestamp: i64   │ ValLen: u32  │ Value      │
//! └──────────────┴──────────┴──────────────────┴──────────────┴────────────┘
//!   Tombstones store the negated timestamp and stop after it.
//! ```

use bytes::{BufMut, Bytes};

use crate::codec::{self, U64_SIZE};
use crate::error::{Result, StrataError};

/// One version of a key: a live value or a tombstone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Bytes,
    /// `None` marks a tombstone
    pub value: Option<Bytes>,
    /// Logical timestamp; the greater one wins between versions of a key
    pub timestamp: u64,
}

impl Entry {
    /// A live value
    pub fn live(key: Bytes, value: Bytes, timestamp: u64) -> Self {
        Self {
            key,
            value: Some(value),
            timestamp,
        }
    }

    /// A deletion marker
    pub fn tombstone(key: Bytes, timestamp: u64) -> Self {
        Self {
            key,
            value: None,
            timestamp,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Bytes this entry occupies in an SSTable data region
    pub fn encoded_len(&self) -> usize {
        let base = codec::len_prefixed_size(&self.key) + U64_SIZE;
        match &self.value {
            Some(value) => base + codec::len_prefixed_size(value),
            None => base,
        }
    }

    /// Append the on-disk form of this entry
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let signed = i64::try_from(self.timestamp).map_err(|_| {
            StrataError::InvalidInput(format!("timestamp {} cannot be encoded", self.timestamp))
        })?;
        if self.is_tombstone() && signed == 0 {
            return Err(StrataError::InvalidInput(
                "tombstone timestamp must be non-zero".to_string(),
            ));
        }

        codec::put_len_prefixed(buf, &self.key)?;
        match &self.value {
            Some(value) => {
                codec::put_u64(buf, signed as u64);
                codec::put_len_prefixed(buf, value)?;
            }
            None => codec::put_u64(buf, signed.wrapping_neg() as u64),
        }
        Ok(())
    }

    /// Decode the entry starting at `offset`; key and value share `region`'s buffer
    pub fn decode(region: &Bytes, offset: usize) -> Result<Entry> {
        let (key, at) = codec::read_len_prefixed_bytes(region, offset)?;
        let signed = codec::read_u64(region, at)? as i64;

        if signed < 0 {
            return Ok(Entry::tombstone(key, signed.unsigned_abs()));
        }

        let (value, _) = codec::read_len_prefixed_bytes(region, at + U64_SIZE)?;
        Ok(Entry::live(key, value, signed as u64))
    }

    /// Borrow only the key of the entry at `offset`
    pub fn decode_key(region: &[u8], offset: usize) -> Result<&[u8]> {
        codec::read_len_prefixed(region, offset).map(|(key, _)| key)
    }
}

/// A live key/value pair as returned to callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl TryFrom<Entry> for Record {
    type Error = StrataError;

    fn try_from(entry: Entry) -> Result<Self> {
        match entry.value {
            Some(value) => Ok(Record {
                key: entry.key,
                value,
            }),
            None => Err(StrataError::KeyNotFound),
        }
    }
}
