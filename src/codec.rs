//! Byte codec helpers
//!
//! Fixed-width big-endian integers and length-prefixed byte strings shared by
//! every on-disk structure. Writers go through `bytes::BufMut`; readers work
//! on `Bytes` regions and return `CorruptFormat` instead of panicking when a
//! read would run past the end.

use bytes::{BufMut, Bytes};

use crate::error::{Result, StrataError};

pub const U32_SIZE: usize = 4;
pub const U64_SIZE: usize = 8;

// =============================================================================
// Encoding
// =============================================================================

/// Append a big-endian u32
pub fn put_u32(buf: &mut impl BufMut, value: u32) {
    buf.put_u32(value);
}

/// Append a big-endian u64
pub fn put_u64(buf: &mut impl BufMut, value: u64) {
    buf.put_u64(value);
}

/// Append `len: u32` followed by the bytes themselves
pub fn put_len_prefixed(buf: &mut impl BufMut, data: &[u8]) -> Result<()> {
    put_u32(buf, checked_u32(data.len(), "byte string length")?);
    buf.put_slice(data);
    Ok(())
}

/// Encoded size of a length-prefixed byte string
pub fn len_prefixed_size(data: &[u8]) -> usize {
    U32_SIZE + data.len()
}

/// Narrow a length or offset to u32, failing if it does not fit
pub fn checked_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StrataError::TableTooLarge(format!("{} {} exceeds u32::MAX", what, value)))
}

// =============================================================================
// Decoding
// =============================================================================

fn slice_at(region: &[u8], at: usize, len: usize) -> Result<&[u8]> {
    at.checked_add(len)
        .and_then(|end| region.get(at..end))
        .ok_or_else(|| {
            StrataError::CorruptFormat(format!(
                "read of {} bytes at offset {} past end of region ({} bytes)",
                len,
                at,
                region.len()
            ))
        })
}

/// Read a big-endian u32 at `at`
pub fn read_u32(region: &[u8], at: usize) -> Result<u32> {
    let raw = slice_at(region, at, U32_SIZE)?;
    Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Read a big-endian u64 at `at`
pub fn read_u64(region: &[u8], at: usize) -> Result<u64> {
    let raw = slice_at(region, at, U64_SIZE)?;
    let mut word = [0u8; U64_SIZE];
    word.copy_from_slice(raw);
    Ok(u64::from_be_bytes(word))
}

/// Borrow the length-prefixed byte string at `at`; returns it and the offset
/// just past it
pub fn read_len_prefixed(region: &[u8], at: usize) -> Result<(&[u8], usize)> {
    let len = read_u32(region, at)? as usize;
    let start = at + U32_SIZE;
    let data = slice_at(region, start, len)?;
    Ok((data, start + len))
}

/// Zero-copy variant of `read_len_prefixed` sharing the region's buffer
pub fn read_len_prefixed_bytes(region: &Bytes, at: usize) -> Result<(Bytes, usize)> {
    let (data, next) = read_len_prefixed(region, at)?;
    Ok((region.slice_ref(data), next))
}
