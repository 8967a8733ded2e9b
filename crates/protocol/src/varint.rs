//! Base-128 varint codec
//!
//! Each byte carries 7 bits of the value, least significant group first.
//! The high bit of a byte is set when another byte follows.

use bytes::{BufMut, BytesMut};
use fxlist_core::{FxListError, Result};

/// Read a 32-bit varint from the start of `bytes`
///
/// Returns the value and the number of bytes consumed.
///
/// # Format
/// - Up to 5 significant bytes; bits above 32 are discarded (u32 wrap)
/// - Longer continuation runs are consumed but contribute nothing
#[inline]
pub fn read_varint(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if shift < 32 {
            result |= ((byte & 0x7F) as u32) << shift;
        }
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    Err(FxListError::TruncatedInput {
        needed: bytes.len() + 1,
        available: bytes.len(),
    })
}

/// Read a 64-bit varint from the start of `bytes`
#[inline]
pub fn read_varint64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if shift < 64 {
            result |= ((byte & 0x7F) as u64) << shift;
        }
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    Err(FxListError::TruncatedInput {
        needed: bytes.len() + 1,
        available: bytes.len(),
    })
}

/// Write a 32-bit varint using the shortest encoding
#[inline]
pub fn write_varint(buf: &mut BytesMut, val: u32) {
    write_varint64(buf, val as u64);
}

/// Write a 64-bit varint using the shortest encoding
#[inline]
pub fn write_varint64(buf: &mut BytesMut, mut val: u64) {
    while val >= 0x80 {
        buf.put_u8((val as u8 & 0x7F) | 0x80);
        val >>= 7;
    }
    buf.put_u8(val as u8);
}

/// Number of bytes [`write_varint64`] emits for `val`
#[inline]
pub fn varint_len(val: u64) -> usize {
    let bits = 64 - (val | 1).leading_zeros() as usize;
    (bits + 6) / 7
}
