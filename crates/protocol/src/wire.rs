//! Bounds-checked cursor over one encoded message

use crate::varint::{read_varint, read_varint64};
use fxlist_core::{FxListError, Result};
use std::borrow::Cow;

/// How a field's value is laid out after its tag
///
/// Group start/end (3 and 4) are not supported by this schema and are
/// treated like any other unknown wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// Read-only cursor over an encoded message
///
/// All reads check the remaining length before slicing, so malformed input
/// yields [`FxListError::TruncatedInput`] instead of a panic.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub fn read_varint(&mut self) -> Result<u32> {
        let (val, consumed) = read_varint(&self.buf[self.pos..])?;
        self.pos += consumed;
        Ok(val)
    }

    #[inline]
    pub fn read_varint64(&mut self) -> Result<u64> {
        let (val, consumed) = read_varint64(&self.buf[self.pos..])?;
        self.pos += consumed;
        Ok(val)
    }

    /// Read a field tag and split it into `(field_number, wire_type)`
    #[inline]
    pub fn read_tag(&mut self) -> Result<(u32, u8)> {
        let tag = self.read_varint()?;
        Ok((tag >> 3, (tag & 0x7) as u8))
    }

    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_varint64()? != 0)
    }

    /// Read a varint length followed by that many bytes, without copying
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()? as usize;
        self.take(len)
    }

    /// Read a length-delimited UTF-8 string
    ///
    /// Invalid sequences are replaced with U+FFFD rather than failing the decode.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        match String::from_utf8_lossy(bytes) {
            Cow::Borrowed(s) => Ok(s.to_owned()),
            Cow::Owned(s) => {
                tracing::trace!(
                    "Replaced invalid UTF-8 in {}-byte string at offset {}",
                    bytes.len(),
                    self.pos - bytes.len()
                );
                Ok(s)
            }
        }
    }

    /// Advance past one field value without materializing it
    pub fn skip_field(&mut self, wire_type: u8) -> Result<()> {
        match WireType::from_u8(wire_type) {
            Some(WireType::Varint) => {
                self.read_varint64()?;
            }
            Some(WireType::LengthDelimited) => {
                self.read_bytes()?;
            }
            Some(WireType::Fixed64) => {
                self.take(8)?;
            }
            Some(WireType::Fixed32) => {
                self.take(4)?;
            }
            None => return Err(FxListError::UnknownWireType { wire_type }),
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(FxListError::TruncatedInput { needed: len, available });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}
