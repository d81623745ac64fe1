//! Index Record Codec
//!
//! One fixed-width record per stored entry, mapping ordinal to byte range:
//! `i64 startOffset` then `i32 length`, big-endian, 12 bytes. The length is
//! the framed size (length prefix + payload), so
//! `startOffset + length == next startOffset` across the packed payload
//! region.

use bytes::{Buf, BufMut};

/// Byte range of one entry within the block file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// File offset of the entry's framed form.
    pub start_offset: i64,
    /// Framed size in bytes.
    pub length: i32,
}

impl IndexEntry {
    /// Append the 12-byte on-disk form to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.start_offset);
        buf.put_i32(self.length);
    }

    /// Consume one record from `buf`. Callers size the buffer to a whole
    /// number of records before decoding.
    pub fn decode(buf: &mut impl Buf) -> Self {
        Self {
            start_offset: buf.get_i64(),
            length: buf.get_i32(),
        }
    }

    /// File offset one past the entry's last byte.
    pub fn end_offset(&self) -> i64 {
        self.start_offset + self.length as i64
    }
}
