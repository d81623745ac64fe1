//! Framed Entry
//!
//! This module defines [`Entry`] - the unit of data a block stores.
//!
//! ## What is an Entry?
//!
//! An entry is one opaque binary payload produced by the domain-event codec
//! upstream. The block never interprets payload bytes; it stores the
//! *framed* form and hands it back verbatim:
//!
//! ```text
//! ┌──────────────────┬──────────────────┐
//! │ Length (4 bytes) │ Payload (N bytes)│
//! │ big-endian u32   │ opaque           │
//! └──────────────────┴──────────────────┘
//! ```
//!
//! The framed form is what the capacity accountant charges for and what the
//! per-entry index records measure, so `framed_len()` (4 + payload) is the
//! size that matters everywhere in the storage engine.
//!
//! ## Design Decisions
//! - Uses `bytes::Bytes` for zero-copy slicing when deframing a read buffer
//! - `deframe` stops cleanly at exact buffer exhaustion; a partial tail is
//!   an error, since block reads always resolve to exact entry boundaries
//!
//! ## Example
//! ```
//! use blockhouse_core::Entry;
//! use bytes::BytesMut;
//!
//! let entry = Entry::new("abc");
//! assert_eq!(entry.framed_len(), 7);
//!
//! let mut buf = BytesMut::new();
//! entry.encode(&mut buf);
//! assert_eq!(&buf[..], &[0x00, 0x00, 0x00, 0x03, b'a', b'b', b'c']);
//! ```

use bytes::{Buf, BufMut, Bytes};

use crate::error::{Error, Result};

/// Size of the big-endian length prefix on every framed entry.
pub const LEN_PREFIX_SIZE: usize = 4;

/// A single opaque entry, stored framed (length prefix + payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    payload: Bytes,
}

impl Entry {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The opaque payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Size of the framed form: length prefix plus payload.
    pub fn framed_len(&self) -> usize {
        LEN_PREFIX_SIZE + self.payload.len()
    }

    /// Append the framed form to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.payload.len() as u32);
        buf.put_slice(&self.payload);
    }

    /// Consume one framed entry from the front of `buf`.
    pub fn decode(buf: &mut Bytes) -> Result<Self> {
        if buf.remaining() < LEN_PREFIX_SIZE {
            return Err(Error::Truncated {
                need: LEN_PREFIX_SIZE,
                have: buf.remaining(),
            });
        }
        let len = buf.get_u32() as usize;
        if buf.remaining() < len {
            return Err(Error::Truncated {
                need: len,
                have: buf.remaining(),
            });
        }
        Ok(Self {
            payload: buf.copy_to_bytes(len),
        })
    }
}

/// Split a buffer of packed framed entries into entries.
///
/// Stops cleanly when the buffer is exactly exhausted. A buffer that ends
/// mid-prefix or mid-payload is an error: block reads resolve byte ranges
/// from the index, so a partial tail means corruption upstream.
pub fn deframe(mut data: Bytes) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    while data.has_remaining() {
        entries.push(Entry::decode(&mut data)?);
    }
    Ok(entries)
}
