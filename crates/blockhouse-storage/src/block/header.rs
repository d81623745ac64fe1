//! Block Header Codec
//!
//! Encodes and decodes the four v1 header fields at their fixed offsets.
//! The fields occupy the first 24 bytes of the 1024-byte header region;
//! `persist` and `load` on the block always touch exactly these bytes and
//! never assume anything about the reserved remainder.

use bytes::{Buf, BufMut};

use super::V1_HEADER_SIZE;
use crate::error::{Error, Result};

/// The v1 header fields, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Format version (current: 1).
    pub version: u32,
    /// Total file size in bytes, immutable after creation.
    pub capacity: u64,
    /// Payload bytes occupied in the payload region.
    pub length: u64,
    /// Count of entries stored.
    pub number: u32,
}

impl BlockHeader {
    /// Serialize into the 24-byte on-disk form.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(V1_HEADER_SIZE);
        buf.put_u32(self.version);
        buf.put_u64(self.capacity);
        buf.put_u64(self.length);
        buf.put_u32(self.number);
        buf
    }

    /// Decode from the first 24 bytes of the header region.
    pub fn decode(mut raw: &[u8]) -> Result<Self> {
        if raw.len() < V1_HEADER_SIZE {
            return Err(Error::Format(format!(
                "header too short: {} bytes, need {}",
                raw.len(),
                V1_HEADER_SIZE
            )));
        }
        Ok(Self {
            version: raw.get_u32(),
            capacity: raw.get_u64(),
            length: raw.get_u64(),
            number: raw.get_u32(),
        })
    }
}
