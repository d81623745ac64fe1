//! Block On-Disk Format and Engine
//!
//! ## Block File Structure (v1)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header region (1024 bytes, big-endian)                      │
//! │ - Version: 1        (4 bytes,  offset 0)                    │
//! │ - Capacity          (8 bytes,  offset 4)                    │
//! │ - Length            (8 bytes,  offset 12)                   │
//! │ - Number            (4 bytes,  offset 20)                   │
//! │ - Reserved          (offsets 24..1023)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Payload region (starts at offset 1024)                      │
//! │ - Packed framed entries in append order:                    │
//! │   [len u32][payload] [len u32][payload] ...                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Index region (written at the write offset on seal)          │
//! │ - One 12-byte record per entry, in ordinal order:           │
//! │   * Start offset (8 bytes, signed)                          │
//! │   * Framed length (4 bytes, signed)                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The file is preallocated to exactly `capacity` bytes at creation. The
//! header's reserved padding lets future versions grow the header without
//! shifting the payload region; it is never interpreted and may contain
//! stale bytes after recovery. `Length` counts payload-region bytes only,
//! so the next write position is always `1024 + length`.
//!
//! ## Why No Checksums or Compression?
//!
//! Entries arrive already framed from the upstream codec, which owns payload
//! integrity; the block's job is placement and retrieval. Keeping the v1
//! record fixed-width (offset + length, nothing else) is what makes the
//! sealed index region and the rebuild scan byte-identical.

mod file;
mod header;
mod index;

pub use file::FileBlock;
pub use header::BlockHeader;
pub use index::IndexEntry;

/// Size of the padded header region. The payload region starts here.
pub const BLOCK_HEADER_CAPACITY: u64 = 1024;

/// Semantic bytes of the v1 header: version + capacity + length + number.
pub const V1_HEADER_SIZE: usize = 4 + 8 + 8 + 4;

/// Size of one index record: start offset + framed length.
pub const INDEX_ENTRY_SIZE: usize = 8 + 4;

/// Current block format version.
pub const BLOCK_VERSION: u32 = 1;
