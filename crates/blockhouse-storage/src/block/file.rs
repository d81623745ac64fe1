//! File-Backed Block
//!
//! This module implements [`FileBlock`] - one append-only, fixed-capacity
//! file holding an ordered run of framed entries plus the index that maps
//! ordinals to byte ranges.
//!
//! ## Write Flow
//!
//! ```text
//! append(entries)
//!     ↓
//! acquire append mutex        ← one writer at a time
//!     ↓
//! serialize batch + build provisional index records
//!     ↓
//! capacity check              ← reserves header + future index cost
//!     ↓
//! one positional write at the write offset
//!     ↓
//! publish index records, advance number/write_offset/length
//! ```
//!
//! ## Read Flow
//!
//! Reads take no lock on the append path. The ordinal range is resolved
//! against the in-memory index (short read lock), the byte range is fetched
//! with one positional read, and the buffer is deframed back into entries.
//! Once an index record is published its bytes are stable - the file is
//! append-only and never overwritten - so readers and the writer share the
//! descriptor safely.
//!
//! ## Lifecycle
//!
//! ```text
//!             initialize / create
//!   [fresh] ─────────────────────▶ [active]
//!                                     │ close_write
//!                                     ▼
//!                                  [sealed]   header (+ index when full)
//!                                     │ close_read        persisted
//!                                     ▼
//!                                  [closed]   descriptor released
//! ```
//!
//! Both close paths are quiescent: the gate flag flips first, then the
//! pending-operation counter is drained to zero before anything destructive
//! happens. The descriptor is released only after the last in-flight read
//! has finished.
//!
//! ## Thread Safety
//!
//! `FileBlock` is `Send + Sync` and designed to be shared via `Arc`. All
//! mutation funnels through the append mutex; `number`, `write_offset`, and
//! `length` are published with release stores so readers observing them see
//! completed appends.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use blockhouse_core::{deframe, BlockInfo, Entry};

use super::{
    BlockHeader, IndexEntry, BLOCK_HEADER_CAPACITY, BLOCK_VERSION, INDEX_ENTRY_SIZE,
    V1_HEADER_SIZE,
};
use crate::config::BlockConfig;
use crate::error::{Error, Result};
use crate::observability::OpMark;

/// Sleep between polls of a pending-operation counter during quiescence.
const QUIESCENCE_POLL: Duration = Duration::from_millis(1);

/// One fixed-capacity block file and its in-memory state.
pub struct FileBlock {
    id: String,
    path: PathBuf,
    config: BlockConfig,

    // Immutable after initialize/create
    version: u32,
    capacity: u64,

    // Mutated under the append mutex, read lock-free
    length: AtomicU64,
    number: AtomicU32,
    write_offset: AtomicU64,

    append_mutex: Mutex<()>,
    file: RwLock<Option<Arc<File>>>,
    indexes: RwLock<Vec<IndexEntry>>,

    appendable: AtomicBool,
    readable: AtomicBool,
    full: AtomicBool,

    pending_appends: AtomicU32,
    pending_reads: AtomicU32,
}

impl FileBlock {
    /// Create a fresh block: preallocate the file to exactly
    /// `config.block_capacity` bytes and stamp an initial v1 header. This is
    /// the allocator-side creation step; the returned block is active.
    pub async fn create(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        config: BlockConfig,
    ) -> Result<Self> {
        let id = id.into();
        let path = path.into();
        let capacity = config.block_capacity;

        if capacity <= BLOCK_HEADER_CAPACITY {
            return Err(Error::Format(format!(
                "capacity {capacity} cannot hold the {BLOCK_HEADER_CAPACITY}-byte header region"
            )));
        }

        let file = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || -> io::Result<File> {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create_new(true)
                    .open(&path)?;
                file.set_len(capacity)?;
                Ok(file)
            })
            .await
            .map_err(io::Error::other)??
        };
        let file = Arc::new(file);

        let header = BlockHeader {
            version: BLOCK_VERSION,
            capacity,
            length: 0,
            number: 0,
        };
        write_all_at(file.clone(), header.encode(), 0).await?;

        info!(id = %id, path = %path.display(), capacity, "block created");

        Ok(Self {
            id,
            path,
            config,
            version: BLOCK_VERSION,
            capacity,
            length: AtomicU64::new(0),
            number: AtomicU32::new(0),
            write_offset: AtomicU64::new(BLOCK_HEADER_CAPACITY),
            append_mutex: Mutex::new(()),
            file: RwLock::new(Some(file)),
            indexes: RwLock::new(Vec::new()),
            appendable: AtomicBool::new(true),
            readable: AtomicBool::new(true),
            full: AtomicBool::new(false),
            pending_appends: AtomicU32::new(0),
            pending_reads: AtomicU32::new(0),
        })
    }

    /// Construct a block around an existing file. `info.sealed` is the
    /// persisted full-flag from the controller's metadata store; it selects
    /// the recovery path taken by [`initialize`](Self::initialize), which
    /// must run before any other operation.
    pub async fn open(info: &BlockInfo, config: BlockConfig) -> Result<Self> {
        let path = info.path.clone();
        let file = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || {
                OpenOptions::new().read(true).write(true).open(&path)
            })
            .await
            .map_err(io::Error::other)??
        };

        Ok(Self {
            id: info.id.clone(),
            path,
            config,
            version: 0,
            capacity: 0,
            length: AtomicU64::new(0),
            number: AtomicU32::new(0),
            write_offset: AtomicU64::new(BLOCK_HEADER_CAPACITY),
            append_mutex: Mutex::new(()),
            file: RwLock::new(Some(Arc::new(file))),
            indexes: RwLock::new(Vec::new()),
            appendable: AtomicBool::new(!info.sealed),
            readable: AtomicBool::new(true),
            full: AtomicBool::new(info.sealed),
            pending_appends: AtomicU32::new(0),
            pending_reads: AtomicU32::new(0),
        })
    }

    /// Load the header, load or rebuild the index, and validate. A sealed
    /// block reads its index region straight from the file tail; an
    /// unsealed one rebuilds the index by scanning the payload region. Both
    /// paths yield identical in-memory state for the same writes.
    pub async fn initialize(&mut self, cancel: &CancellationToken) -> Result<()> {
        let _mark = OpMark::enter("initialize", &self.id);

        self.load_header(cancel).await?;
        self.load_index(cancel).await?;
        self.validate().await?;

        info!(
            id = %self.id,
            entries = self.number.load(Ordering::Acquire),
            length = self.length.load(Ordering::Acquire),
            sealed = self.is_full(),
            "block initialized"
        );
        Ok(())
    }

    /// Append a batch of framed entries.
    ///
    /// Entries occupy contiguous ordinals in input order. On
    /// `NoEnoughCapacity` nothing is written and the block state is
    /// unchanged; the allocator reacts by sealing and rolling to a new
    /// block.
    pub async fn append(&self, cancel: &CancellationToken, entries: &[Entry]) -> Result<()> {
        let _mark = OpMark::enter("append", &self.id);

        let _guard = self.append_mutex.lock().await;
        self.pending_appends.fetch_add(1, Ordering::AcqRel);
        let result = self.append_locked(cancel, entries).await;
        self.pending_appends.fetch_sub(1, Ordering::AcqRel);
        result
    }

    async fn append_locked(&self, cancel: &CancellationToken, entries: &[Entry]) -> Result<()> {
        // Re-check under the mutex: an appender parked here while
        // close_write drained must not slip a write in afterwards.
        if !self.appendable.load(Ordering::Acquire) || self.is_full() {
            return Err(Error::Sealed(self.id.clone()));
        }
        if entries.is_empty() {
            return Ok(());
        }

        let write_offset = self.write_offset.load(Ordering::Acquire);
        let total: usize = entries.iter().map(Entry::framed_len).sum();

        let mut buf = Vec::with_capacity(total);
        let mut records = Vec::with_capacity(entries.len());
        let mut batch_len = 0u64;
        for entry in entries {
            records.push(IndexEntry {
                start_offset: (write_offset + batch_len) as i64,
                length: entry.framed_len() as i32,
            });
            entry.encode(&mut buf);
            batch_len += entry.framed_len() as u64;
        }

        // Reserve the index records these entries will need when the block
        // is sealed, so the index region can never overwrite payload bytes.
        let reserved = batch_len + entries.len() as u64 * INDEX_ENTRY_SIZE as u64;
        let remaining = self.remaining(reserved);
        if batch_len as i64 > remaining {
            debug!(
                id = %self.id,
                requested = batch_len,
                remaining,
                "append rejected: no enough capacity"
            );
            return Err(Error::NoEnoughCapacity {
                requested: batch_len,
                remaining,
            });
        }

        check_cancelled(cancel)?;
        let file = self.file_handle().await?;
        write_all_at(file.clone(), buf, write_offset).await?;
        if self.config.sync_on_append {
            sync_file(file).await?;
        }

        {
            let mut indexes = self.indexes.write().await;
            indexes.extend(records);
        }
        self.number
            .fetch_add(entries.len() as u32, Ordering::AcqRel);
        self.write_offset.fetch_add(batch_len, Ordering::AcqRel);
        self.length.fetch_add(batch_len, Ordering::AcqRel);
        Ok(())
    }

    /// Read up to `count` entries starting at `start_ordinal`.
    ///
    /// A range running past the tail is clamped to the available entries.
    /// Fails with `OffsetExceeded` when `start_ordinal` is at or beyond the
    /// entry count.
    pub async fn read(
        &self,
        cancel: &CancellationToken,
        start_ordinal: u32,
        count: u32,
    ) -> Result<Vec<Entry>> {
        let _mark = OpMark::enter("read", &self.id);

        self.pending_reads.fetch_add(1, Ordering::AcqRel);
        let result = self.read_inner(cancel, start_ordinal, count).await;
        self.pending_reads.fetch_sub(1, Ordering::AcqRel);
        result
    }

    async fn read_inner(
        &self,
        cancel: &CancellationToken,
        start_ordinal: u32,
        count: u32,
    ) -> Result<Vec<Entry>> {
        let (from, to) = self.resolve_range(start_ordinal, count).await?;
        if from == to {
            return Ok(Vec::new());
        }

        check_cancelled(cancel)?;
        let file = self.file_handle().await?;
        let raw = read_exact_at(file, (to - from) as usize, from).await?;
        Ok(deframe(Bytes::from(raw))?)
    }

    /// Translate (startOrdinal, count) into a byte range of the payload
    /// region, clamping the end to the last published entry.
    async fn resolve_range(&self, start_ordinal: u32, count: u32) -> Result<(u64, u64)> {
        let indexes = self.indexes.read().await;
        let number = indexes.len() as u32;
        if start_ordinal >= number {
            return Err(Error::OffsetExceeded {
                ordinal: start_ordinal,
                number,
            });
        }
        if count == 0 {
            return Ok((0, 0));
        }

        let end_ordinal = start_ordinal.saturating_add(count - 1).min(number - 1);
        let from = indexes[start_ordinal as usize].start_offset as u64;
        let to = indexes[end_ordinal as usize].end_offset() as u64;
        Ok((from, to))
    }

    /// Bytes still usable after reserving `size_needed` plus the header
    /// region and the index records already owed. Negative when the reserve
    /// does not fit.
    pub fn remaining(&self, size_needed: u64) -> i64 {
        self.capacity as i64
            - self.length.load(Ordering::Acquire) as i64
            - self.number.load(Ordering::Acquire) as i64 * INDEX_ENTRY_SIZE as i64
            - size_needed as i64
            - BLOCK_HEADER_CAPACITY as i64
    }

    /// Mark the block full. Called by the allocator when capacity runs out
    /// (typically after an append failed with `NoEnoughCapacity`); the next
    /// `close_write` then persists the index region.
    pub fn mark_full(&self) {
        self.full.store(true, Ordering::Release);
    }

    /// Stop accepting appends, wait for in-flight appends to drain, and
    /// persist the header (plus the index region when the block is full).
    /// After this returns no append can succeed.
    pub async fn close_write(&self, cancel: &CancellationToken) -> Result<()> {
        let _mark = OpMark::enter("close_write", &self.id);

        self.appendable.store(false, Ordering::Release);
        while self.pending_appends.load(Ordering::Acquire) != 0 {
            tokio::time::sleep(QUIESCENCE_POLL).await;
        }

        self.persist_header(cancel).await?;
        self.persist_index(cancel).await?;
        if self.config.sync_on_seal {
            sync_file(self.file_handle().await?).await?;
        }

        info!(
            id = %self.id,
            entries = self.number.load(Ordering::Acquire),
            sealed = self.is_full(),
            "block writes closed"
        );
        Ok(())
    }

    /// Stop serving reads, wait for in-flight reads to drain, then release
    /// the descriptor.
    pub async fn close_read(&self, cancel: &CancellationToken) -> Result<()> {
        let _mark = OpMark::enter("close_read", &self.id);

        self.readable.store(false, Ordering::Release);
        while self.pending_reads.load(Ordering::Acquire) != 0 {
            tokio::time::sleep(QUIESCENCE_POLL).await;
        }

        check_cancelled(cancel)?;
        self.file.write().await.take();
        info!(id = %self.id, "block reads closed");
        Ok(())
    }

    /// Unconditional descriptor release, for forced teardown. Skips
    /// quiescence; in-flight operations fail with `Closed`.
    pub async fn close(&self, _cancel: &CancellationToken) -> Result<()> {
        let _mark = OpMark::enter("close", &self.id);
        self.file.write().await.take();
        Ok(())
    }

    pub fn is_appendable(&self) -> bool {
        self.appendable.load(Ordering::Acquire) && !self.is_full()
    }

    pub fn is_readable(&self) -> bool {
        self.readable.load(Ordering::Acquire) && !self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.length.load(Ordering::Acquire) == 0
    }

    pub fn is_full(&self) -> bool {
        self.full.load(Ordering::Acquire)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Count of entries stored.
    pub fn entry_count(&self) -> u32 {
        self.number.load(Ordering::Acquire)
    }

    /// Payload-region bytes occupied (header and index excluded).
    pub fn payload_length(&self) -> u64 {
        self.length.load(Ordering::Acquire)
    }

    /// Next write position in the file.
    pub fn write_offset(&self) -> u64 {
        self.write_offset.load(Ordering::Acquire)
    }

    /// The metadata record the controller stores for this block.
    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            id: self.id.clone(),
            path: self.path.clone(),
            sealed: self.is_full(),
        }
    }

    // -------------------------------------------------------------------
    // Persistence and recovery
    // -------------------------------------------------------------------

    /// Write the current header fields at file offset 0. Holds the append
    /// mutex so `length` and `number` cannot advance under the snapshot.
    async fn persist_header(&self, cancel: &CancellationToken) -> Result<()> {
        let _guard = self.append_mutex.lock().await;
        check_cancelled(cancel)?;

        let header = BlockHeader {
            version: self.version,
            capacity: self.capacity,
            length: self.length.load(Ordering::Acquire),
            number: self.number.load(Ordering::Acquire),
        };
        let file = self.file_handle().await?;
        write_all_at(file, header.encode(), 0).await?;
        Ok(())
    }

    /// Write the index region at the write offset. Only full blocks persist
    /// an index; partial blocks rebuild it on reopen.
    async fn persist_index(&self, cancel: &CancellationToken) -> Result<()> {
        if !self.is_full() {
            return Ok(());
        }
        check_cancelled(cancel)?;

        let buf = {
            let indexes = self.indexes.read().await;
            let mut buf = BytesMut::with_capacity(indexes.len() * INDEX_ENTRY_SIZE);
            for record in indexes.iter() {
                record.encode(&mut buf);
            }
            buf.to_vec()
        };
        let file = self.file_handle().await?;
        write_all_at(file, buf, self.write_offset.load(Ordering::Acquire)).await?;
        Ok(())
    }

    async fn load_header(&mut self, cancel: &CancellationToken) -> Result<()> {
        check_cancelled(cancel)?;
        let file = self.file_handle().await?;
        let raw = read_exact_at(file, V1_HEADER_SIZE, 0).await?;
        let header = BlockHeader::decode(&raw)?;

        self.version = header.version;
        self.capacity = header.capacity;
        self.length.store(header.length, Ordering::Release);
        self.number.store(header.number, Ordering::Release);
        self.write_offset
            .store(BLOCK_HEADER_CAPACITY + header.length, Ordering::Release);
        Ok(())
    }

    async fn load_index(&mut self, cancel: &CancellationToken) -> Result<()> {
        check_cancelled(cancel)?;
        let number = self.number.load(Ordering::Acquire) as usize;
        let mut indexes = Vec::with_capacity(number);

        if number > 0 {
            let file = self.file_handle().await?;
            if self.is_full() {
                // Sealed: the index region sits at the write offset.
                let raw = read_exact_at(
                    file,
                    number * INDEX_ENTRY_SIZE,
                    self.write_offset.load(Ordering::Acquire),
                )
                .await?;
                let mut buf = Bytes::from(raw);
                for _ in 0..number {
                    indexes.push(IndexEntry::decode(&mut buf));
                }
            } else {
                // Partial: rebuild by scanning length prefixes across the
                // payload region. Must yield exactly what persist_index
                // would have written.
                let length = self.length.load(Ordering::Acquire) as usize;
                let raw = read_exact_at(file, length, BLOCK_HEADER_CAPACITY).await?;
                let mut offset = BLOCK_HEADER_CAPACITY;
                let mut pos = 0usize;
                for ordinal in 0..number {
                    if pos + 4 > raw.len() {
                        return Err(Error::Format(format!(
                            "index rebuild: entry {ordinal} length prefix runs past the payload region"
                        )));
                    }
                    let payload_len =
                        u32::from_be_bytes([raw[pos], raw[pos + 1], raw[pos + 2], raw[pos + 3]])
                            as usize;
                    let framed = 4 + payload_len;
                    if pos + framed > raw.len() {
                        return Err(Error::Format(format!(
                            "index rebuild: entry {ordinal} ({framed} bytes) runs past the payload region"
                        )));
                    }
                    indexes.push(IndexEntry {
                        start_offset: offset as i64,
                        length: framed as i32,
                    });
                    offset += framed as u64;
                    pos += framed;
                }
            }
        }

        *self.indexes.get_mut() = indexes;
        Ok(())
    }

    /// Check the loaded state against the block invariants.
    async fn validate(&self) -> Result<()> {
        if self.version != BLOCK_VERSION {
            return Err(Error::Format(format!(
                "unsupported block version {}",
                self.version
            )));
        }

        let file = self.file_handle().await?;
        let file_len = file.metadata()?.len();
        if file_len != self.capacity {
            return Err(Error::Format(format!(
                "file size {file_len} does not match declared capacity {}",
                self.capacity
            )));
        }

        let number = self.number.load(Ordering::Acquire) as u64;
        let length = self.length.load(Ordering::Acquire);
        if BLOCK_HEADER_CAPACITY + length + number * INDEX_ENTRY_SIZE as u64 > self.capacity {
            return Err(Error::Format(format!(
                "payload ({length} bytes) and index ({number} entries) overflow capacity {}",
                self.capacity
            )));
        }

        let indexes = self.indexes.read().await;
        if indexes.len() as u64 != number {
            return Err(Error::Format(format!(
                "index holds {} records, header says {number}",
                indexes.len()
            )));
        }
        let mut expected = BLOCK_HEADER_CAPACITY as i64;
        let mut sum = 0u64;
        for (ordinal, record) in indexes.iter().enumerate() {
            if record.length <= 0 {
                return Err(Error::Format(format!(
                    "index record {ordinal} has non-positive length {}",
                    record.length
                )));
            }
            if record.start_offset != expected {
                return Err(Error::Format(format!(
                    "index record {ordinal} starts at {}, expected {expected}",
                    record.start_offset
                )));
            }
            expected = record.end_offset();
            sum += record.length as u64;
        }
        if sum != length {
            return Err(Error::Format(format!(
                "index covers {sum} payload bytes, header says {length}"
            )));
        }
        Ok(())
    }

    async fn file_handle(&self) -> Result<Arc<File>> {
        self.file
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Closed(self.id.clone()))
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

// Positional I/O helpers. The descriptor is shared across appenders and
// readers, so all file access goes through offset-addressed calls; nothing
// here touches the file cursor.

async fn write_all_at(file: Arc<File>, buf: Vec<u8>, offset: u64) -> io::Result<()> {
    tokio::task::spawn_blocking(move || file.write_all_at(&buf, offset))
        .await
        .map_err(io::Error::other)?
}

async fn read_exact_at(file: Arc<File>, len: usize, offset: u64) -> io::Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || {
        let mut buf = vec![0u8; len];
        file.read_exact_at(&mut buf, offset)?;
        Ok(buf)
    })
    .await
    .map_err(io::Error::other)?
}

async fn sync_file(file: Arc<File>) -> io::Result<()> {
    tokio::task::spawn_blocking(move || file.sync_all())
        .await
        .map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(capacity: u64) -> BlockConfig {
        BlockConfig {
            block_capacity: capacity,
            sync_on_seal: false,
            sync_on_append: false,
        }
    }

    async fn create_block(dir: &TempDir, id: &str, capacity: u64) -> FileBlock {
        FileBlock::create(id, dir.path().join(format!("{id}.blk")), test_config(capacity))
            .await
            .unwrap()
    }

    fn entry_of(len: usize, byte: u8) -> Entry {
        Entry::new(vec![byte; len])
    }

    // ---------------------------------------------------------------
    // Capacity accountant
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_remaining_formula() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "cap", 1200).await;
        let cancel = CancellationToken::new();

        // Fresh block: capacity - header.
        assert_eq!(block.remaining(0), 1200 - 1024);

        // Two framed entries of 30 bytes each (payload 26).
        block
            .append(&cancel, &[entry_of(26, b'a'), entry_of(26, b'b')])
            .await
            .unwrap();

        // capacity - length - number * 12 - header
        assert_eq!(block.remaining(0), 1200 - 60 - 24 - 1024);
    }

    #[tokio::test]
    async fn test_append_exact_fit_succeeds() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "fit", 1200).await;
        let cancel = CancellationToken::new();

        block
            .append(&cancel, &[entry_of(26, b'a'), entry_of(26, b'b')])
            .await
            .unwrap();

        // remaining(40 + 12) == 40: a 40-byte framed entry fits exactly.
        block.append(&cancel, &[entry_of(36, b'c')]).await.unwrap();
        assert_eq!(block.entry_count(), 3);
        assert_eq!(block.payload_length(), 100);
    }

    #[tokio::test]
    async fn test_append_rejected_when_index_reserve_overflows() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "reject", 1200).await;
        let cancel = CancellationToken::new();

        block
            .append(&cancel, &[entry_of(26, b'a'), entry_of(26, b'b')])
            .await
            .unwrap();

        // One more byte than the exact fit: rejected, state untouched.
        let err = block
            .append(&cancel, &[entry_of(37, b'c')])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoEnoughCapacity { requested: 41, .. }));

        assert_eq!(block.entry_count(), 2);
        assert_eq!(block.payload_length(), 60);
        assert_eq!(block.write_offset(), 1084);
        assert_eq!(block.remaining(0), 1200 - 60 - 24 - 1024);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "empty", 4096).await;
        let cancel = CancellationToken::new();

        let before = block.remaining(0);
        block.append(&cancel, &[]).await.unwrap();
        assert_eq!(block.remaining(0), before);
        assert_eq!(block.entry_count(), 0);
        assert!(block.is_empty());
    }

    // ---------------------------------------------------------------
    // Lifecycle gates
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_append_after_close_write_fails() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "sealed", 4096).await;
        let cancel = CancellationToken::new();

        block.append(&cancel, &[entry_of(3, b'x')]).await.unwrap();
        block.close_write(&cancel).await.unwrap();

        let err = block
            .append(&cancel, &[entry_of(3, b'y')])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sealed(_)));
        assert!(!block.is_appendable());
        assert_eq!(block.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_read_after_close_read_fails() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "closed", 4096).await;
        let cancel = CancellationToken::new();

        block.append(&cancel, &[entry_of(3, b'x')]).await.unwrap();
        block.close_read(&cancel).await.unwrap();

        assert!(!block.is_readable());
        let err = block.read(&cancel, 0, 1).await.unwrap_err();
        assert!(matches!(err, Error::Closed(_)));
    }

    #[tokio::test]
    async fn test_mark_full_flips_appendable() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "full", 4096).await;

        assert!(block.is_appendable());
        assert!(!block.is_full());
        block.mark_full();
        assert!(block.is_full());
        assert!(!block.is_appendable());
    }

    #[tokio::test]
    async fn test_predicates_on_fresh_block() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "fresh", 4096).await;

        assert!(block.is_empty());
        assert!(block.is_appendable());
        // No payload yet: nothing to read.
        assert!(!block.is_readable());
        assert_eq!(block.id(), "fresh");
        assert_eq!(block.capacity(), 4096);
        assert_eq!(block.write_offset(), 1024);
    }

    // ---------------------------------------------------------------
    // Cancellation
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_cancelled_append_leaves_state_unchanged() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "cancel", 4096).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = block
            .append(&cancel, &[entry_of(3, b'x')])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(block.entry_count(), 0);
        assert_eq!(block.write_offset(), 1024);
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let dir = TempDir::new().unwrap();
        let block = create_block(&dir, "cancel-read", 4096).await;
        let live = CancellationToken::new();
        block.append(&live, &[entry_of(3, b'x')]).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = block.read(&cancel, 0, 1).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    // ---------------------------------------------------------------
    // Initialize validation
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn test_initialize_rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad-version.blk");

        let mut raw = vec![0u8; 2048];
        let header = BlockHeader {
            version: 9,
            capacity: 2048,
            length: 0,
            number: 0,
        };
        raw[..V1_HEADER_SIZE].copy_from_slice(&header.encode());
        std::fs::write(&path, &raw).unwrap();

        let info = BlockInfo {
            id: "bad-version".to_string(),
            path,
            sealed: false,
        };
        let mut block = FileBlock::open(&info, test_config(2048)).await.unwrap();
        let err = block.initialize(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[tokio::test]
    async fn test_initialize_rejects_capacity_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short-file.blk");

        // Header declares 4096 bytes but the file holds 2048.
        let mut raw = vec![0u8; 2048];
        let header = BlockHeader {
            version: 1,
            capacity: 4096,
            length: 0,
            number: 0,
        };
        raw[..V1_HEADER_SIZE].copy_from_slice(&header.encode());
        std::fs::write(&path, &raw).unwrap();

        let info = BlockInfo {
            id: "short-file".to_string(),
            path,
            sealed: false,
        };
        let mut block = FileBlock::open(&info, test_config(4096)).await.unwrap();
        let err = block.initialize(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[tokio::test]
    async fn test_rebuild_rejects_prefix_past_region_end() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("truncated.blk");

        // Header claims one entry in a 2-byte payload region: the 4-byte
        // length prefix itself cannot fit.
        let mut raw = vec![0u8; 2048];
        let header = BlockHeader {
            version: 1,
            capacity: 2048,
            length: 2,
            number: 1,
        };
        raw[..V1_HEADER_SIZE].copy_from_slice(&header.encode());
        std::fs::write(&path, &raw).unwrap();

        let info = BlockInfo {
            id: "truncated".to_string(),
            path,
            sealed: false,
        };
        let mut block = FileBlock::open(&info, test_config(2048)).await.unwrap();
        let err = block.initialize(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_capacity_below_header() {
        let dir = TempDir::new().unwrap();
        let result = FileBlock::create(
            "tiny",
            dir.path().join("tiny.blk"),
            test_config(512),
        )
        .await;
        assert!(matches!(result, Err(Error::Format(_))));
    }
}
