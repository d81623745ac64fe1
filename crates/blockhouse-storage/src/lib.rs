//! Blockhouse Storage Layer
//!
//! This crate implements the segment block storage engine - the component
//! that owns one append-only, fixed-capacity file per block and serves
//! concurrent appenders and readers against it.
//!
//! ## Where Blocks Sit
//!
//! ```text
//! ┌─────────────┐
//! │  Producers  │
//! └──────┬──────┘
//!        │ framed entries
//!        ▼
//! ┌──────────────────┐
//! │ Segment          │  decides when to create,
//! │ allocator        │  seal, and retire blocks
//! └────────┬─────────┘
//!          │ append / read / seal
//!          ▼
//! ┌──────────────────┐
//! │ FileBlock        │ ◄── You are here
//! │ - append path    │
//! │ - ordinal index  │
//! │ - lifecycle      │
//! └────────┬─────────┘
//!          │ positional I/O
//!          ▼
//! ┌──────────────────┐
//! │ one file per     │
//! │ block on disk    │
//! └──────────────────┘
//! ```
//!
//! Many blocks compose a segment; many segments compose a topic. The
//! allocator, the controller, and its metadata store live outside this
//! crate and talk to blocks through [`FileBlock`] and
//! [`blockhouse_core::BlockInfo`].
//!
//! ## Main Components
//!
//! ### FileBlock
//! The engine: durably writes batches of framed entries, maintains the
//! in-memory ordinal index, enforces capacity, and runs the lifecycle state
//! machine (active → sealed → closed) with quiescence on close.
//!
//! ### Block on-disk format
//! See the [`block`] module docs for the v1 layout: a 1024-byte header
//! region, a packed payload region, and an index region appended at seal
//! time.
//!
//! ## Design Decisions
//!
//! ### Why positional I/O?
//! Appenders and readers share one descriptor. Positional reads and writes
//! carry no cursor state, so readers never contend with the writer and no
//! seek races exist.
//!
//! ### Why one write per batch?
//! The append path serializes the whole batch into one buffer and issues a
//! single write at the write offset. Failed writes leave counters untouched,
//! so the in-memory state stays consistent without rollback.
//!
//! ### Why is the index only persisted at seal time?
//! Index records are recomputable from the payload region alone. Until the
//! block is full there is always a cheaper recovery path (the rebuild scan),
//! and not writing the index on every append keeps appends one I/O.

pub mod block;
pub mod config;
pub mod error;
pub mod observability;

pub use block::{BlockHeader, FileBlock, IndexEntry};
pub use config::BlockConfig;
pub use error::{Error, Result};
