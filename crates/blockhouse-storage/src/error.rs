//! Storage Error Types
//!
//! This module defines all error types that can occur during block operations.
//!
//! ## Error Categories
//!
//! ### Recoverable (caller decides)
//! - `NoEnoughCapacity`: the batch does not fit under the capacity formula;
//!   the caller can retry with a smaller batch or seal and roll to a new block
//! - `OffsetExceeded`: a read started at or beyond the current entry count
//!
//! ### Fatal for the block
//! - `Format`: the header could not be decoded, or index recovery found a
//!   length prefix running past the region end; the allocator should
//!   quarantine the block
//!
//! ### Lifecycle
//! - `Sealed`: an append arrived after writes were closed
//! - `Closed`: an operation arrived after the descriptor was released
//! - `Cancelled`: the operation's cancellation token fired before an I/O
//!
//! ### I/O
//! - `Io`: surfaced directly; the block performs no internal retry, and
//!   position counters only advance after a successful write, so a failed
//!   append leaves the in-memory state consistent
//!
//! All operations return `Result<T>`, aliased to `Result<T, Error>`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no enough capacity: requested {requested} bytes, remaining {remaining}")]
    NoEnoughCapacity { requested: u64, remaining: i64 },

    #[error("offset exceeded: ordinal {ordinal} >= entry count {number}")]
    OffsetExceeded { ordinal: u32, number: u32 },

    #[error("malformed block: {0}")]
    Format(String),

    #[error("block {0} is sealed for writes")]
    Sealed(String),

    #[error("block {0} is closed")]
    Closed(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("entry codec error: {0}")]
    Entry(#[from] blockhouse_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
