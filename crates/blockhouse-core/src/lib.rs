//! Blockhouse Core
//!
//! Shared data model for blockhouse - the segment block storage engine.
//!
//! ## What Lives Here?
//!
//! - [`Entry`]: the framed binary entry, the unit a block stores on disk
//! - [`BlockInfo`]: the metadata record the controller keeps per block
//! - [`Error`]: codec errors shared by producers and the storage engine
//!
//! The storage engine itself (append/read paths, index, lifecycle) lives in
//! the `blockhouse-storage` crate. Higher layers - the segment allocator,
//! the controller and its metadata store - depend on this crate for the
//! types they exchange with blocks.

pub mod entry;
pub mod error;
pub mod info;

pub use entry::{deframe, Entry};
pub use error::{Error, Result};
pub use info::BlockInfo;
