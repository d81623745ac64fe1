//! Block Configuration
//!
//! Allocator-facing knobs for creating and running blocks.
//!
//! - **block_capacity**: total file size in bytes, fixed at creation
//!   (default: 64MB)
//! - **sync_on_seal**: fsync the file after the header and index region are
//!   persisted by `close_write` (default: true)
//! - **sync_on_append**: fsync after every append (default: false; durability
//!   policy belongs to the allocator, and per-append fsync costs most of the
//!   write throughput)
//!
//! ## Usage
//!
//! ```ignore
//! use blockhouse_storage::BlockConfig;
//!
//! // Production config
//! let config = BlockConfig::default();
//!
//! // Small blocks for faster testing
//! let config = BlockConfig {
//!     block_capacity: 64 * 1024,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockConfig {
    /// Total block file size in bytes (default: 64MB)
    #[serde(default = "default_block_capacity")]
    pub block_capacity: u64,

    /// Fsync after persisting the header and index region on seal (default: true)
    #[serde(default = "default_sync_on_seal")]
    pub sync_on_seal: bool,

    /// Fsync after every append (default: false)
    #[serde(default)]
    pub sync_on_append: bool,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            block_capacity: default_block_capacity(),
            sync_on_seal: default_sync_on_seal(),
            sync_on_append: false,
        }
    }
}

fn default_block_capacity() -> u64 {
    64 * 1024 * 1024 // 64MB
}

fn default_sync_on_seal() -> bool {
    true
}
