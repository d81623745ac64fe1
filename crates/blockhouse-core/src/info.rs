//! Block Metadata Record
//!
//! [`BlockInfo`] is the record the controller keeps for each block in its
//! key-value metadata store. The store itself lives outside this workspace;
//! this type is the contract both sides serialize.
//!
//! The `sealed` flag matters to the storage engine: it is the persisted
//! full-flag that selects the recovery path when a block is reopened. A
//! sealed block loads its index region directly from the file tail; an
//! unsealed block rebuilds the index by scanning the payload region.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Controller-side metadata for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Unique block ID within the segment.
    pub id: String,

    /// Path of the backing file.
    pub path: PathBuf,

    /// Whether the block was sealed (index region persisted) before it was
    /// last closed.
    pub sealed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockInfo {
        BlockInfo {
            id: "block-0007".to_string(),
            path: PathBuf::from("/data/segments/seg-3/block-0007.blk"),
            sealed: false,
        }
    }

    #[test]
    fn test_fields() {
        let info = sample();
        assert_eq!(info.id, "block-0007");
        assert!(!info.sealed);
    }

    #[test]
    fn test_clone_eq() {
        let a = sample();
        let b = a.clone();
        assert_eq!(a, b);

        let mut c = sample();
        c.sealed = true;
        assert_ne!(a, c);
    }

    #[test]
    fn test_serde_roundtrip() {
        let info = sample();
        let json = serde_json::to_string(&info).expect("serialize");
        let back: BlockInfo = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(info, back);
    }

    #[test]
    fn test_serde_field_names() {
        let val: serde_json::Value = serde_json::to_value(sample()).expect("to_value");
        assert_eq!(val["id"], "block-0007");
        assert_eq!(val["sealed"], false);
    }
}
