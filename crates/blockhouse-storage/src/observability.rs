//! Operation Marks
//!
//! Every block operation brackets its body with an enter/leave mark pair so
//! request spans can be traced across the storage layer. The marks are a
//! pure side channel: they emit `tracing` events and never affect operation
//! semantics.

use std::time::Instant;

/// Guard emitting an enter event on construction and a leave event (with
/// elapsed time) on drop.
pub struct OpMark {
    op: &'static str,
    block: String,
    start: Instant,
}

impl OpMark {
    pub fn enter(op: &'static str, block: &str) -> Self {
        tracing::trace!(op, block, "op enter");
        Self {
            op,
            block: block.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for OpMark {
    fn drop(&mut self) {
        tracing::trace!(
            op = self.op,
            block = %self.block,
            elapsed_us = self.start.elapsed().as_micros() as u64,
            "op leave"
        );
    }
}
