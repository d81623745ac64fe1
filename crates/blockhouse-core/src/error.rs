//! Error Types for Blockhouse Core
//!
//! Codec errors raised while framing or deframing entries. All functions in
//! this crate return `Result<T>`, aliased to `Result<T, Error>`, so callers
//! can propagate with `?`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A buffer ended in the middle of a framed entry: either the 4-byte
    /// length prefix or the payload it announces is cut short.
    #[error("truncated entry: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
}
