//! Errors produced while building value types from untrusted input.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid ratio {input:?}: {reason}")]
    InvalidRatio { input: String, reason: &'static str },

    #[error("option label is {len} bytes, at most 32 allowed")]
    LabelTooLong { len: usize },

    #[error("unknown executable kind {0}")]
    UnknownExecutableKind(u8),
}
