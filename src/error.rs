//! Error types for cachetile operations.
//!
//! Kernels themselves have no error path: a shape that violates a kernel's
//! precondition is a caller bug, checked with `debug_assert!` only. The
//! errors here belong to the outer surface — building grid views over
//! caller-owned buffers and looking kernels up by label.

use std::fmt;

/// Errors that can occur while constructing views or resolving kernels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachetileError {
    /// A buffer does not match the dimensions claimed for it.
    ShapeError {
        /// Number of rows requested for the view.
        rows: usize,
        /// Number of columns requested for the view.
        cols: usize,
        /// Actual length of the backing buffer.
        len: usize,
        /// Human-readable error message.
        message: String,
    },
    /// No registered kernel carries the given label.
    UnknownLabel {
        /// The label that failed to resolve.
        label: String,
    },
}

impl fmt::Display for CachetileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachetileError::ShapeError {
                rows,
                cols,
                len,
                message,
            } => write!(
                f,
                "Shape mismatch: {} ({}x{} view over {} elements)",
                message, rows, cols, len
            ),
            CachetileError::UnknownLabel { label } => {
                write!(f, "No transpose kernel registered under {:?}", label)
            }
        }
    }
}

impl std::error::Error for CachetileError {}

/// Result type alias for cachetile operations.
pub type Result<T> = std::result::Result<T, CachetileError>;

/// Creates a shape error.
pub fn shape_error(
    rows: usize,
    cols: usize,
    len: usize,
    message: impl Into<String>,
) -> CachetileError {
    CachetileError::ShapeError {
        rows,
        cols,
        len,
        message: message.into(),
    }
}

/// Creates an unknown-label error.
pub fn unknown_label(label: impl Into<String>) -> CachetileError {
    CachetileError::UnknownLabel {
        label: label.into(),
    }
}
