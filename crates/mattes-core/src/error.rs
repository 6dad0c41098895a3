//! Errors raised by sample sources.

use thiserror::Error;

/// Error produced while building or reading sample points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    /// The requested offset lies outside the sample domain.
    #[error("Sample offset {offset} out of range for domain of {len} samples")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// Input arrays disagree on their sizes.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The collaborator could not produce a sample.
    #[error("Sample source error: {0}")]
    Source(String),
}

impl SampleError {
    /// Create a source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }
}
