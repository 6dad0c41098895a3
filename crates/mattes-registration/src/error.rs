//! Error types for metric operations.
//!
//! This module provides structured error types for metric initialization
//! and evaluation, enabling better error handling and debugging.

use mattes_core::SampleError;
use thiserror::Error;

/// Main error type for metric operations.
#[derive(Error, Debug)]
pub enum MetricError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The transform behind the samples cannot be handled by the metric.
    #[error("Unsupported transform: {0}")]
    UnsupportedTransform(String),

    /// Evaluation requested before `initialize`.
    #[error("Metric has not been initialized")]
    NotInitialized,

    /// A sample failed validation inside a worker.
    #[error("Invalid sample at offset {offset}: {reason}")]
    InvalidSample { offset: usize, reason: String },

    /// The sample source failed to produce a sample.
    #[error("Sample error: {0}")]
    Sample(#[from] SampleError),

    /// The worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Result type for metric operations.
pub type Result<T> = std::result::Result<T, MetricError>;

impl MetricError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an unsupported transform error.
    pub fn unsupported_transform(msg: impl Into<String>) -> Self {
        Self::UnsupportedTransform(msg.into())
    }

    /// Create an invalid sample error.
    pub fn invalid_sample(offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSample {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a worker pool error.
    pub fn worker_pool(msg: impl Into<String>) -> Self {
        Self::WorkerPool(msg.into())
    }

    /// Whether the error was raised while validating the configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_) | Self::UnsupportedTransform(_)
        )
    }
}
