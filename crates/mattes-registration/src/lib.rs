//! Threaded Mattes mutual information for image registration.
//!
//! The metric estimates the joint intensity histogram of a fixed and a
//! moving image with Parzen windowing, splits the samples over a worker
//! pool and merges the partial histograms through range-locked buffers.
//! Sample production (images, transform, interpolation) is supplied by a
//! [`mattes_core::SampleSource`].

pub mod config;
pub mod error;
pub mod metric;
pub mod validation;

pub use config::{DerivativeMethod, MattesConfig, DEFAULT_HISTOGRAM_BINS};
pub use error::{MetricError, Result};
pub use metric::{EvaluationResults, ImageToImageMetric, MattesMutualInformation};
