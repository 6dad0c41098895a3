//! Metric implementations.
//!
//! The Mattes mutual information metric and the pieces it is assembled
//! from: histogram layout and math, per-worker accumulation, the
//! range-locked merge buffers and the per-session evaluation context.

pub mod trait_;
pub mod histogram;
pub mod accumulator;
pub mod partitioned;
pub mod context;
pub mod mutual_information;

pub use trait_::ImageToImageMetric;
pub use histogram::{HistogramAxis, HistogramConfiguration, JointPdfDerivatives, DENSITY_GUARD};
pub use accumulator::{ThreadDerivative, ThreadHistogram};
pub use partitioned::PartitionedAccumulator;
pub use context::{EvaluationContext, EvaluationResults, MergedHistogram};
pub use mutual_information::MattesMutualInformation;
