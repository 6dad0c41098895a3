//! Building blocks for histogram-based image similarity metrics.
//!
//! `mattes-core` holds the pieces a threaded joint-histogram metric is built
//! from: the Parzen kernels, the sample points produced by the image,
//! transform and interpolator collaborators, and the partitioners that split
//! a sample domain across worker threads.

pub mod error;
pub mod image;
pub mod kernel;
pub mod partition;
pub mod sample;

pub use error::SampleError;
pub use image::ImageRegion;
pub use kernel::{ParzenKernel, ParzenKernelPair};
pub use partition::{SampleBlock, ThreadPartitioner};
pub use sample::{IntensityRange, SamplePoint, SampleSet, SampleSource};
