//! Dense sample domains.
//!
//! This module provides the index region type used to describe the dense
//! spatial domain a metric iterates over and the sub-regions handed to
//! worker threads.

pub mod region;

pub use region::{ImageRegion, RegionOffsets};
