//! Thread partitioning of sample domains.
//!
//! Two strategies are provided: dense partitioning of a whole spatial domain
//! into slabs, and sparse partitioning of a pre-selected list of offsets.

pub mod trait_;
pub mod dense;
pub mod sparse;

pub use trait_::{split_range, SampleBlock, ThreadPartitioner};
pub use dense::DenseRegionPartitioner;
pub use sparse::SparseIndexPartitioner;
