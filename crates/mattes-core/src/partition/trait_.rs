//! Thread partitioner trait and the work blocks it produces.

use std::fmt::Debug;
use std::ops::Range;
use std::sync::Arc;

use crate::image::ImageRegion;

/// Contiguous block of samples assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleBlock {
    /// Sub-region of a dense domain.
    Dense {
        /// The sub-region.
        region: ImageRegion,
        /// Size of the whole domain, used to linearize indices.
        domain: Arc<[usize]>,
    },
    /// Index range into a list of pre-selected offsets.
    Sparse {
        /// Pre-selected domain offsets shared by all blocks.
        offsets: Arc<[usize]>,
        /// Positions of this block inside `offsets`.
        range: Range<usize>,
    },
}

impl SampleBlock {
    /// Number of samples in the block.
    pub fn len(&self) -> usize {
        match self {
            Self::Dense { region, .. } => region.number_of_pixels(),
            Self::Sparse { range, .. } => range.len(),
        }
    }

    /// Whether the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Domain offsets of the block's samples, in iteration order.
    pub fn offsets(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match self {
            Self::Dense { region, domain } => Box::new(region.offsets(domain)),
            Self::Sparse { offsets, range } => Box::new(offsets[range.clone()].iter().copied()),
        }
    }
}

/// Splits a sample domain into one contiguous block per worker.
///
/// Implementations must assign every sample to exactly one block and must
/// produce the same blocks for the same worker count.
pub trait ThreadPartitioner: Send + Sync + Debug {
    /// Total number of samples being partitioned.
    fn number_of_samples(&self) -> usize;

    /// Split the samples into at most `number_of_workers` non-empty blocks.
    fn partition(&self, number_of_workers: usize) -> Vec<SampleBlock>;

    /// Name of the partitioning strategy.
    fn name(&self) -> &'static str;
}

/// Split `0..len` into `pieces` contiguous ranges whose lengths differ by at
/// most one; the first `len % pieces` ranges are the longer ones.
pub fn split_range(len: usize, pieces: usize) -> Vec<Range<usize>> {
    if pieces == 0 {
        return Vec::new();
    }
    let base = len / pieces;
    let extra = len % pieces;

    let mut start = 0;
    (0..pieces)
        .map(|i| {
            let end = start + base + usize::from(i < extra);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}
