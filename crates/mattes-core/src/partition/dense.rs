//! Partitioning of a dense domain into slabs.

use std::sync::Arc;

use super::trait_::{split_range, SampleBlock, ThreadPartitioner};
use crate::image::ImageRegion;

/// Splits a dense domain into contiguous slabs along one axis.
///
/// The slab axis is the slowest-varying axis whose extent is at least the
/// worker count; if no axis is long enough, the longest axis is used and
/// fewer blocks than workers are produced.
#[derive(Debug, Clone)]
pub struct DenseRegionPartitioner {
    domain: Arc<[usize]>,
}

impl DenseRegionPartitioner {
    /// Create a partitioner over a domain of the given size.
    pub fn new(domain: &[usize]) -> Self {
        Self {
            domain: Arc::from(domain),
        }
    }

    /// Size of the partitioned domain.
    pub fn domain(&self) -> &[usize] {
        &self.domain
    }

    fn split_axis(&self, number_of_workers: usize) -> Option<usize> {
        let axes = self.domain.len();
        (0..axes)
            .rev()
            .find(|&axis| self.domain[axis] >= number_of_workers)
            .or_else(|| (0..axes).rev().max_by_key(|&axis| self.domain[axis]))
    }
}

impl ThreadPartitioner for DenseRegionPartitioner {
    fn number_of_samples(&self) -> usize {
        ImageRegion::from_size(&self.domain).number_of_pixels()
    }

    fn partition(&self, number_of_workers: usize) -> Vec<SampleBlock> {
        if number_of_workers == 0 || self.number_of_samples() == 0 {
            return Vec::new();
        }
        let Some(axis) = self.split_axis(number_of_workers) else {
            return Vec::new();
        };

        let extent = self.domain[axis];
        split_range(extent, number_of_workers.min(extent))
            .into_iter()
            .map(|range| {
                let mut index = vec![0; self.domain.len()];
                let mut size = self.domain.to_vec();
                index[axis] = range.start;
                size[axis] = range.len();
                SampleBlock::Dense {
                    region: ImageRegion::new(index, size),
                    domain: Arc::clone(&self.domain),
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "DenseRegionPartitioner"
    }
}
