//! Partitioning of a pre-selected sample list.

use std::sync::Arc;

use super::trait_::{split_range, SampleBlock, ThreadPartitioner};

/// Splits a list of pre-selected domain offsets into contiguous ranges.
#[derive(Debug, Clone)]
pub struct SparseIndexPartitioner {
    offsets: Arc<[usize]>,
}

impl SparseIndexPartitioner {
    /// Create a partitioner over the given sample offsets.
    pub fn new(offsets: impl Into<Arc<[usize]>>) -> Self {
        Self {
            offsets: offsets.into(),
        }
    }

    /// The sample offsets being partitioned.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}

impl ThreadPartitioner for SparseIndexPartitioner {
    fn number_of_samples(&self) -> usize {
        self.offsets.len()
    }

    fn partition(&self, number_of_workers: usize) -> Vec<SampleBlock> {
        let len = self.offsets.len();
        split_range(len, number_of_workers.min(len))
            .into_iter()
            .map(|range| SampleBlock::Sparse {
                offsets: Arc::clone(&self.offsets),
                range,
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "SparseIndexPartitioner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_ranges() {
        let partitioner = SparseIndexPartitioner::new(vec![9, 3, 7, 1, 5]);
        let blocks = partitioner.partition(2);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].offsets().collect::<Vec<_>>(), vec![9, 3, 7]);
        assert_eq!(blocks[1].offsets().collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn test_more_workers_than_samples() {
        let partitioner = SparseIndexPartitioner::new(vec![4, 2]);
        assert_eq!(partitioner.partition(8).len(), 2);
        assert!(SparseIndexPartitioner::new(Vec::<usize>::new()).partition(8).is_empty());
    }
}
