use mattes_core::partition::{DenseRegionPartitioner, SparseIndexPartitioner, ThreadPartitioner};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_dense_partition_covers_domain_once(
        size in prop::collection::vec(1usize..7, 1..4),
        workers in 1usize..10,
    ) {
        let partitioner = DenseRegionPartitioner::new(&size);
        let total: usize = size.iter().product();
        let blocks = partitioner.partition(workers);

        prop_assert!(blocks.len() <= workers);
        prop_assert!(blocks.iter().all(|b| !b.is_empty()));

        let mut seen = vec![0u32; total];
        for block in &blocks {
            for offset in block.offsets() {
                seen[offset] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&count| count == 1), "coverage {:?}", seen);
        prop_assert_eq!(partitioner.partition(workers), blocks);
    }

    #[test]
    fn test_sparse_partition_covers_list_once(
        offsets in prop::collection::vec(0usize..1000, 0..200),
        workers in 1usize..16,
    ) {
        let partitioner = SparseIndexPartitioner::new(offsets.clone());
        let blocks = partitioner.partition(workers);

        prop_assert!(blocks.len() <= workers);
        let flattened: Vec<usize> = blocks.iter().flat_map(|b| b.offsets().collect::<Vec<_>>()).collect();
        prop_assert_eq!(flattened, offsets);

        let lengths: Vec<usize> = blocks.iter().map(|b| b.len()).collect();
        if let (Some(max), Some(min)) = (lengths.iter().max(), lengths.iter().min()) {
            prop_assert!(max - min <= 1);
        }
    }
}
