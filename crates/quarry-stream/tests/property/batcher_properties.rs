use proptest::prelude::*;
use quarry_stream::BatchExt;

proptest! {
    #[test]
    fn chunks_concatenate_back_to_the_source(items in prop::collection::vec(any::<u16>(), 0..200), size in 1usize..17) {
        let chunks: Vec<Vec<u16>> = items.clone().into_iter().batched(size).unwrap().collect();

        let flat: Vec<u16> = chunks.iter().flatten().copied().collect();
        prop_assert_eq!(flat, items.clone());
        prop_assert_eq!(chunks.len(), items.len().div_ceil(size));
        if let Some((last, full)) = chunks.split_last() {
            prop_assert!(full.iter().all(|c| c.len() == size));
            prop_assert!(!last.is_empty() && last.len() <= size);
        }
    }

    #[test]
    fn infinite_source_only_yields_full_chunks(size in 1usize..17, take in 0usize..20) {
        let chunks: Vec<Vec<u64>> = (0u64..).batched(size).unwrap().take(take).collect();
        prop_assert_eq!(chunks.len(), take);
        for (i, chunk) in chunks.iter().enumerate() {
            let start = (i * size) as u64;
            prop_assert_eq!(chunk, &(start..start + size as u64).collect::<Vec<_>>());
        }
    }
}
