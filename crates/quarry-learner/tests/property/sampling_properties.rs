use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use quarry_learner::stratified_sampling;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Class sizes plus a number of unlabeled rows, shuffled together by seed.
fn labels_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (prop::collection::vec(0usize..40, 1..6), 0usize..20).prop_map(|(sizes, unlabeled)| {
        let mut labels: Vec<Option<usize>> = sizes
            .iter()
            .enumerate()
            .flat_map(|(class, &size)| std::iter::repeat(Some(class)).take(size))
            .collect();
        labels.extend(std::iter::repeat(None).take(unlabeled));
        // Interleave deterministically so classes are not contiguous.
        labels.sort_by_key(|l| l.map_or(0, |c| (c * 7919) % 13));
        labels
    })
}

fn counts(labels: &[Option<usize>], picked: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &i in picked {
        if let Some(class) = labels[i] {
            *counts.entry(class).or_insert(0) += 1;
        }
    }
    counts
}

proptest! {
    #[test]
    fn sample_is_sorted_distinct_and_labeled(labels in labels_strategy(), n in 0usize..150, seed: u64) {
        let picked = stratified_sampling(&labels, n, &mut StdRng::seed_from_u64(seed));
        let total = labels.iter().flatten().count();

        prop_assert_eq!(picked.len(), n.min(total));
        prop_assert!(picked.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(picked.iter().all(|&i| labels[i].is_some()));
    }

    #[test]
    fn every_present_class_is_represented(labels in labels_strategy(), n in 0usize..150, seed: u64) {
        let present: BTreeSet<usize> = labels.iter().flatten().copied().collect();
        prop_assume!(n >= present.len());

        let picked = stratified_sampling(&labels, n, &mut StdRng::seed_from_u64(seed));
        let counts = counts(&labels, &picked);
        prop_assert_eq!(counts.keys().copied().collect::<BTreeSet<_>>(), present);
    }

    #[test]
    fn quotas_stay_near_proportional(labels in labels_strategy(), n in 0usize..150, seed: u64) {
        let total = labels.iter().flatten().count();
        prop_assume!(total > 0 && n < total);

        let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
        for class in labels.iter().flatten() {
            *sizes.entry(*class).or_insert(0) += 1;
        }
        let picked = stratified_sampling(&labels, n, &mut StdRng::seed_from_u64(seed));
        let counts = counts(&labels, &picked);
        for (class, size) in &sizes {
            let exact = n as f64 * *size as f64 / total as f64;
            let got = counts.get(class).copied().unwrap_or(0) as f64;
            prop_assert!((got - exact).abs() <= sizes.len() as f64);
        }
    }
}
