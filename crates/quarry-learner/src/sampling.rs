//! Stratified sampling for the seed set.
//!
//! Per-class quotas come from largest-remainder rounding of
//! `n * count_c / total`, capped by class size. When `n` is at least the
//! number of present classes every class gets one slot, taken from the class
//! with the largest quota. Members are then drawn uniformly without
//! replacement within each class.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

/// Indices (ascending) of a class-balanced sample of `n` labeled rows.
///
/// Rows with an unknown label are ignored. If `n` is at least the number of
/// labeled rows, every labeled row is returned.
pub fn stratified_sampling<R: Rng + ?Sized>(
    labels: &[Option<usize>],
    n: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut classes: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        if let Some(label) = label {
            classes.entry(*label).or_default().push(index);
        }
    }
    let total: usize = classes.values().map(Vec::len).sum();
    if n >= total {
        let mut all: Vec<usize> = classes.into_values().flatten().collect();
        all.sort_unstable();
        return all;
    }

    let quotas = class_quotas(&classes, n, total);
    let mut picked: Vec<usize> = classes
        .iter()
        .zip(&quotas)
        .flat_map(|((_, members), &quota)| members.choose_multiple(rng, quota).copied())
        .collect();
    picked.sort_unstable();
    picked
}

/// Quota per class, in class order.
fn class_quotas(classes: &BTreeMap<usize, Vec<usize>>, n: usize, total: usize) -> Vec<usize> {
    let sizes: Vec<usize> = classes.values().map(Vec::len).collect();
    let mut quotas: Vec<usize> = sizes.iter().map(|&size| n * size / total).collect();

    // Hand out the remainder by largest fractional part, ties to the lower class.
    let mut remainders: Vec<(usize, usize)> = sizes
        .iter()
        .enumerate()
        .map(|(c, &size)| ((n * size) % total, c))
        .collect();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let mut left = n - quotas.iter().sum::<usize>();
    for &(_, c) in &remainders {
        if left == 0 {
            break;
        }
        if quotas[c] < sizes[c] {
            quotas[c] += 1;
            left -= 1;
        }
    }

    if n >= sizes.len() {
        for c in 0..quotas.len() {
            if quotas[c] > 0 {
                continue;
            }
            let donor = (0..quotas.len())
                .filter(|&d| quotas[d] > 1)
                .max_by(|&a, &b| quotas[a].cmp(&quotas[b]).then(b.cmp(&a)));
            if let Some(donor) = donor {
                quotas[donor] -= 1;
                quotas[c] = 1;
            }
        }
    }
    quotas
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn labels(counts: &[usize]) -> Vec<Option<usize>> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(class, &count)| std::iter::repeat(Some(class)).take(count))
            .collect()
    }

    fn per_class(labels: &[Option<usize>], picked: &[usize]) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &i in picked {
            *counts.entry(labels[i].unwrap()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn proportional_quotas() {
        let labels = labels(&[100, 50, 25]);
        let picked = stratified_sampling(&labels, 35, &mut StdRng::seed_from_u64(1));
        assert_eq!(picked.len(), 35);
        assert_eq!(
            per_class(&labels, &picked),
            BTreeMap::from([(0, 20), (1, 10), (2, 5)])
        );
    }

    #[test]
    fn rare_class_still_gets_a_slot() {
        let labels = labels(&[97, 2, 1]);
        let picked = stratified_sampling(&labels, 10, &mut StdRng::seed_from_u64(3));
        let counts = per_class(&labels, &picked);
        assert_eq!(picked.len(), 10);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&2], 1);
    }

    #[test]
    fn unknown_labels_are_ignored() {
        let labels = vec![Some(0), None, Some(1), None, Some(0), Some(1)];
        let picked = stratified_sampling(&labels, 2, &mut StdRng::seed_from_u64(0));
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|&i| labels[i].is_some()));
        assert_eq!(per_class(&labels, &picked).len(), 2);
    }

    #[test]
    fn oversized_request_returns_every_labeled_row() {
        let labels = vec![Some(0), None, Some(1)];
        assert_eq!(
            stratified_sampling(&labels, 10, &mut StdRng::seed_from_u64(0)),
            vec![0, 2]
        );
    }

    #[test]
    fn fewer_slots_than_classes() {
        let labels = labels(&[5, 5, 5, 5]);
        let picked = stratified_sampling(&labels, 2, &mut StdRng::seed_from_u64(9));
        assert_eq!(picked.len(), 2);
    }
}
