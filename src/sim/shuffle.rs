//! Uniform random permutation

use rand::Rng;
use rand::seq::SliceRandom;

/// Fisher–Yates shuffle in place
pub fn shuffle<T>(items: &mut [T], rng: &mut impl Rng) {
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, sorted, "50 items should not come back in order");
    }

    #[test]
    fn test_shuffle_same_seed_same_order() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut Pcg32::seed_from_u64(9));
        shuffle(&mut b, &mut Pcg32::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_short_slices() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut empty: [u8; 0] = [];
        shuffle(&mut empty, &mut rng);
        let mut one = [5];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, [5]);
    }

    #[test]
    fn test_shuffle_is_roughly_uniform() {
        // Each of the 6 orderings of 3 items should show up about 1/6 of the time
        let mut rng = Pcg32::seed_from_u64(2024);
        let mut counts = std::collections::HashMap::new();
        let trials = 6000;
        for _ in 0..trials {
            let mut items = [0, 1, 2];
            shuffle(&mut items, &mut rng);
            *counts.entry(items).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 6);
        for (order, n) in counts {
            assert!((800..1200).contains(&n), "{order:?} seen {n} times");
        }
    }
}
