//! # Deterministic Shuffle
//!
//! Candidates are ordered by `sha256(seed.to_string() + candidate)`. The sort
//! is stable, so equal digests (duplicate candidates) keep input order.

use bc_compute::batch_sha256;
use shared_types::ValidatorKey;

/// Permute `candidates` deterministically from `seed`.
///
/// Any `i64` is a valid seed. Empty input yields empty output.
pub fn shuffle(candidates: &[ValidatorKey], seed: i64) -> Vec<ValidatorKey> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let keys: Vec<String> = candidates
        .iter()
        .map(|candidate| format!("{}{}", seed, candidate))
        .collect();
    let digests = batch_sha256(&keys);

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|a, b| digests[*a].cmp(&digests[*b]));

    order.into_iter().map(|i| candidates[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    fn candidates(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("validator-{}", i)).collect()
    }

    #[test]
    fn test_deterministic_over_repeated_calls() {
        let input = candidates(50);
        let first = shuffle(&input, 1_234_567);
        for _ in 0..100 {
            assert_eq!(shuffle(&input, 1_234_567), first);
        }
    }

    #[test]
    fn test_is_permutation() {
        let input = candidates(64);
        let mut output = shuffle(&input, -42);
        assert_eq!(output.len(), input.len());
        output.sort();
        let mut sorted = input.clone();
        sorted.sort();
        assert_eq!(output, sorted);
    }

    #[test]
    fn test_orders_by_seeded_digest() {
        let input = candidates(10);
        let seed = 99;
        let output = shuffle(&input, seed);

        let digest = |c: &String| Sha256::digest(format!("{}{}", seed, c).as_bytes()).to_vec();
        for pair in output.windows(2) {
            assert!(digest(&pair[0]) <= digest(&pair[1]));
        }
    }

    #[test]
    fn test_extreme_seeds() {
        let input = candidates(20);
        let max = shuffle(&input, i64::MAX);
        let min = shuffle(&input, i64::MIN);
        assert_eq!(max.len(), 20);
        assert_eq!(min.len(), 20);
        assert_eq!(shuffle(&input, i64::MAX), max);
    }

    #[test]
    fn test_seed_changes_order() {
        let input = candidates(30);
        assert_ne!(shuffle(&input, 1), shuffle(&input, 2));
    }

    #[test]
    fn test_empty_input() {
        assert!(shuffle(&[], 7).is_empty());
    }

    #[test]
    fn test_duplicates_kept() {
        let input = vec!["dup".to_string(), "other".to_string(), "dup".to_string()];
        let output = shuffle(&input, 5);
        assert_eq!(output.iter().filter(|c| *c == "dup").count(), 2);
        assert_eq!(output.len(), 3);
    }
}
