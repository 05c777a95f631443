//! # Committee Swap
//!
//! Lists are queues: rotation removes from the front of the committee and
//! promotes from the front of the pending list. Nothing is ever sorted.

use crate::domain::{CommitteeError, SwapLimits, SwapOutcome};
use shared_types::{Blacklist, ValidatorKey};
use std::collections::HashSet;

/// Raw swap over pre-partitioned lists.
///
/// Under capacity every good pending validator joins. Over capacity the first
/// `k = min(offset, good_pending, current_good)` good producers leave and the
/// first `k` good pending validators take their place at the back.
pub fn swap(
    bad_pending: &[ValidatorKey],
    good_pending: &[ValidatorKey],
    current_good: &[ValidatorKey],
    current_bad: &[ValidatorKey],
    max_committee_size: usize,
    offset: usize,
) -> Result<SwapOutcome, CommitteeError> {
    let committee_size = current_good.len() + current_bad.len();
    if offset > committee_size {
        return Err(CommitteeError::OffsetOutOfRange {
            offset,
            committee_size,
        });
    }

    if current_good.len() + good_pending.len() <= max_committee_size {
        let mut committee = current_good.to_vec();
        committee.extend_from_slice(good_pending);
        return Ok(SwapOutcome {
            remaining_pending: bad_pending.to_vec(),
            committee,
            dropped: Vec::new(),
            added: good_pending.to_vec(),
        });
    }

    let k = offset.min(good_pending.len()).min(current_good.len());
    let added = good_pending[..k].to_vec();

    let mut committee = current_good[k..].to_vec();
    committee.extend_from_slice(&added);

    let mut remaining_pending = good_pending[k..].to_vec();
    remaining_pending.extend_from_slice(bad_pending);

    Ok(SwapOutcome {
        remaining_pending,
        committee,
        dropped: current_good[..k].to_vec(),
        added,
    })
}

/// Rotate a committee, excluding blacklisted producers.
///
/// Bad producers in the committee are always candidates for eviction, but the
/// committee never shrinks below `min_committee_size` because of it.
pub fn swap_validator(
    pending: &[ValidatorKey],
    committee: &[ValidatorKey],
    limits: &SwapLimits,
    blacklist: &Blacklist,
) -> Result<SwapOutcome, CommitteeError> {
    let (bad_pending, good_pending) = partition(pending, blacklist);
    let (current_bad, current_good) = partition(committee, blacklist);

    if current_good.len() >= limits.min_committee_size {
        let step = if current_good.len() >= limits.max_committee_size {
            limits.swap_offset
        } else {
            limits.offset
        }
        .min(good_pending.len());

        // Free seats are filled first; only the rest of `step` rotates.
        let room = limits.max_committee_size.saturating_sub(current_good.len());
        let fill = step.min(room);
        let rotate = (step - fill).min(current_good.len());

        let mut seated = current_good.clone();
        seated.extend_from_slice(&good_pending[..fill]);
        let raw = swap(
            &[],
            &good_pending[fill..fill + rotate],
            &seated,
            &current_bad,
            seated.len(),
            rotate,
        )?;

        let mut dropped = current_bad;
        dropped.extend(raw.dropped);

        let mut added = good_pending[..fill].to_vec();
        added.extend(raw.added);

        let mut remaining_pending = raw.remaining_pending;
        remaining_pending.extend_from_slice(&good_pending[fill + rotate..]);
        remaining_pending.extend(bad_pending);

        return Ok(SwapOutcome {
            remaining_pending,
            committee: raw.committee,
            dropped,
            added,
        });
    }

    // Too few good producers: promote enough to reach the minimum, then evict
    // bad producers only while the committee stays at or above it.
    let needed = limits.min_committee_size - current_good.len();
    let room = limits.max_committee_size.saturating_sub(current_good.len());
    let k = good_pending.len().min(limits.offset.max(needed)).min(room);
    let added = good_pending[..k].to_vec();

    let evictable = (committee.len() + k)
        .saturating_sub(limits.min_committee_size)
        .min(current_bad.len());

    let mut dropped = Vec::with_capacity(evictable);
    let mut survivors = Vec::with_capacity(committee.len());
    for producer in committee {
        if dropped.len() < evictable && blacklist.contains_key(producer) {
            dropped.push(producer.clone());
        } else {
            survivors.push(producer.clone());
        }
    }
    survivors.extend_from_slice(&added);

    let mut remaining_pending = good_pending[k..].to_vec();
    remaining_pending.extend(bad_pending);

    Ok(SwapOutcome {
        remaining_pending,
        committee: survivors,
        dropped,
        added,
    })
}

/// Remove `to_remove` from `validators`, all or nothing.
pub fn remove_validator(
    validators: &[ValidatorKey],
    to_remove: &[ValidatorKey],
) -> Result<Vec<ValidatorKey>, CommitteeError> {
    let present: HashSet<&ValidatorKey> = validators.iter().collect();
    if let Some(missing) = to_remove.iter().find(|v| !present.contains(v)) {
        return Err(CommitteeError::ValidatorNotPresent(missing.clone()));
    }

    let removed: HashSet<&ValidatorKey> = to_remove.iter().collect();
    Ok(validators
        .iter()
        .filter(|v| !removed.contains(v))
        .cloned()
        .collect())
}

/// Split into (blacklisted, clean), both in input order.
fn partition(
    validators: &[ValidatorKey],
    blacklist: &Blacklist,
) -> (Vec<ValidatorKey>, Vec<ValidatorKey>) {
    validators
        .iter()
        .cloned()
        .partition(|v| blacklist.contains_key(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn blacklist(entries: &[&str]) -> Blacklist {
        entries.iter().map(|e| (e.to_string(), 2u8)).collect()
    }

    // --- raw swap ---

    #[test]
    fn test_offset_out_of_range() {
        let good_pending = keys("p", 3);
        let current_good = keys("c", 2);
        let result = swap(&[], &good_pending, &current_good, &[], 4, 3);

        assert_eq!(
            result,
            Err(CommitteeError::OffsetOutOfRange {
                offset: 3,
                committee_size: 2
            })
        );
        // Borrowed inputs are untouched.
        assert_eq!(good_pending, keys("p", 3));
        assert_eq!(current_good, keys("c", 2));
    }

    #[test]
    fn test_under_capacity_everyone_joins() {
        let bad_pending = keys("b", 1);
        let good_pending = keys("p", 2);
        let current_good = keys("c", 3);

        let outcome = swap(&bad_pending, &good_pending, &current_good, &[], 5, 1).unwrap();

        assert!(outcome.dropped.is_empty());
        assert_eq!(outcome.added, good_pending);
        assert_eq!(outcome.committee, vec!["c0", "c1", "c2", "p0", "p1"]);
        assert_eq!(outcome.remaining_pending, bad_pending);
    }

    #[test]
    fn test_under_capacity_empty_pending() {
        let outcome = swap(&[], &[], &keys("c", 2), &[], 4, 0).unwrap();
        assert!(outcome.remaining_pending.is_empty());
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.committee, keys("c", 2));
    }

    #[test]
    fn test_over_capacity_prefix_rule() {
        let good_pending = keys("p", 4);
        let current_good = keys("c", 4);
        let bad_pending = keys("b", 1);

        let outcome = swap(&bad_pending, &good_pending, &current_good, &[], 4, 2).unwrap();

        assert_eq!(outcome.dropped, vec!["c0", "c1"]);
        assert_eq!(outcome.added, vec!["p0", "p1"]);
        assert_eq!(outcome.committee, vec!["c2", "c3", "p0", "p1"]);
        assert_eq!(outcome.remaining_pending, vec!["p2", "p3", "b0"]);
    }

    #[test]
    fn test_over_capacity_limited_by_pending() {
        let outcome = swap(&[], &keys("p", 1), &keys("c", 4), &[], 4, 3).unwrap();
        assert_eq!(outcome.dropped, vec!["c0"]);
        assert_eq!(outcome.committee, vec!["c1", "c2", "c3", "p0"]);
        assert!(outcome.remaining_pending.is_empty());
    }

    // --- swap_validator ---

    fn limits(max: usize, min: usize, offset: usize, swap_offset: usize) -> SwapLimits {
        SwapLimits {
            max_committee_size: max,
            min_committee_size: min,
            offset,
            swap_offset,
        }
    }

    #[test]
    fn test_full_committee_uses_swap_offset() {
        let pending = keys("p", 3);
        let committee = keys("c", 4);

        let outcome =
            swap_validator(&pending, &committee, &limits(4, 2, 3, 1), &Blacklist::new()).unwrap();

        assert_eq!(outcome.dropped, vec!["c0"]);
        assert_eq!(outcome.added, vec!["p0"]);
        assert_eq!(outcome.committee, vec!["c1", "c2", "c3", "p0"]);
        assert_eq!(outcome.remaining_pending, vec!["p1", "p2"]);
    }

    #[test]
    fn test_growing_committee_uses_offset() {
        let pending = keys("p", 5);
        let committee = keys("c", 3);

        let outcome =
            swap_validator(&pending, &committee, &limits(8, 2, 2, 1), &Blacklist::new()).unwrap();

        assert!(outcome.dropped.is_empty());
        assert_eq!(outcome.added, vec!["p0", "p1"]);
        assert_eq!(outcome.committee, vec!["c0", "c1", "c2", "p0", "p1"]);
        assert_eq!(outcome.remaining_pending, vec!["p2", "p3", "p4"]);
    }

    #[test]
    fn test_partial_room_filled_before_swapping() {
        let pending = keys("p", 5);
        let committee = keys("c", 3);

        let outcome =
            swap_validator(&pending, &committee, &limits(4, 2, 2, 1), &Blacklist::new()).unwrap();

        // One free seat takes p0, the second step swaps c0 for p1.
        assert_eq!(outcome.added, vec!["p0", "p1"]);
        assert_eq!(outcome.dropped, vec!["c0"]);
        assert_eq!(outcome.committee, vec!["c1", "c2", "p0", "p1"]);
        assert_eq!(outcome.remaining_pending, vec!["p2", "p3", "p4"]);
    }

    #[test]
    fn test_bad_producers_dropped_and_bad_pending_kept_last() {
        let pending = vec!["bp".to_string(), "p0".to_string(), "p1".to_string()];
        let committee = vec![
            "c0".to_string(),
            "bad".to_string(),
            "c1".to_string(),
            "c2".to_string(),
        ];
        let list = blacklist(&["bad", "bp"]);

        let outcome = swap_validator(&pending, &committee, &limits(4, 2, 1, 1), &list).unwrap();

        assert_eq!(outcome.dropped, vec!["bad"]);
        assert_eq!(outcome.committee, vec!["c0", "c1", "c2", "p0"]);
        assert_eq!(outcome.remaining_pending, vec!["p1", "bp"]);
        assert!(!outcome.committee.iter().any(|v| list.contains_key(v)));
    }

    #[test]
    fn test_fill_path_keeps_minimum() {
        // Two good producers, three bad, minimum four, only one good pending.
        let committee = vec![
            "bad0".to_string(),
            "g0".to_string(),
            "bad1".to_string(),
            "g1".to_string(),
            "bad2".to_string(),
        ];
        let pending = vec!["p0".to_string()];
        let list = blacklist(&["bad0", "bad1", "bad2"]);

        let outcome = swap_validator(&pending, &committee, &limits(6, 4, 1, 1), &list).unwrap();

        assert_eq!(outcome.added, vec!["p0"]);
        // 5 + 1 - 4 = 2 bad producers may leave, in committee order.
        assert_eq!(outcome.dropped, vec!["bad0", "bad1"]);
        assert_eq!(outcome.committee, vec!["g0", "g1", "bad2", "p0"]);
        assert!(outcome.committee.len() >= 4);
    }

    #[test]
    fn test_fill_path_promotes_up_to_minimum() {
        let committee = keys("c", 1);
        let pending = keys("p", 6);

        let outcome =
            swap_validator(&pending, &committee, &limits(8, 4, 1, 1), &Blacklist::new()).unwrap();

        assert_eq!(outcome.added, vec!["p0", "p1", "p2"]);
        assert_eq!(outcome.committee.len(), 4);
        assert_eq!(outcome.remaining_pending, vec!["p3", "p4", "p5"]);
    }

    #[test]
    fn test_empty_committee_is_filled() {
        let pending = keys("p", 3);
        let outcome =
            swap_validator(&pending, &[], &limits(4, 0, 2, 1), &Blacklist::new()).unwrap();
        assert_eq!(outcome.committee, vec!["p0", "p1"]);
        assert_eq!(outcome.remaining_pending, vec!["p2"]);
    }

    #[test]
    fn test_never_below_minimum() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let max = rng.gen_range(1..10);
            let min = rng.gen_range(0..=max);
            let committee = keys("c", rng.gen_range(0..=max));
            let pending = keys("p", rng.gen_range(0..10));
            let list: Blacklist = committee
                .iter()
                .chain(pending.iter())
                .filter(|_| rng.gen_bool(0.3))
                .map(|v| (v.clone(), 1))
                .collect();
            let l = limits(max, min, rng.gen_range(0..4), rng.gen_range(0..4));

            let outcome = swap_validator(&pending, &committee, &l, &list).unwrap();

            assert!(outcome.committee.len() >= min.min(committee.len()));
            assert!(outcome.committee.len() <= max.max(committee.len()));
            assert!(!outcome.added.iter().any(|v| list.contains_key(v)));
            let total =
                outcome.committee.len() + outcome.remaining_pending.len() + outcome.dropped.len();
            assert_eq!(total, committee.len() + pending.len());
        }
    }

    // --- remove_validator ---

    #[test]
    fn test_remove_validator_preserves_order() {
        let validators = keys("v", 5);
        let remaining =
            remove_validator(&validators, &["v3".to_string(), "v1".to_string()]).unwrap();
        assert_eq!(remaining, vec!["v0", "v2", "v4"]);
    }

    #[test]
    fn test_remove_validator_all_or_nothing() {
        let validators = keys("v", 3);
        let result = remove_validator(&validators, &["v0".to_string(), "ghost".to_string()]);
        assert_eq!(
            result,
            Err(CommitteeError::ValidatorNotPresent("ghost".to_string()))
        );
        assert_eq!(validators, keys("v", 3));
    }

    #[test]
    fn test_remove_nothing() {
        let validators = keys("v", 2);
        assert_eq!(remove_validator(&validators, &[]).unwrap(), validators);
    }
}
