//! # Epoch Arithmetic
//!
//! Heights `1..=V1_END` belong to epochs `1..B` of length `epoch`, where `B`
//! is the breakpoint epoch and `V1_END = (B - 1) * epoch`. From `V1_END + 1`
//! on, epochs `B, B+1, ..` last `epoch_v2` blocks. Height 0 is epoch 0.
//!
//! Every predicate is derived from [`EpochCalculator::epoch_of`],
//! [`EpochCalculator::first_height`], [`EpochCalculator::last_height`] and
//! [`EpochCalculator::random_time`].

use crate::domain::{CommitteeError, EpochParams};
use shared_types::{BeaconHeight, Epoch};

/// Pure height/epoch mapping over validated [`EpochParams`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochCalculator {
    params: EpochParams,
    v1_end: BeaconHeight,
}

impl EpochCalculator {
    /// Validate `params` and build a calculator.
    pub fn new(params: EpochParams) -> Result<Self, CommitteeError> {
        params.validate()?;
        Ok(Self {
            params,
            v1_end: (params.epoch_v2_breakpoint - 1) * params.epoch,
        })
    }

    /// Parameters the calculator was built from.
    pub fn params(&self) -> &EpochParams {
        &self.params
    }

    /// Last height of the pre-breakpoint regime.
    pub fn v1_end(&self) -> BeaconHeight {
        self.v1_end
    }

    fn breakpoint(&self) -> Epoch {
        self.params.epoch_v2_breakpoint
    }

    /// Epoch containing `height`.
    pub fn epoch_of(&self, height: BeaconHeight) -> Epoch {
        if height == 0 {
            return 0;
        }
        if height <= self.v1_end {
            return height.div_ceil(self.params.epoch);
        }
        (self.breakpoint() - 1) + (height - self.v1_end).div_ceil(self.params.epoch_v2)
    }

    /// Length of the epoch containing `height`.
    pub fn epoch_length(&self, height: BeaconHeight) -> u64 {
        self.length_of_epoch(self.epoch_of(height))
    }

    fn length_of_epoch(&self, epoch: Epoch) -> u64 {
        if epoch < self.breakpoint() {
            self.params.epoch
        } else {
            self.params.epoch_v2
        }
    }

    /// First height of `epoch`.
    pub fn first_height(&self, epoch: Epoch) -> BeaconHeight {
        if epoch == 0 {
            return 0;
        }
        if epoch < self.breakpoint() {
            return (epoch - 1).saturating_mul(self.params.epoch) + 1;
        }
        self.v1_end
            .saturating_add((epoch - self.breakpoint()).saturating_mul(self.params.epoch_v2))
            .saturating_add(1)
    }

    /// Last height of `epoch`.
    pub fn last_height(&self, epoch: Epoch) -> BeaconHeight {
        if epoch == 0 {
            return 0;
        }
        if epoch < self.breakpoint() {
            return epoch.saturating_mul(self.params.epoch);
        }
        self.v1_end
            .saturating_add((epoch - self.breakpoint() + 1).saturating_mul(self.params.epoch_v2))
    }

    /// Height at which the epoch's random value is drawn.
    pub fn random_time(&self, epoch: Epoch) -> BeaconHeight {
        if epoch == 0 {
            return 0;
        }
        if epoch < self.breakpoint() {
            return (epoch - 1).saturating_mul(self.params.epoch) + self.params.random_time;
        }
        self.v1_end
            .saturating_add((epoch - self.breakpoint()).saturating_mul(self.params.epoch_v2))
            .saturating_add(self.params.random_time_v2)
    }

    /// `(from_start, to_end)` position of `height`.
    ///
    /// The two parts always add up to the length of the epoch containing
    /// `height + 1`; they differ from `epoch_length(height)` only at
    /// `height == v1_end`, the last pre-breakpoint height.
    pub fn block_order_in_epoch(&self, height: BeaconHeight) -> (u64, u64) {
        if height < self.v1_end {
            let order = height % self.params.epoch;
            return (order, self.params.epoch - order);
        }
        let order = (height - self.v1_end) % self.params.epoch_v2;
        (order, self.params.epoch_v2 - order)
    }

    /// True when `height` opens its epoch.
    pub fn is_first_height_in_epoch(&self, height: BeaconHeight) -> bool {
        height != 0 && height == self.first_height(self.epoch_of(height))
    }

    /// True when `height` closes its epoch.
    pub fn is_last_height_in_epoch(&self, height: BeaconHeight) -> bool {
        height != 0 && height == self.last_height(self.epoch_of(height))
    }

    /// True once `height` is past its epoch's random time.
    pub fn is_greater_than_random_time(&self, height: BeaconHeight) -> bool {
        height > self.random_time(self.epoch_of(height))
    }

    /// True when `height` is its epoch's random time.
    pub fn is_equal_to_random_time(&self, height: BeaconHeight) -> bool {
        height != 0 && height == self.random_time(self.epoch_of(height))
    }

    /// Epoch of `height + 1` and whether it opens that epoch.
    pub fn next_height_info(&self, height: BeaconHeight) -> (Epoch, bool) {
        let next = height.saturating_add(1);
        (self.epoch_of(next), self.is_first_height_in_epoch(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> EpochCalculator {
        EpochCalculator::new(EpochParams::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = EpochParams {
            epoch_v2: 0,
            ..EpochParams::default()
        };
        assert!(EpochCalculator::new(params).is_err());
    }

    #[test]
    fn test_epoch_of() {
        let c = calc();
        assert_eq!(c.epoch_of(0), 0);
        assert_eq!(c.epoch_of(1), 1);
        assert_eq!(c.epoch_of(100), 1);
        assert_eq!(c.epoch_of(101), 2);
        assert_eq!(c.epoch_of(299), 3);
        assert_eq!(c.epoch_of(300), 3);
        assert_eq!(c.epoch_of(301), 4);
        assert_eq!(c.epoch_of(650), 4);
        assert_eq!(c.epoch_of(651), 5);
        assert_eq!(c.epoch_of(1000), 5);
        assert_eq!(c.epoch_of(1001), 6);
    }

    #[test]
    fn test_epoch_length() {
        let c = calc();
        assert_eq!(c.epoch_length(299), 100);
        assert_eq!(c.epoch_length(300), 100);
        assert_eq!(c.epoch_length(301), 350);
        assert_eq!(c.epoch_length(5000), 350);
    }

    #[test]
    fn test_first_and_last_height() {
        let c = calc();
        assert_eq!(c.first_height(2), 101);
        assert_eq!(c.first_height(4), 301);
        assert_eq!(c.first_height(5), 651);
        assert_eq!(c.last_height(2), 200);
        assert_eq!(c.last_height(3), 300);
        assert_eq!(c.last_height(4), 650);
        assert_eq!(c.last_height(5), 1000);
        assert_eq!(c.first_height(0), 0);
        assert_eq!(c.last_height(0), 0);
    }

    #[test]
    fn test_first_height_far_breakpoint() {
        let c = EpochCalculator::new(EpochParams {
            epoch: 10,
            epoch_v2: 20,
            epoch_v2_breakpoint: 999,
            random_time: 5,
            random_time_v2: 10,
        })
        .unwrap();
        assert_eq!(c.first_height(999), 9981);
        assert_eq!(c.last_height(998), 9980);
        assert_eq!(c.epoch_of(9981), 999);
    }

    #[test]
    fn test_random_time() {
        let c = calc();
        assert_eq!(c.random_time(2), 150);
        assert_eq!(c.random_time(3), 250);
        assert_eq!(c.random_time(4), 475);
        assert_eq!(c.random_time(5), 825);
    }

    #[test]
    fn test_block_order_in_epoch() {
        let c = calc();
        assert_eq!(c.block_order_in_epoch(170), (70, 30));
        assert_eq!(c.block_order_in_epoch(264), (64, 36));
        assert_eq!(c.block_order_in_epoch(300), (0, 350));
        assert_eq!(c.block_order_in_epoch(301), (1, 349));
        assert_eq!(c.block_order_in_epoch(402), (102, 248));
        assert_eq!(c.block_order_in_epoch(734), (84, 266));
        assert_eq!(c.block_order_in_epoch(888), (238, 112));
    }

    #[test]
    fn test_first_height_predicate() {
        let c = calc();
        assert!(!c.is_first_height_in_epoch(0));
        assert!(c.is_first_height_in_epoch(1));
        assert!(!c.is_first_height_in_epoch(100));
        assert!(c.is_first_height_in_epoch(101));
        assert!(!c.is_first_height_in_epoch(300));
        assert!(c.is_first_height_in_epoch(301));
        assert!(c.is_first_height_in_epoch(651));
        assert!(c.is_first_height_in_epoch(1001));
    }

    #[test]
    fn test_last_height_predicate() {
        let c = calc();
        assert!(c.is_last_height_in_epoch(100));
        assert!(c.is_last_height_in_epoch(300));
        assert!(!c.is_last_height_in_epoch(350));
        assert!(c.is_last_height_in_epoch(650));
        assert!(!c.is_last_height_in_epoch(0));
    }

    #[test]
    fn test_random_time_predicates() {
        let c = calc();
        assert!(!c.is_greater_than_random_time(150));
        assert!(c.is_greater_than_random_time(151));
        assert!(!c.is_greater_than_random_time(475));
        assert!(c.is_greater_than_random_time(476));
        assert!(!c.is_greater_than_random_time(734));
        assert!(c.is_greater_than_random_time(888));

        for h in [50, 150, 475, 825] {
            assert!(c.is_equal_to_random_time(h), "height {}", h);
        }
        assert!(!c.is_equal_to_random_time(476));
    }

    #[test]
    fn test_next_height_info() {
        let c = calc();
        assert_eq!(c.next_height_info(100), (2, true));
        assert_eq!(c.next_height_info(300), (4, true));
        assert_eq!(c.next_height_info(650), (5, true));
        assert_eq!(c.next_height_info(299), (3, false));
    }

    #[test]
    fn test_round_trip_and_order_conservation() {
        for params in [EpochParams::default(), EpochParams::for_testing()] {
            let c = EpochCalculator::new(params).unwrap();
            for h in 1..3_000u64 {
                let e = c.epoch_of(h);
                assert!(c.first_height(e) <= h && h <= c.last_height(e), "height {}", h);
                let (a, b) = c.block_order_in_epoch(h);
                assert_eq!(a + b, c.epoch_length(h + 1), "height {}", h);
                assert_eq!(c.epoch_of(c.last_height(e) + 1), e + 1);
            }
        }
    }

    #[test]
    fn test_contiguous_epochs() {
        let c = calc();
        for e in 1..20 {
            assert_eq!(c.last_height(e) + 1, c.first_height(e + 1));
            assert_eq!(c.last_height(e) - c.first_height(e) + 1, c.epoch_length(c.first_height(e)));
        }
    }
}
