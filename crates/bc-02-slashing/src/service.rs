//! Producer blacklist ledger.
//!
//! Per beacon block: load the blacklist stored at `height - 1`, decay it if
//! the block closes an epoch, merge the block's swap punishments, then write
//! deletions and the new snapshot as one batch. Nothing is written when any
//! step fails.

use crate::algorithms::{collect_punishments, decay_epoch, merge_max, releases};
use crate::domain::{BlacklistBatch, BlacklistStats, BlacklistUpdate, SlashingError};
use crate::ports::{BlacklistLedgerApi, BlacklistStore};
use bc_01_committee::EpochCalculator;
use parking_lot::{Mutex, RwLock};
use shared_types::{BeaconHeight, Blacklist, RawInstruction};
use std::sync::Arc;
use tracing::{debug, info};

struct LedgerState {
    current: Blacklist,
    last_height: Option<BeaconHeight>,
    stats: BlacklistStats,
}

/// Blacklist ledger over a [`BlacklistStore`].
pub struct ProducerBlacklistLedger<S: BlacklistStore> {
    store: Arc<S>,
    epochs: EpochCalculator,
    state: Mutex<LedgerState>,
    snapshot: RwLock<Blacklist>,
}

impl<S: BlacklistStore> ProducerBlacklistLedger<S> {
    /// Create a ledger. The first processed block may have any height.
    pub fn new(store: Arc<S>, epochs: EpochCalculator) -> Self {
        Self {
            store,
            epochs,
            state: Mutex::new(LedgerState {
                current: Blacklist::new(),
                last_height: None,
                stats: BlacklistStats::default(),
            }),
            snapshot: RwLock::new(Blacklist::new()),
        }
    }

    /// Epoch arithmetic in use.
    pub fn epochs(&self) -> &EpochCalculator {
        &self.epochs
    }

    /// Height of the last applied block.
    pub fn last_height(&self) -> Option<BeaconHeight> {
        self.state.lock().last_height
    }

    /// Compute the update for `height` without writing anything.
    pub fn prepare(
        &self,
        height: BeaconHeight,
        instructions: &[RawInstruction],
    ) -> Result<BlacklistUpdate, SlashingError> {
        let state = self.state.lock();
        self.compute(&state, height, instructions)
    }

    /// Write a prepared update to the store.
    ///
    /// The batch replaces the snapshot at `update.height`, so writing the same
    /// update again leaves the store unchanged.
    pub fn persist(&self, update: &BlacklistUpdate) -> Result<(), SlashingError> {
        self.store.apply(BlacklistBatch {
            height: update.height,
            delete: update.deleted.clone(),
            blacklist: update.blacklist.clone(),
        })
    }

    /// Advance the in-memory ledger past a persisted update.
    pub fn record(&self, update: &BlacklistUpdate) -> Result<(), SlashingError> {
        let mut state = self.state.lock();
        check_order(&state, update.height)?;
        self.advance(&mut state, update);
        Ok(())
    }

    fn compute(
        &self,
        state: &LedgerState,
        height: BeaconHeight,
        instructions: &[RawInstruction],
    ) -> Result<BlacklistUpdate, SlashingError> {
        check_order(state, height)?;

        let mut blacklist = self.store.load(height - 1)?.unwrap_or_default();

        let epoch_closed = self.epochs.is_last_height_in_epoch(height);
        let finished = if epoch_closed {
            decay_epoch(&mut blacklist)
        } else {
            Vec::new()
        };

        let punished = collect_punishments(instructions)?;
        merge_max(&mut blacklist, &punished);
        let deleted = releases(&finished, &blacklist);

        Ok(BlacklistUpdate {
            height,
            epoch_closed,
            finished,
            deleted,
            punished,
            blacklist,
        })
    }

    fn advance(&self, state: &mut LedgerState, update: &BlacklistUpdate) {
        state.current = update.blacklist.clone();
        state.last_height = Some(update.height);
        state.stats.blocks_processed += 1;
        state.stats.punishments_recorded += update.punished.len() as u64;
        state.stats.releases += update.deleted.len() as u64;
        state.stats.current_size = update.blacklist.len();
        if update.epoch_closed {
            state.stats.epochs_closed += 1;
        }
        *self.snapshot.write() = update.blacklist.clone();

        if update.punished.is_empty() && update.deleted.is_empty() {
            debug!(height = update.height, size = update.blacklist.len(), "Blacklist unchanged");
        } else {
            info!(
                height = update.height,
                epoch_closed = update.epoch_closed,
                punished = update.punished.len(),
                released = update.deleted.len(),
                size = update.blacklist.len(),
                "Blacklist updated"
            );
        }
    }
}

fn check_order(state: &LedgerState, height: BeaconHeight) -> Result<(), SlashingError> {
    if height == 0 {
        return Err(SlashingError::GenesisHeight);
    }
    match state.last_height {
        Some(last) if height != last + 1 => Err(SlashingError::OutOfOrder {
            expected: last + 1,
            got: height,
        }),
        _ => Ok(()),
    }
}

impl<S: BlacklistStore> BlacklistLedgerApi for ProducerBlacklistLedger<S> {
    fn process_block(
        &self,
        height: BeaconHeight,
        instructions: &[RawInstruction],
    ) -> Result<BlacklistUpdate, SlashingError> {
        let mut state = self.state.lock();
        let update = self.compute(&state, height, instructions)?;
        self.persist(&update)?;
        self.advance(&mut state, &update);
        Ok(update)
    }

    fn current(&self) -> Blacklist {
        self.snapshot.read().clone()
    }

    fn stats(&self) -> BlacklistStats {
        self.state.lock().stats.clone()
    }
}
