//! # Punishment Decay
//!
//! At an epoch boundary every entry loses one epoch. Entries reaching zero
//! are finished. Punishments from swap instructions are merged afterwards,
//! keeping the larger count, so a finished validator punished again in the
//! same block stays listed and is never released.

use crate::domain::SlashingError;
use shared_types::{Blacklist, RawInstruction, SwapInstruction, ValidatorKey, SWAP_ACTION};

/// Decrement every entry, returning the finished validators in key order.
pub fn decay_epoch(blacklist: &mut Blacklist) -> Vec<ValidatorKey> {
    let mut finished = Vec::new();
    blacklist.retain(|validator, epochs| {
        *epochs = epochs.saturating_sub(1);
        if *epochs == 0 {
            finished.push(validator.clone());
            false
        } else {
            true
        }
    });
    finished
}

/// Punishments carried by every swap instruction of a block.
///
/// Other instructions are ignored. The first malformed swap fails the block.
pub fn collect_punishments(instructions: &[RawInstruction]) -> Result<Blacklist, SlashingError> {
    let mut punished = Blacklist::new();
    for (index, raw) in instructions.iter().enumerate() {
        if raw.first().map(String::as_str) != Some(SWAP_ACTION) {
            continue;
        }
        let swap = SwapInstruction::parse(raw)
            .map_err(|source| SlashingError::MalformedSwap { index, source })?;
        merge_max(&mut punished, &swap.punished);
    }
    Ok(punished)
}

/// Merge `incoming` into `blacklist`, keeping the larger count.
pub fn merge_max(blacklist: &mut Blacklist, incoming: &Blacklist) {
    for (validator, epochs) in incoming {
        let entry = blacklist.entry(validator.clone()).or_insert(0);
        *entry = (*entry).max(*epochs);
    }
}

/// Finished validators absent from the merged blacklist.
pub fn releases(finished: &[ValidatorKey], merged: &Blacklist) -> Vec<ValidatorKey> {
    finished
        .iter()
        .filter(|v| !merged.contains_key(*v))
        .cloned()
        .collect()
}
