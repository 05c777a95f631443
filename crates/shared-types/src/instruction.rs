//! # Raw Beacon Instructions
//!
//! A beacon instruction is an ordered list of strings. Position 0 is either a
//! stringified numeric metadata type or one of the reserved action tags below.
//!
//! Reserved actions whose layout several crates depend on have their codec
//! here:
//!
//! ```text
//! beacon: ["swap", in_csv, out_csv, "beacon", punished_json]
//! shard:  ["swap", in_csv, out_csv, "shard", shard_id, punished_json]
//! stake:  ["stake", candidates_csv, "shard" | "beacon", ..]
//! assign: ["assign", candidates_csv, "shard", shard_id]
//! ```

use crate::entities::{Blacklist, ChainId, ShardId, ValidatorKey};
use crate::errors::InstructionError;

/// Raw instruction as carried in blocks.
pub type RawInstruction = Vec<String>;

/// Staking action tag.
pub const STAKE_ACTION: &str = "stake";
/// Committee swap action tag.
pub const SWAP_ACTION: &str = "swap";
/// Random beacon action tag.
pub const RANDOM_ACTION: &str = "random";
/// Candidate assignment action tag.
pub const ASSIGN_ACTION: &str = "assign";

/// Role field of a beacon swap.
pub const BEACON_ROLE: &str = "beacon";
/// Role field of a shard swap.
pub const SHARD_ROLE: &str = "shard";

const RESERVED_ACTIONS: [&str; 4] = [STAKE_ACTION, SWAP_ACTION, RANDOM_ACTION, ASSIGN_ACTION];

/// Returns true if `tag` is a reserved (non-metadata) action tag.
pub fn is_reserved_action(tag: &str) -> bool {
    RESERVED_ACTIONS.contains(&tag)
}

/// Decoded swap instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapInstruction {
    /// Validators entering the committee.
    pub swapped_in: Vec<ValidatorKey>,
    /// Validators leaving the committee.
    pub swapped_out: Vec<ValidatorKey>,
    /// Committee the swap applies to.
    pub chain: ChainId,
    /// Producers punished by this swap, with their punishment length.
    pub punished: Blacklist,
}

impl SwapInstruction {
    /// Encode into the raw on-chain layout.
    pub fn to_raw(&self) -> Result<RawInstruction, InstructionError> {
        let punished = serde_json::to_string(&self.punished)
            .map_err(|e| InstructionError::InvalidPayload(e.to_string()))?;

        let mut raw = vec![
            SWAP_ACTION.to_string(),
            self.swapped_in.join(","),
            self.swapped_out.join(","),
        ];
        match self.chain {
            ChainId::Beacon => raw.push(BEACON_ROLE.to_string()),
            ChainId::Shard(id) => {
                raw.push(SHARD_ROLE.to_string());
                raw.push(id.to_string());
            }
        }
        raw.push(punished);
        Ok(raw)
    }

    /// Decode a raw swap instruction.
    pub fn parse(raw: &[String]) -> Result<Self, InstructionError> {
        let tag = raw.first().ok_or(InstructionError::Empty)?;
        if tag != SWAP_ACTION {
            return Err(InstructionError::UnexpectedTag {
                expected: SWAP_ACTION.to_string(),
                got: tag.clone(),
            });
        }

        let role = raw.get(3).map(String::as_str);
        let (chain, payload) = match (raw.len(), role) {
            (5, Some(BEACON_ROLE)) => (ChainId::Beacon, &raw[4]),
            (6, Some(SHARD_ROLE)) => {
                let id: ShardId = raw[4]
                    .parse()
                    .map_err(|_| InstructionError::InvalidShardId(raw[4].clone()))?;
                (ChainId::Shard(id), &raw[5])
            }
            (len, role) => {
                return Err(InstructionError::MalformedSwap {
                    len,
                    role: role.map(str::to_string),
                })
            }
        };

        let punished = Self::parse_punished(payload)?;

        Ok(Self {
            swapped_in: split_csv(&raw[1]),
            swapped_out: split_csv(&raw[2]),
            chain,
            punished,
        })
    }

    /// Decode only the punishment payload of a swap instruction.
    pub fn parse_punished(payload: &str) -> Result<Blacklist, InstructionError> {
        if payload.is_empty() {
            return Ok(Blacklist::new());
        }
        serde_json::from_str(payload).map_err(|e| InstructionError::InvalidPayload(e.to_string()))
    }
}

/// Who a stake instruction registers candidates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakeRole {
    /// Shard committee candidates.
    Shard,
    /// Beacon committee candidates.
    Beacon,
}

/// Decoded stake instruction.
///
/// Fields after the role (transaction hashes, reward receivers) are not
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeInstruction {
    /// Staked candidate keys.
    pub candidates: Vec<ValidatorKey>,
    /// Committee kind the candidates wait for.
    pub role: StakeRole,
}

impl StakeInstruction {
    /// Encode as `["stake", candidates_csv, role]`.
    pub fn to_raw(&self) -> RawInstruction {
        let role = match self.role {
            StakeRole::Shard => SHARD_ROLE,
            StakeRole::Beacon => BEACON_ROLE,
        };
        vec![
            STAKE_ACTION.to_string(),
            self.candidates.join(","),
            role.to_string(),
        ]
    }

    /// Decode a raw stake instruction.
    pub fn parse(raw: &[String]) -> Result<Self, InstructionError> {
        expect_tag(raw, STAKE_ACTION)?;
        let role = match raw.get(2).map(String::as_str) {
            Some(SHARD_ROLE) => StakeRole::Shard,
            Some(BEACON_ROLE) => StakeRole::Beacon,
            other => {
                return Err(InstructionError::MalformedAction {
                    action: STAKE_ACTION,
                    len: raw.len(),
                    role: other.map(str::to_string),
                })
            }
        };
        Ok(Self {
            candidates: split_csv(&raw[1]),
            role,
        })
    }
}

/// Candidates routed to one shard's pending queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignInstruction {
    /// Candidates in assignment order.
    pub candidates: Vec<ValidatorKey>,
    /// Receiving shard.
    pub shard_id: ShardId,
}

impl AssignInstruction {
    /// Encode as `["assign", candidates_csv, "shard", shard_id]`.
    pub fn to_raw(&self) -> RawInstruction {
        vec![
            ASSIGN_ACTION.to_string(),
            self.candidates.join(","),
            SHARD_ROLE.to_string(),
            self.shard_id.to_string(),
        ]
    }

    /// Decode a raw assign instruction.
    pub fn parse(raw: &[String]) -> Result<Self, InstructionError> {
        expect_tag(raw, ASSIGN_ACTION)?;
        let role = raw.get(2).map(String::as_str);
        if raw.len() != 4 || role != Some(SHARD_ROLE) {
            return Err(InstructionError::MalformedAction {
                action: ASSIGN_ACTION,
                len: raw.len(),
                role: role.map(str::to_string),
            });
        }
        let shard_id: ShardId = raw[3]
            .parse()
            .map_err(|_| InstructionError::InvalidShardId(raw[3].clone()))?;
        Ok(Self {
            candidates: split_csv(&raw[1]),
            shard_id,
        })
    }
}

fn expect_tag(raw: &[String], action: &str) -> Result<(), InstructionError> {
    let tag = raw.first().ok_or(InstructionError::Empty)?;
    if tag != action {
        return Err(InstructionError::UnexpectedTag {
            expected: action.to_string(),
            got: tag.clone(),
        });
    }
    Ok(())
}

fn split_csv(field: &str) -> Vec<ValidatorKey> {
    if field.is_empty() {
        return Vec::new();
    }
    field.split(',').map(str::to_string).collect()
}
