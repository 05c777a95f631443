//! # Error Types
//!
//! Errors raised while decoding raw beacon instructions.

use thiserror::Error;

/// Structural errors in a raw instruction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstructionError {
    /// Instruction has no fields at all.
    #[error("Empty instruction")]
    Empty,

    /// Expected a different action tag in position 0.
    #[error("Unexpected action tag: expected {expected}, got {got}")]
    UnexpectedTag {
        /// Tag the decoder was asked for.
        expected: String,
        /// Tag found in the instruction.
        got: String,
    },

    /// Swap instruction has neither the beacon nor the shard shape.
    #[error("Malformed swap instruction: {len} fields, role {role:?}")]
    MalformedSwap {
        /// Number of fields found.
        len: usize,
        /// Role field (position 3) if present.
        role: Option<String>,
    },

    /// Reserved action with the wrong number of fields or an unknown role.
    #[error("Malformed {action} instruction: {len} fields, role {role:?}")]
    MalformedAction {
        /// Action tag.
        action: &'static str,
        /// Number of fields found.
        len: usize,
        /// Role field (position 2) if present.
        role: Option<String>,
    },

    /// Shard id field is not a number in 0..=255.
    #[error("Invalid shard id: {0}")]
    InvalidShardId(String),

    /// Payload could not be decoded.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_swap_message() {
        let err = InstructionError::MalformedSwap {
            len: 3,
            role: Some("moon".to_string()),
        };
        assert!(err.to_string().contains("3 fields"));
        assert!(err.to_string().contains("moon"));
    }

    #[test]
    fn test_invalid_shard_id_message() {
        let err = InstructionError::InvalidShardId("300".to_string());
        assert!(err.to_string().contains("300"));
    }
}
