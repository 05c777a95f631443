//! # Outbound Ports
//!
//! The verifier treats transactions as opaque: proofs, signatures and
//! chain rules live behind [`Transaction`]. It only orchestrates the calls
//! and scans the coins the proofs expose.

use crate::domain::{OutputCoin, Proof, TxCheckError, TxHash, VerificationStage};
use parking_lot::Mutex;
use shared_types::{BeaconHeight, Hash, ShardId};
use std::sync::Arc;
use std::time::Duration;

/// Read access to a shard's transaction state.
pub trait TransactionStateDb: Send + Sync {
    /// Commitment is stored.
    fn has_commitment(&self, commitment: &Hash) -> bool;

    /// Serial number was already spent.
    fn has_serial_number(&self, serial: &Hash) -> bool;

    /// Output coin already exists.
    fn has_output_coin(&self, coin_id: &Hash) -> bool;
}

/// Chain-wide lookups.
pub trait ChainRetriever: Send + Sync {
    /// Key belongs to a burning address.
    fn is_burning_address(&self, public_key: &[u8]) -> bool;
}

/// The shard the batch is built for.
pub trait ShardView: Send + Sync {
    /// Shard id.
    fn shard_id(&self) -> ShardId;

    /// Beacon height the shard last confirmed.
    fn beacon_height(&self) -> BeaconHeight;

    /// Private copy of the transaction state DB. Every reader gets its own.
    fn copied_state_db(&self) -> Arc<dyn TransactionStateDb>;
}

/// Beacon chain tip.
pub trait BeaconView: Send + Sync {
    /// Beacon height.
    fn height(&self) -> BeaconHeight;
}

/// Transaction pool.
pub trait TransactionPool: Send + Sync {
    /// The pool already fully validated this transaction.
    fn is_validated(&self, tx_hash: &TxHash) -> bool;
}

/// Views handed to chain-state checks.
pub struct ChainContext<'a> {
    /// Chain lookups.
    pub chain: &'a dyn ChainRetriever,
    /// Target shard.
    pub shard: &'a dyn ShardView,
    /// Beacon tip.
    pub beacon: &'a dyn BeaconView,
    /// Beacon height the shard block builds on.
    pub beacon_height: BeaconHeight,
}

/// A transaction as the verifier sees it.
pub trait Transaction: Send + Sync {
    /// Transaction hash.
    fn hash(&self) -> TxHash;

    /// Main proof, if any.
    fn proof(&self) -> Option<&Proof>;

    /// Inner proof of a token transaction.
    fn token_proof(&self) -> Option<&Proof> {
        None
    }

    /// Committee key for stake, unstake and stop-auto-stake transactions.
    fn staking_key(&self) -> Option<&str> {
        None
    }

    /// Load the commitments the proof refers to.
    fn load_commitment(&self, db: &dyn TransactionStateDb) -> Result<(), TxCheckError>;

    /// Check the signature.
    fn verify_signature(&self) -> Result<(), TxCheckError>;

    /// Chain-independent sanity.
    fn validate_sanity(&self) -> Result<(), TxCheckError>;

    /// Proof correctness.
    fn validate_correctness(&self, db: &dyn TransactionStateDb) -> Result<(), TxCheckError>;

    /// Sanity against the chain, including metadata rules.
    fn validate_with_chain(&self, ctx: &ChainContext<'_>) -> Result<(), TxCheckError>;

    /// Inputs not already spent in stored state.
    fn validate_double_spend_with_chain(
        &self,
        db: &dyn TransactionStateDb,
    ) -> Result<(), TxCheckError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Transaction with scripted behaviour that records which stages ran.
///
/// Chain-state double spend and commitment loading consult the state DB,
/// everything else passes unless `fail_at` names the stage.
#[derive(Clone, Default)]
pub struct MockTransaction {
    /// Hash.
    pub hash: TxHash,
    /// Main proof.
    pub proof: Option<Proof>,
    /// Token proof.
    pub token_proof: Option<Proof>,
    /// Committee key for staking transactions.
    pub staking_key: Option<String>,
    /// Commitments that must exist in the state DB.
    pub commitments: Vec<Hash>,
    /// Stage that reports failure.
    pub fail_at: Option<VerificationStage>,
    /// Time every stage takes.
    pub delay: Option<Duration>,
    calls: Arc<Mutex<Vec<VerificationStage>>>,
}

impl MockTransaction {
    /// Transaction whose hash is `id` repeated.
    pub fn new(id: u8) -> Self {
        Self {
            hash: [id; 32],
            ..Self::default()
        }
    }

    /// Spend these serial numbers.
    pub fn spending(mut self, serials: &[u8]) -> Self {
        self.proof.get_or_insert_with(Proof::default).input_serials =
            serials.iter().map(|s| [*s; 32]).collect();
        self
    }

    /// Create these coins for `public_key`.
    pub fn creating(mut self, coins: &[u8], public_key: &[u8]) -> Self {
        self.proof.get_or_insert_with(Proof::default).output_coins = coins
            .iter()
            .map(|c| OutputCoin {
                coin_id: [*c; 32],
                public_key: public_key.to_vec(),
            })
            .collect();
        self
    }

    /// Attach an inner token proof.
    pub fn with_token_proof(mut self, proof: Proof) -> Self {
        self.token_proof = Some(proof);
        self
    }

    /// Mark as a staking transaction.
    pub fn staking(mut self, key: &str) -> Self {
        self.staking_key = Some(key.to_string());
        self
    }

    /// Require commitments to be present.
    pub fn requiring(mut self, commitments: &[u8]) -> Self {
        self.commitments = commitments.iter().map(|c| [*c; 32]).collect();
        self
    }

    /// Fail at `stage`.
    pub fn failing_at(mut self, stage: VerificationStage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Sleep in every stage.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Stages run so far, in order.
    pub fn calls(&self) -> Vec<VerificationStage> {
        self.calls.lock().clone()
    }

    fn enter(&self, stage: VerificationStage, failure: TxCheckError) -> Result<(), TxCheckError> {
        self.calls.lock().push(stage);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_at == Some(stage) {
            return Err(failure);
        }
        Ok(())
    }
}

impl Transaction for MockTransaction {
    fn hash(&self) -> TxHash {
        self.hash
    }

    fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    fn token_proof(&self) -> Option<&Proof> {
        self.token_proof.as_ref()
    }

    fn staking_key(&self) -> Option<&str> {
        self.staking_key.as_deref()
    }

    fn load_commitment(&self, db: &dyn TransactionStateDb) -> Result<(), TxCheckError> {
        self.enter(
            VerificationStage::Commitment,
            TxCheckError::MissingCommitment("scripted".into()),
        )?;
        match self.commitments.iter().find(|c| !db.has_commitment(c)) {
            Some(missing) => Err(TxCheckError::MissingCommitment(hex::encode(missing))),
            None => Ok(()),
        }
    }

    fn verify_signature(&self) -> Result<(), TxCheckError> {
        self.enter(VerificationStage::Signature, TxCheckError::InvalidSignature)
    }

    fn validate_sanity(&self) -> Result<(), TxCheckError> {
        self.enter(
            VerificationStage::Sanity,
            TxCheckError::Sanity("scripted".into()),
        )
    }

    fn validate_correctness(&self, _db: &dyn TransactionStateDb) -> Result<(), TxCheckError> {
        Ok(())
    }

    fn validate_with_chain(&self, _ctx: &ChainContext<'_>) -> Result<(), TxCheckError> {
        self.enter(
            VerificationStage::ChainState,
            TxCheckError::ChainState("scripted".into()),
        )
    }

    fn validate_double_spend_with_chain(
        &self,
        db: &dyn TransactionStateDb,
    ) -> Result<(), TxCheckError> {
        let spent = self
            .proof
            .iter()
            .chain(self.token_proof.iter())
            .flat_map(|p| p.input_serials.iter())
            .any(|s| db.has_serial_number(s));
        if spent {
            return Err(TxCheckError::SpentOnChain);
        }
        Ok(())
    }
}

/// Chain retriever with a fixed set of burning keys.
#[derive(Clone, Default)]
pub struct MockChainRetriever {
    /// Burning address public keys.
    pub burning_keys: Vec<Vec<u8>>,
}

impl ChainRetriever for MockChainRetriever {
    fn is_burning_address(&self, public_key: &[u8]) -> bool {
        self.burning_keys.iter().any(|k| k.as_slice() == public_key)
    }
}

/// Beacon view at a fixed height.
#[derive(Clone, Copy, Default)]
pub struct MockBeaconView {
    /// Beacon height.
    pub height: BeaconHeight,
}

impl BeaconView for MockBeaconView {
    fn height(&self) -> BeaconHeight {
        self.height
    }
}
