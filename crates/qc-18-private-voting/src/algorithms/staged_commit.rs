//! # Staged Cast Commit
//!
//! Two-phase commit for `cast_votes`. Every effect of a cast is staged
//! first; the batch is applied only when the proof is valid and every
//! per-voter output is 0x01. Otherwise the stage is dropped and nothing
//! changes.
//!
//! A 0x00 output stages a forfeit of that voter's deposit. Any staged
//! forfeit aborts the batch, so forfeits surface as the abort reason and
//! deposits are never touched by a cast.

use super::aggregator::VoteAggregator;
use crate::domain::{
    Address, CastOutput, ElectionError, EncryptedVotesBlob, GuardState, VerifierOp,
};

/// Staging state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageState {
    /// Collecting outputs.
    Pending,
    /// Every check passed.
    Prepared,
    /// Applied.
    Committed,
    /// Dropped.
    Aborted,
}

/// Outcome of [`StagedCast::decide`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CastDecision {
    /// Apply the batch.
    Commit,
    /// Drop the batch; the cast is invalid.
    Abort(ElectionError),
}

/// Effects of one cast, not yet applied.
#[derive(Clone, Debug)]
pub struct StagedCast {
    state: StageState,
    proof_valid: bool,
    forfeits: Vec<(u32, Address)>,
    blob: EncryptedVotesBlob,
    next_guard: GuardState,
}

impl StagedCast {
    /// Start a stage carrying the blob and the guard to advance to.
    pub fn new(proof_valid: bool, blob: EncryptedVotesBlob, next_guard: GuardState) -> Self {
        Self {
            state: StageState::Pending,
            proof_valid,
            forfeits: Vec::new(),
            blob,
            next_guard,
        }
    }

    /// Stage the per-voter outputs against the canonical voter list.
    pub fn stage_outputs(&mut self, voters: &[Address], outputs: &[CastOutput]) {
        for (position, (voter, output)) in voters.iter().zip(outputs).enumerate() {
            if !output.is_valid() {
                self.forfeits.push((position as u32, *voter));
            }
        }
    }

    /// Canonical positions staged for forfeit.
    pub fn invalid_positions(&self) -> Vec<u32> {
        self.forfeits.iter().map(|(p, _)| *p).collect()
    }

    /// Voters whose deposits the outputs would forfeit.
    pub fn forfeited_voters(&self) -> impl Iterator<Item = &Address> {
        self.forfeits.iter().map(|(_, voter)| voter)
    }

    /// Decide between commit and abort.
    pub fn decide(&mut self) -> CastDecision {
        if !self.forfeits.is_empty() {
            self.state = StageState::Aborted;
            return CastDecision::Abort(ElectionError::InvalidVotes {
                positions: self.invalid_positions(),
            });
        }
        if !self.proof_valid {
            self.state = StageState::Aborted;
            return CastDecision::Abort(ElectionError::ProofRejected {
                op: VerifierOp::VerifyCast,
            });
        }
        self.state = StageState::Prepared;
        CastDecision::Commit
    }

    /// Current state.
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Apply the stage. Returns the guard to install.
    ///
    /// An undecided stage is decided first; an aborted one yields its reason.
    pub fn commit(mut self, aggregator: &mut VoteAggregator) -> Result<GuardState, ElectionError> {
        if let CastDecision::Abort(reason) = self.decide() {
            return Err(reason);
        }
        aggregator.store(self.blob)?;
        self.state = StageState::Committed;
        Ok(self.next_guard)
    }
}
