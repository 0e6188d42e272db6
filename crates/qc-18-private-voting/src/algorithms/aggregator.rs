//! # Vote Aggregator and Election Record
//!
//! Key buffer for cast verification, and the two write-once outputs of the
//! election: the encrypted-vote blob and the tally result.

use super::registry::VoterRegistry;
use crate::domain::{ElectionError, EncryptedVotesBlob, VotingKey};

/// Holds the accepted encrypted votes.
#[derive(Clone, Debug, Default)]
pub struct VoteAggregator {
    blob: Option<EncryptedVotesBlob>,
}

impl VoteAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys of every confirmed voter, in canonical order.
    ///
    /// Always read from the registry, never from the caller.
    pub fn key_buffer(registry: &VoterRegistry) -> Vec<VotingKey> {
        registry.ordered_keys()
    }

    /// Store the blob. Fails if one is already stored.
    pub fn store(&mut self, blob: EncryptedVotesBlob) -> Result<(), ElectionError> {
        if self.blob.is_some() {
            return Err(ElectionError::VotesAlreadyStored);
        }
        self.blob = Some(blob);
        Ok(())
    }

    /// Stored blob.
    pub fn blob(&self) -> Option<&EncryptedVotesBlob> {
        self.blob.as_ref()
    }
}

/// Write-once final result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElectionRecord {
    result: Option<u32>,
}

impl ElectionRecord {
    /// Record the result.
    pub fn record(&mut self, result: u32) -> Result<(), ElectionError> {
        if self.result.is_some() {
            return Err(ElectionError::ResultAlreadyRecorded);
        }
        self.result = Some(result);
        Ok(())
    }

    /// Recorded result.
    pub fn result(&self) -> Option<u32> {
        self.result
    }
}
