//! # Domain Entities
//!
//! Core entities for Private Voting.

use super::errors::{ElectionError, ErrorClass};
use super::value_objects::{
    Address, Digest, GuardState, Timestamp, VotingKey, BYTES_PER_VOTING_KEY, MARKER_COUNT, U256,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// Parameters fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionParameters {
    /// Five strictly ascending phase-boundary markers.
    pub markers: [Timestamp; MARKER_COUNT],
    /// Registration commitment digest.
    pub digest: Digest,
    /// Generator element checked by the verifier.
    pub generator: Vec<u8>,
    /// Party allowed to submit proofs and drive transitions.
    pub aggregator: Address,
}

/// Construction request, before validation.
#[derive(Clone, Debug)]
pub struct DeployParams {
    /// Phase markers.
    pub markers: [Timestamp; MARKER_COUNT],
    /// Digest bytes (must be 56).
    pub digest: Vec<u8>,
    /// Generator bytes (any length).
    pub generator: Vec<u8>,
}

/// Read-only view of one voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    /// Voter address.
    pub address: Address,
    /// Proven but unconfirmed key, if any.
    pub partial_key: Option<VotingKey>,
    /// Key bound to this address at confirmation.
    pub confirmed_key: Option<VotingKey>,
    /// Whether a fee unit is held for this address.
    pub deposit: bool,
    /// Canonical registration index.
    pub index: Option<u32>,
}

/// Encrypted votes copied from an accepted cast proof.
///
/// Layout: 4-byte little-endian count, then `count` 96-byte encrypted votes.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVotesBlob(#[serde_as(as = "Bytes")] Vec<u8>);

impl EncryptedVotesBlob {
    /// Length of the blob for `num_voters` voters.
    #[must_use]
    pub const fn expected_len(num_voters: usize) -> usize {
        4 + BYTES_PER_VOTING_KEY * num_voters
    }

    /// Copies the leading region of `proof` for `num_voters` voters.
    pub fn from_proof(proof: &[u8], num_voters: usize) -> Result<Self, ElectionError> {
        let required = Self::expected_len(num_voters);
        let region = proof
            .get(..required)
            .ok_or(ElectionError::CastProofTooShort {
                required,
                actual: proof.len(),
            })?;
        Ok(Self(region.to_vec()))
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Blob length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a stored blob (the header is mandatory).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for EncryptedVotesBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedVotesBlob({} bytes)", self.0.len())
    }
}

/// Read-only view of every stored field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSnapshot {
    /// Construction parameters.
    pub parameters: ElectionParameters,
    /// Protocol guard.
    pub guard: GuardState,
    /// Every address with a partial key, confirmed key, or deposit, by address.
    pub voters: Vec<VoterRecord>,
    /// Confirmed voters in canonical order.
    pub registered_addrs: Vec<Address>,
    /// Stored encrypted votes.
    pub encrypted_votes: Option<EncryptedVotesBlob>,
    /// Recorded result.
    pub result: Option<u32>,
    /// Funds owed back to current deposit holders.
    pub deposits_held: U256,
}

impl ElectionSnapshot {
    /// Pretty JSON export.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Operation counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStats {
    /// Operations that committed.
    pub committed: u64,
    /// Rejected by authorization.
    pub rejected_authorization: u64,
    /// Rejected by window or guard.
    pub rejected_phase: u64,
    /// Verifier or payout failures.
    pub rejected_protocol: u64,
    /// Verifier reported invalid.
    pub rejected_validation: u64,
    /// Conflicts with stored state.
    pub rejected_state: u64,
    /// Configuration failures after deployment (none expected).
    pub rejected_configuration: u64,
}

impl ControllerStats {
    /// Count a rejection.
    pub fn record_rejection(&mut self, class: ErrorClass) {
        let counter = match class {
            ErrorClass::Configuration => &mut self.rejected_configuration,
            ErrorClass::Authorization => &mut self.rejected_authorization,
            ErrorClass::Phase => &mut self.rejected_phase,
            ErrorClass::Protocol => &mut self.rejected_protocol,
            ErrorClass::Validation => &mut self.rejected_validation,
            ErrorClass::State => &mut self.rejected_state,
        };
        *counter += 1;
    }

    /// Rejections in `class`.
    pub fn rejections(&self, class: ErrorClass) -> u64 {
        match class {
            ErrorClass::Configuration => self.rejected_configuration,
            ErrorClass::Authorization => self.rejected_authorization,
            ErrorClass::Phase => self.rejected_phase,
            ErrorClass::Protocol => self.rejected_protocol,
            ErrorClass::Validation => self.rejected_validation,
            ErrorClass::State => self.rejected_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_expected_len() {
        assert_eq!(EncryptedVotesBlob::expected_len(0), 4);
        assert_eq!(EncryptedVotesBlob::expected_len(2), 196);
    }

    #[test]
    fn test_blob_takes_leading_region_only() {
        let mut proof = vec![0xAAu8; 196];
        proof.extend_from_slice(&[0xBBu8; 50]);
        let blob = EncryptedVotesBlob::from_proof(&proof, 2).unwrap();
        assert_eq!(blob.len(), 196);
        assert!(blob.as_bytes().iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_blob_short_proof_rejected() {
        assert!(EncryptedVotesBlob::from_proof(&[0u8; 100], 1).is_ok());
        let result = EncryptedVotesBlob::from_proof(&[0u8; 99], 1);
        assert!(matches!(
            result,
            Err(ElectionError::CastProofTooShort {
                required: 100,
                actual: 99
            })
        ));
    }

    #[test]
    fn test_stats_count_by_class() {
        let mut stats = ControllerStats::default();
        stats.record_rejection(ErrorClass::Phase);
        stats.record_rejection(ErrorClass::Phase);
        stats.record_rejection(ErrorClass::Validation);
        assert_eq!(stats.rejections(ErrorClass::Phase), 2);
        assert_eq!(stats.rejections(ErrorClass::Validation), 1);
        assert_eq!(stats.rejections(ErrorClass::State), 0);
    }
}
