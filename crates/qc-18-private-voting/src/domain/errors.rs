//! # Domain Errors
//!
//! Error types for Private Voting.
//!
//! Every variant belongs to exactly one [`ErrorClass`]; callers branch on the
//! class to decide whether to fix timing, authorization, or inputs before
//! resubmitting.

use super::value_objects::{Address, GuardState, Timestamp, Window, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Verifier operation names, used in error and log context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerifierOp {
    /// `check_generator`
    CheckGenerator,
    /// `verify_register`
    VerifyRegister,
    /// `verify_cast`
    VerifyCast,
    /// `verify_tally`
    VerifyTally,
}

impl fmt::Display for VerifierOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerifierOp::CheckGenerator => "check_generator",
            VerifierOp::VerifyRegister => "verify_register",
            VerifierOp::VerifyCast => "verify_cast",
            VerifierOp::VerifyTally => "verify_tally",
        };
        write!(f, "{name}")
    }
}

/// Failure taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Bad construction parameters; no election comes into existence.
    Configuration,
    /// Caller is not permitted to run the operation.
    Authorization,
    /// Wrong clock window or wrong guard value.
    Phase,
    /// Verifier transport failure or response of the wrong shape.
    Protocol,
    /// Verifier completed and reported the proof invalid.
    Validation,
    /// Operation conflicts with stored registry/ledger state.
    State,
}

/// Private voting error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElectionError {
    // ---- Configuration ----
    /// Phase markers are not strictly ascending.
    #[error("Phase markers not ascending: marker[{index}]={current} <= marker[{}]={previous}", .index - 1)]
    MarkersNotAscending {
        /// Index of the offending marker.
        index: usize,
        /// Value of the preceding marker.
        previous: Timestamp,
        /// Value of the offending marker.
        current: Timestamp,
    },

    /// A phase marker does not lie in the future.
    #[error("Phase marker {marker} is not after current clock {now}")]
    MarkerNotInFuture {
        /// Offending marker.
        marker: Timestamp,
        /// Clock at construction.
        now: Timestamp,
    },

    /// Deployment was not paid with exactly one fee unit.
    #[error("Incorrect deployment fee: expected {expected}, paid {paid}")]
    IncorrectDeploymentFee {
        /// Required fee.
        expected: U256,
        /// Value attached.
        paid: U256,
    },

    /// Registration digest is not 56 bytes.
    #[error("Malformed digest: expected 56 bytes, got {len}")]
    MalformedDigest {
        /// Supplied length.
        len: usize,
    },

    /// Verifier rejected the generator element.
    #[error("Invalid generator")]
    InvalidGenerator,

    /// Election configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ---- Authorization ----
    /// Aggregator-only operation invoked by someone else.
    #[error("Caller {caller} is not the aggregator")]
    NotAggregator {
        /// The rejected caller.
        caller: Address,
    },

    // ---- Phase ----
    /// Clock is outside the operation's window.
    #[error("Outside {window} window: now={now}, window=[{start}, {})", .end.map_or_else(|| "inf".to_string(), |e| e.to_string()))]
    OutsideWindow {
        /// Required window.
        window: Window,
        /// Current clock.
        now: Timestamp,
        /// Inclusive start.
        start: Timestamp,
        /// Exclusive end, `None` for the refund window.
        end: Option<Timestamp>,
    },

    /// Guard does not hold the value the operation requires.
    #[error("Wrong guard: expected {expected}, actual {actual}")]
    WrongGuard {
        /// Required guard.
        expected: GuardState,
        /// Stored guard.
        actual: GuardState,
    },

    // ---- Protocol ----
    /// The verifier call could not be executed.
    #[error("Verifier call {op} failed: {reason}")]
    VerifierUnavailable {
        /// Operation attempted.
        op: VerifierOp,
        /// Transport detail.
        reason: String,
    },

    /// The verifier answered with bytes that do not match the expected layout.
    #[error("Malformed {op} response: {reason}")]
    MalformedResponse {
        /// Operation attempted.
        op: VerifierOp,
        /// Decode detail.
        reason: String,
    },

    /// Cast verifier returned a different number of outputs than voters.
    #[error("Cast output length mismatch: expected {expected}, got {got}")]
    OutputLengthMismatch {
        /// Number of registered voters.
        expected: usize,
        /// Number of outputs returned.
        got: usize,
    },

    /// Cast proof is too short to carry the encrypted-vote region.
    #[error("Cast proof too short: need {required} bytes, got {actual}")]
    CastProofTooShort {
        /// Required length of the leading region.
        required: usize,
        /// Proof length.
        actual: usize,
    },

    /// Returning a deposit failed.
    #[error("Payout to {account} failed: {reason}")]
    PayoutFailed {
        /// Refund recipient.
        account: Address,
        /// Transfer detail.
        reason: String,
    },

    // ---- Validation ----
    /// Verifier reported the proof invalid.
    #[error("Proof rejected by {op}")]
    ProofRejected {
        /// Operation that rejected.
        op: VerifierOp,
    },

    /// One or more voters produced malformed encrypted votes.
    #[error("Cast rejected: {} invalid vote(s) at positions {positions:?}", .positions.len())]
    InvalidVotes {
        /// Canonical positions flagged 0x00.
        positions: Vec<u32>,
    },

    // ---- State ----
    /// Confirmation was not paid with exactly one fee unit.
    #[error("Incorrect fee: expected {expected}, paid {paid}")]
    IncorrectFee {
        /// Required fee.
        expected: U256,
        /// Value attached.
        paid: U256,
    },

    /// Caller has no pending partial key.
    #[error("No partial voting key registered for {0}")]
    NoPartialKey(Address),

    /// The caller's key is already bound.
    #[error("Voting key already bound to {owner}")]
    KeyAlreadyBound {
        /// Existing owner of the key.
        owner: Address,
    },

    /// Caller has no deposit to withdraw.
    #[error("No deposit held for {0}")]
    NoDeposit(Address),

    /// Deposit flag is already set.
    #[error("Deposit already held for {0}")]
    DepositAlreadyHeld(Address),

    /// The result has already been recorded.
    #[error("Result already recorded")]
    ResultAlreadyRecorded,

    /// The encrypted votes have already been stored.
    #[error("Encrypted votes already stored")]
    VotesAlreadyStored,
}

impl ElectionError {
    /// Taxonomy class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MarkersNotAscending { .. }
            | Self::MarkerNotInFuture { .. }
            | Self::IncorrectDeploymentFee { .. }
            | Self::MalformedDigest { .. }
            | Self::InvalidGenerator
            | Self::InvalidConfig(_) => ErrorClass::Configuration,
            Self::NotAggregator { .. } => ErrorClass::Authorization,
            Self::OutsideWindow { .. } | Self::WrongGuard { .. } => ErrorClass::Phase,
            Self::VerifierUnavailable { .. }
            | Self::MalformedResponse { .. }
            | Self::OutputLengthMismatch { .. }
            | Self::CastProofTooShort { .. }
            | Self::PayoutFailed { .. } => ErrorClass::Protocol,
            Self::ProofRejected { .. } | Self::InvalidVotes { .. } => ErrorClass::Validation,
            Self::IncorrectFee { .. }
            | Self::NoPartialKey(_)
            | Self::KeyAlreadyBound { .. }
            | Self::NoDeposit(_)
            | Self::DepositAlreadyHeld(_)
            | Self::ResultAlreadyRecorded
            | Self::VotesAlreadyStored => ErrorClass::State,
        }
    }
}
