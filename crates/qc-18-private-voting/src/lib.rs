//! # QC-18 Private Voting
//!
//! Phase-gated private election whose every transition is checked by an
//! external zero-knowledge proof verifier.
//!
//! **Subsystem ID:** 18
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Coordinate an election through five time windows:
//! - Registration: the aggregator proves the set of voting keys
//! - Confirmation: each voter binds their key and posts a deposit
//! - Casting: the aggregator proves every encrypted vote is well formed
//! - Tallying: the aggregator proves the claimed result
//! - Refund: deposits are returned
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | Exactly-once transitions | Guard 0..=4, advanced one step by one function |
//! | Strict ordering | Ascending phase markers checked at deployment |
//! | All-or-nothing | Every check precedes the first mutation |
//! | Injective key binding | Key to owner map in the registry |
//! | Consistent deposits | Staged cast commit, flag cleared before payout |
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-private-voting/
//! ├── domain/          # Value objects, entities, config, errors, invariants
//! ├── algorithms/      # Time windows, registry, ledger, staged cast commit
//! ├── gateway/         # Verifier wire codec and typed client
//! ├── ports/           # ElectionApi, VerifierTransport, LogicalClock, PayoutPort
//! ├── adapters/        # ManualClock, InMemoryTreasury, ScriptedVerifier
//! ├── events.rs        # Committed-state notifications
//! └── service.rs       # PhaseController
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod events;
pub mod gateway;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryTreasury, ManualClock, ScriptedVerifier, Verdicts, VerifierScript};
pub use algorithms::{
    CastDecision, DepositLedger, ElectionRecord, StagedCast, TimeWindowGuard, VoteAggregator,
    VoterRegistry,
};
pub use domain::{
    Address, CastOutput, ControllerStats, DeployParams, Digest, ElectionConfig, ElectionError,
    ElectionParameters, ElectionSnapshot, EncryptedVotesBlob, ErrorClass, GuardState, Timestamp,
    VerifierOp, VoterRecord, VotingKey, Window, U256,
};
pub use events::ElectionEvent;
pub use gateway::{CodecError, GatewayError, ProofGateway};
pub use ports::{ElectionApi, LogicalClock, PayoutError, PayoutPort, TransportError, VerifierTransport};
pub use service::{ControllerPorts, PhaseController};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem identifier.
pub const SUBSYSTEM_ID: u8 = 18;
