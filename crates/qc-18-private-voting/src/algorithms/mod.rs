//! # Algorithms Module
//!
//! Phase timing, registry, deposits, and the staged cast commit.

pub mod aggregator;
pub mod ledger;
pub mod registry;
pub mod staged_commit;
pub mod time_window;

pub use aggregator::{ElectionRecord, VoteAggregator};
pub use ledger::DepositLedger;
pub use registry::VoterRegistry;
pub use staged_commit::{CastDecision, StageState, StagedCast};
pub use time_window::TimeWindowGuard;
