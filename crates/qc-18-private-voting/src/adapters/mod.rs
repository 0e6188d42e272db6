//! # Adapters
//!
//! In-process implementations of the outbound ports.

pub mod clock;
pub mod treasury;
pub mod verifier;

pub use clock::ManualClock;
pub use treasury::InMemoryTreasury;
pub use verifier::{ScriptedVerifier, Verdicts, VerifierScript};
