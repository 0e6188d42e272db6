//! # Outbound Ports
//!
//! Traits for external dependencies (verifier, clock, funds).

use crate::domain::{Address, Timestamp, U256};
use thiserror::Error;

/// Failure to execute a verifier call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No verifier answers at the address.
    #[error("Verifier unreachable at {0}")]
    Unreachable(Address),

    /// The verifier aborted execution.
    #[error("Verifier execution failed: {0}")]
    ExecutionFailed(String),
}

/// Failure to move funds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayoutError {
    /// Treasury cannot cover the transfer.
    #[error("Insufficient treasury balance: need {needed}, have {available}")]
    InsufficientBalance {
        /// Amount requested.
        needed: U256,
        /// Amount held.
        available: U256,
    },

    /// Recipient refused the transfer.
    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Stateless proof verifier - outbound port.
///
/// One synchronous call per operation; `input` is selector plus body.
pub trait VerifierTransport: Send + Sync {
    /// Run one verifier call and return the raw response.
    fn call(&self, verifier: &Address, input: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// Logical clock supplied by the host.
pub trait LogicalClock: Send + Sync {
    /// Current clock value.
    fn now(&self) -> Timestamp;
}

/// Funds movement - outbound port.
pub trait PayoutPort: Send + Sync {
    /// Accept a fee unit paid to the election.
    fn deposit(&self, from: &Address, amount: U256);

    /// Transfer `amount` back to `to`.
    fn transfer(&self, to: &Address, amount: U256) -> Result<(), PayoutError>;
}
