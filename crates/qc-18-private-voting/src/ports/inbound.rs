//! # Inbound Ports
//!
//! API exposed by the election to callers.

use crate::domain::{Address, ElectionError, ElectionSnapshot, GuardState, U256};

/// Election API - inbound port.
///
/// Every operation is all-or-nothing: on `Err` no stored field has changed.
pub trait ElectionApi {
    /// Aggregator submits the registration proof (window 1, guard 1 to 2).
    ///
    /// Returns the number of key/address pairs recorded.
    fn register_voters(&mut self, caller: Address, proof: &[u8]) -> Result<u32, ElectionError>;

    /// A voter confirms their partial key, paying one fee unit (window 2).
    ///
    /// Returns the assigned canonical index.
    fn register_confirm(&mut self, caller: Address, value: U256) -> Result<u32, ElectionError>;

    /// Aggregator submits the cast proof (window 3, guard 2 to 3).
    fn cast_votes(&mut self, caller: Address, proof: &[u8]) -> Result<(), ElectionError>;

    /// Aggregator submits the claimed result (window 4, guard 3 to 4).
    fn vote_tallying(&mut self, caller: Address, claimed: u32) -> Result<(), ElectionError>;

    /// Return the caller's deposit (refund window).
    ///
    /// Returns the amount paid back.
    fn refund(&mut self, caller: Address) -> Result<U256, ElectionError>;

    /// Current guard.
    fn guard(&self) -> GuardState;

    /// Read-only view of every stored field.
    fn snapshot(&self) -> ElectionSnapshot;
}
