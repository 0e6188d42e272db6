//! # Deposit Ledger
//!
//! One flag per address. Set when a fee unit is paid, cleared on refund.
//! A flag is never set twice without a clear in between.

use crate::domain::{Address, ElectionError, U256};
use std::collections::BTreeSet;

/// Deposit flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepositLedger {
    holders: BTreeSet<Address>,
}

impl DepositLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a paid fee unit.
    pub fn set(&mut self, address: Address) -> Result<(), ElectionError> {
        if !self.holders.insert(address) {
            return Err(ElectionError::DepositAlreadyHeld(address));
        }
        Ok(())
    }

    /// Clear a deposit ahead of paying it back.
    pub fn clear(&mut self, address: &Address) -> Result<(), ElectionError> {
        if !self.holders.remove(address) {
            return Err(ElectionError::NoDeposit(*address));
        }
        Ok(())
    }

    /// Is a fee unit held for `address`?
    pub fn has_deposit(&self, address: &Address) -> bool {
        self.holders.contains(address)
    }

    /// Addresses with a held deposit.
    pub fn holders(&self) -> impl Iterator<Item = &Address> {
        self.holders.iter()
    }

    /// Funds owed back at `fee` per held deposit.
    pub fn held_total(&self, fee: U256) -> U256 {
        fee.saturating_mul(U256::from(self.holders.len()))
    }
}
