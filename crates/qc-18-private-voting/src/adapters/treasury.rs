//! In-Memory Treasury Adapter
//!
//! Implements `PayoutPort`. Holds paid fees and records payouts per account.

use crate::domain::{Address, U256};
use crate::ports::outbound::{PayoutError, PayoutPort};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Treasury for tests and single-process hosts.
#[derive(Default)]
pub struct InMemoryTreasury {
    balance: RwLock<U256>,
    paid_out: RwLock<HashMap<Address, U256>>,
    rejecting: RwLock<bool>,
}

impl InMemoryTreasury {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following transfer fail (or succeed again).
    pub fn set_rejecting(&self, rejecting: bool) {
        *self.rejecting.write() = rejecting;
    }

    /// Funds currently held.
    pub fn balance(&self) -> U256 {
        *self.balance.read()
    }

    /// Total paid out to `account`.
    pub fn paid_to(&self, account: &Address) -> U256 {
        self.paid_out
            .read()
            .get(account)
            .copied()
            .unwrap_or_default()
    }
}

impl PayoutPort for InMemoryTreasury {
    fn deposit(&self, from: &Address, amount: U256) {
        debug!("[qc-18] Treasury received {} from {}", amount, from);
        let mut balance = self.balance.write();
        *balance = balance.saturating_add(amount);
    }

    fn transfer(&self, to: &Address, amount: U256) -> Result<(), PayoutError> {
        if *self.rejecting.read() {
            warn!("[qc-18] Treasury rejecting transfer to {}", to);
            return Err(PayoutError::Rejected(format!("recipient {to} refused")));
        }

        let mut balance = self.balance.write();
        if *balance < amount {
            return Err(PayoutError::InsufficientBalance {
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;

        let mut paid = self.paid_out.write();
        let entry = paid.entry(*to).or_default();
        *entry = entry.saturating_add(amount);
        debug!("[qc-18] Treasury paid {} to {}", amount, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_then_transfer() {
        let t = InMemoryTreasury::new();
        let a = Address::new([1; 20]);
        t.deposit(&a, U256::from(10u64));
        t.transfer(&a, U256::from(4u64)).unwrap();
        assert_eq!(t.balance(), U256::from(6u64));
        assert_eq!(t.paid_to(&a), U256::from(4u64));
    }

    #[test]
    fn test_insufficient_balance() {
        let t = InMemoryTreasury::new();
        let result = t.transfer(&Address::ZERO, U256::one());
        assert!(matches!(result, Err(PayoutError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_rejecting_leaves_balance() {
        let t = InMemoryTreasury::new();
        let a = Address::new([1; 20]);
        t.deposit(&a, U256::from(10u64));
        t.set_rejecting(true);
        assert!(t.transfer(&a, U256::from(10u64)).is_err());
        assert_eq!(t.balance(), U256::from(10u64));
        assert!(t.paid_to(&a).is_zero());
    }
}
