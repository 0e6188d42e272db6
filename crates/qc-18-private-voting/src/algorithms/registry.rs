//! # Voter Registry
//!
//! Partial keys from the registration proof, confirmed key bindings, and the
//! canonical order of confirmed voters.
//!
//! Partial keys may be overwritten (last write wins) and need not be unique.
//! Confirmed bindings are injective: a key owned by one address cannot be
//! confirmed by another.

use crate::domain::{Address, ElectionError, VotingKey};
use std::collections::{BTreeMap, HashMap};

/// Voter registry.
#[derive(Clone, Debug, Default)]
pub struct VoterRegistry {
    partial_keys: BTreeMap<Address, VotingKey>,
    confirmed_keys: BTreeMap<Address, VotingKey>,
    owners: HashMap<VotingKey, Address>,
    registered: Vec<Address>,
}

impl VoterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a proven key for `address`, replacing any earlier one.
    pub fn record_partial(&mut self, address: Address, key: VotingKey) {
        self.partial_keys.insert(address, key);
    }

    /// Partial key of `address`.
    pub fn partial_key(&self, address: &Address) -> Option<&VotingKey> {
        self.partial_keys.get(address)
    }

    /// All partial keys, ordered by address.
    pub fn partial_keys(&self) -> impl Iterator<Item = (&Address, &VotingKey)> {
        self.partial_keys.iter()
    }

    /// Address bound to `key`, if confirmed.
    pub fn owner_of(&self, key: &VotingKey) -> Option<Address> {
        self.owners.get(key).copied()
    }

    /// Key confirmed by `address`.
    pub fn confirmed_key(&self, address: &Address) -> Option<&VotingKey> {
        self.confirmed_keys.get(address)
    }

    /// Check that `address` may confirm, returning the key it would bind.
    pub fn ensure_confirmable(&self, address: &Address) -> Result<VotingKey, ElectionError> {
        let key = *self
            .partial_keys
            .get(address)
            .ok_or(ElectionError::NoPartialKey(*address))?;
        if let Some(owner) = self.owner_of(&key) {
            return Err(ElectionError::KeyAlreadyBound { owner });
        }
        Ok(key)
    }

    /// Bind the caller's partial key and append it to the canonical order.
    ///
    /// Returns the assigned index.
    pub fn confirm(&mut self, address: Address) -> Result<u32, ElectionError> {
        let key = self.ensure_confirmable(&address)?;
        let index = self.registered.len() as u32;
        self.owners.insert(key, address);
        self.confirmed_keys.insert(address, key);
        self.registered.push(address);
        Ok(index)
    }

    /// Canonical registration index of `address`.
    pub fn index_of(&self, address: &Address) -> Option<u32> {
        self.registered
            .iter()
            .position(|a| a == address)
            .map(|i| i as u32)
    }

    /// Confirmed voters in canonical order.
    pub fn registered_addrs(&self) -> &[Address] {
        &self.registered
    }

    /// Number of confirmed voters.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// True if nobody has confirmed.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Stored keys of confirmed voters, in canonical order.
    pub fn ordered_keys(&self) -> Vec<VotingKey> {
        self.registered
            .iter()
            .filter_map(|a| self.confirmed_keys.get(a).copied())
            .collect()
    }
}
