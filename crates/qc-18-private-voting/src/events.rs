//! # Election Events
//!
//! Notifications emitted when an operation commits. A rejected operation
//! emits nothing.

use crate::domain::{Address, Timestamp, MARKER_COUNT, U256};
use serde::{Deserialize, Serialize};

/// Committed state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionEvent {
    /// Election deployed.
    ElectionCreated {
        /// Aggregator identity.
        aggregator: Address,
        /// Phase markers.
        markers: [Timestamp; MARKER_COUNT],
    },
    /// Registration proof accepted.
    VotersRegistered {
        /// Key/address pairs recorded.
        count: u32,
    },
    /// A voter confirmed and received an index.
    IndexAssigned {
        /// Confirming voter.
        voter: Address,
        /// Canonical index.
        index: u32,
    },
    /// Encrypted votes stored.
    VotesCast {
        /// Number of encrypted votes.
        count: u32,
    },
    /// Result recorded.
    TallyRecorded {
        /// Final result.
        result: u32,
    },
    /// A deposit was paid back.
    DepositRefunded {
        /// Recipient.
        account: Address,
        /// Amount returned.
        amount: U256,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = ElectionEvent::IndexAssigned {
            voter: Address::new([1; 20]),
            index: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["IndexAssigned"]["index"], 3);
    }
}
