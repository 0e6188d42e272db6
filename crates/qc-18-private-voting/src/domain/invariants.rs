//! # Domain Invariants
//!
//! Business rules for Private Voting.

use super::errors::ElectionError;
use super::value_objects::{GuardState, Timestamp, U256, MARKER_COUNT};

/// Invariant: phase markers are strictly ascending and all lie after `now`.
pub fn invariant_markers_ascending(
    markers: &[Timestamp; MARKER_COUNT],
    now: Timestamp,
) -> Result<(), ElectionError> {
    if markers[0] <= now {
        return Err(ElectionError::MarkerNotInFuture {
            marker: markers[0],
            now,
        });
    }

    for index in 1..MARKER_COUNT {
        if markers[index] <= markers[index - 1] {
            return Err(ElectionError::MarkersNotAscending {
                index,
                previous: markers[index - 1],
                current: markers[index],
            });
        }
    }
    Ok(())
}

/// Invariant: exactly one fee unit is attached.
pub fn invariant_exact_fee(paid: U256, fee: U256) -> Result<(), ElectionError> {
    if paid != fee {
        return Err(ElectionError::IncorrectFee {
            expected: fee,
            paid,
        });
    }
    Ok(())
}

/// Invariant: the guard holds the value an operation requires.
pub fn invariant_guard_is(actual: GuardState, expected: GuardState) -> Result<(), ElectionError> {
    if actual != expected {
        return Err(ElectionError::WrongGuard { expected, actual });
    }
    Ok(())
}

/// Invariant: the cast verifier returned one output per registered voter.
pub fn invariant_output_length(expected: usize, got: usize) -> Result<(), ElectionError> {
    if expected != got {
        return Err(ElectionError::OutputLengthMismatch { expected, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_ascending_valid() {
        assert!(invariant_markers_ascending(&[5, 10, 15, 20, 25], 0).is_ok());
        assert!(invariant_markers_ascending(&[5, 10, 15, 20, 25], 4).is_ok());
    }

    #[test]
    fn test_markers_equal_fails() {
        let result = invariant_markers_ascending(&[5, 10, 10, 20, 25], 0);
        assert!(matches!(
            result,
            Err(ElectionError::MarkersNotAscending { index: 2, .. })
        ));
    }

    #[test]
    fn test_markers_descending_fails() {
        let result = invariant_markers_ascending(&[5, 10, 15, 30, 25], 0);
        assert!(matches!(
            result,
            Err(ElectionError::MarkersNotAscending { index: 4, .. })
        ));
    }

    #[test]
    fn test_markers_in_past_fails() {
        let result = invariant_markers_ascending(&[5, 10, 15, 20, 25], 5);
        assert!(matches!(
            result,
            Err(ElectionError::MarkerNotInFuture { marker: 5, now: 5 })
        ));
    }

    #[test]
    fn test_exact_fee() {
        let fee = U256::from(5u64);
        assert!(invariant_exact_fee(fee, fee).is_ok());
        assert!(invariant_exact_fee(U256::from(4u64), fee).is_err());
        assert!(invariant_exact_fee(U256::from(6u64), fee).is_err());
    }

    #[test]
    fn test_guard_is() {
        assert!(invariant_guard_is(GuardState::VotesCast, GuardState::VotesCast).is_ok());
        assert!(matches!(
            invariant_guard_is(GuardState::VotersRegistered, GuardState::VotesCast),
            Err(ElectionError::WrongGuard { .. })
        ));
    }

    #[test]
    fn test_output_length() {
        assert!(invariant_output_length(2, 2).is_ok());
        assert!(invariant_output_length(2, 3).is_err());
    }
}
