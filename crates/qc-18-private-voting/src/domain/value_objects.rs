//! # Domain Value Objects
//!
//! Immutable value types for Private Voting.
//!
//! All fixed widths match the verifier boundary: addresses are 20 bytes,
//! voting keys (affine points) 96 bytes, registration digests 56 bytes.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

pub use primitive_types::U256;

/// Logical clock value supplied by the host.
pub type Timestamp = u64;

/// Number of bytes of a serialized voting key (affine point).
pub const BYTES_PER_VOTING_KEY: usize = 96;

/// Number of bytes of an account address.
pub const BYTES_PER_ADDRESS: usize = 20;

/// Number of bytes of a registration digest.
pub const BYTES_PER_DIGEST: usize = 56;

/// Number of phase-boundary markers.
pub const MARKER_COUNT: usize = 5;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; BYTES_PER_ADDRESS]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; BYTES_PER_ADDRESS]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; BYTES_PER_ADDRESS]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; BYTES_PER_ADDRESS]>::try_from(slice).ok().map(Self)
    }

    /// Parses a hex address, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; BYTES_PER_ADDRESS];
        hex::decode_to_slice(raw, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BYTES_PER_ADDRESS] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; BYTES_PER_ADDRESS]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{}...{}",
            hex::encode(&self.0[..4]),
            hex::encode(&self.0[18..])
        )
    }
}

impl From<[u8; BYTES_PER_ADDRESS]> for Address {
    fn from(bytes: [u8; BYTES_PER_ADDRESS]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// VOTING KEY (96 bytes)
// =============================================================================

/// A serialized voting key: an affine point of the proof system's group.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VotingKey(#[serde_as(as = "Bytes")] pub [u8; BYTES_PER_VOTING_KEY]);

impl VotingKey {
    /// Creates a voting key from a 96-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; BYTES_PER_VOTING_KEY]) -> Self {
        Self(bytes)
    }

    /// Creates a voting key from a slice. Returns None unless exactly 96 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; BYTES_PER_VOTING_KEY]>::try_from(slice).ok().map(Self)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BYTES_PER_VOTING_KEY] {
        &self.0
    }
}

impl fmt::Debug for VotingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VotingKey(0x{}..)", hex::encode(&self.0[..8]))
    }
}

// =============================================================================
// DIGEST (56 bytes)
// =============================================================================

/// Commitment digest used as the registration root.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(#[serde_as(as = "Bytes")] pub [u8; BYTES_PER_DIGEST]);

impl Digest {
    /// Creates a digest from a slice. Returns None unless exactly 56 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; BYTES_PER_DIGEST]>::try_from(slice).ok().map(Self)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BYTES_PER_DIGEST] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(0x{}..)", hex::encode(&self.0[..8]))
    }
}

// =============================================================================
// GUARD STATE
// =============================================================================

/// Protocol guard. Values 0..=4, only ever advanced one step at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GuardState {
    /// Construction has not completed.
    #[default]
    Uninitialized = 0,
    /// Deployed, awaiting the registration proof.
    AwaitingRegistration = 1,
    /// Voters registered; confirmations open, awaiting the cast proof.
    VotersRegistered = 2,
    /// Encrypted votes stored, awaiting the tally.
    VotesCast = 3,
    /// Result recorded.
    Tallied = 4,
}

impl GuardState {
    /// Numeric guard value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// The state one step ahead, if any.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Uninitialized => Some(Self::AwaitingRegistration),
            Self::AwaitingRegistration => Some(Self::VotersRegistered),
            Self::VotersRegistered => Some(Self::VotesCast),
            Self::VotesCast => Some(Self::Tallied),
            Self::Tallied => None,
        }
    }

    /// Check if transition is valid.
    #[must_use]
    pub fn can_transition_to(&self, next: GuardState) -> bool {
        self.successor() == Some(next)
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// =============================================================================
// PHASE WINDOW
// =============================================================================

/// Time window in which a gated operation may run.
///
/// Window `k` spans `[marker[k-1], marker[k])`; `Refund` has no upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Window {
    /// Aggregator submits the registration proof.
    Registration = 1,
    /// Voters confirm their keys and post deposits.
    Confirmation = 2,
    /// Aggregator submits the cast proof.
    Casting = 3,
    /// Aggregator submits the tally.
    Tallying = 4,
    /// Deposits may be withdrawn.
    Refund = 5,
}

impl Window {
    /// All windows in chronological order.
    pub const ALL: [Window; MARKER_COUNT] = [
        Window::Registration,
        Window::Confirmation,
        Window::Casting,
        Window::Tallying,
        Window::Refund,
    ];

    /// One-based window number.
    #[must_use]
    pub const fn number(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Window::Registration => "registration",
            Window::Confirmation => "confirmation",
            Window::Casting => "casting",
            Window::Tallying => "tallying",
            Window::Refund => "refund",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// CAST OUTPUT FLAG
// =============================================================================

/// Per-voter verdict reported by the cast verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastOutput {
    /// The encrypted vote is well formed (0x01).
    Valid,
    /// The encrypted vote is malformed (0x00).
    Invalid,
}

impl CastOutput {
    /// Wire byte for this flag.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            CastOutput::Valid => 0x01,
            CastOutput::Invalid => 0x00,
        }
    }

    /// Parses a wire byte. Anything but 0x00/0x01 is rejected.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CastOutput::Valid),
            0x00 => Some(CastOutput::Invalid),
            _ => None,
        }
    }

    /// Returns true for `Valid`.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, CastOutput::Valid)
    }
}
