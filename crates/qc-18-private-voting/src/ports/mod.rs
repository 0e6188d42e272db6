//! # Ports Module
//!
//! Hexagonal architecture ports.

pub mod inbound;
pub mod outbound;

pub use inbound::ElectionApi;
pub use outbound::{LogicalClock, PayoutError, PayoutPort, TransportError, VerifierTransport};
