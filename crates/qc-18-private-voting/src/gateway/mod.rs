//! # Proof Gateway
//!
//! Verifier boundary: wire codec and typed client.

pub mod client;
pub mod codec;

pub use client::{GatewayError, ProofGateway};
pub use codec::{
    CheckGeneratorRequest, CheckGeneratorResponse, CodecError, RegisterBatch, VerifierRequest,
    VerifyCastRequest, VerifyCastResponse, VerifyRegisterRequest, VerifyRegisterResponse,
    VerifyTallyRequest, VerifyTallyResponse,
};
