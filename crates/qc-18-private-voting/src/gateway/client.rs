//! # Proof Gateway
//!
//! Typed client over the verifier transport. Callers see verdicts; bytes
//! stay in [`super::codec`].

use super::codec::{
    CheckGeneratorRequest, CheckGeneratorResponse, CodecError, VerifyCastRequest,
    VerifyCastResponse, VerifyRegisterRequest, VerifyRegisterResponse, VerifyTallyRequest,
    VerifyTallyResponse,
};
use crate::domain::{Address, Digest, ElectionError, VerifierOp, VotingKey};
use crate::ports::outbound::{TransportError, VerifierTransport};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Gateway failure: the call did not run, or its answer was unreadable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failed.
    #[error("{op}: {source}")]
    Transport {
        /// Operation attempted.
        op: VerifierOp,
        /// Underlying failure.
        source: TransportError,
    },

    /// Response did not decode.
    #[error("{op}: {source}")]
    Malformed {
        /// Operation attempted.
        op: VerifierOp,
        /// Decode failure.
        source: CodecError,
    },
}

impl From<GatewayError> for ElectionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport { op, source } => ElectionError::VerifierUnavailable {
                op,
                reason: source.to_string(),
            },
            GatewayError::Malformed { op, source } => ElectionError::MalformedResponse {
                op,
                reason: source.to_string(),
            },
        }
    }
}

/// Client for the four verifier operations at one fixed address.
pub struct ProofGateway<V: VerifierTransport> {
    transport: Arc<V>,
    verifier: Address,
}

impl<V: VerifierTransport> ProofGateway<V> {
    /// Bind a transport to a verifier address.
    pub fn new(transport: Arc<V>, verifier: Address) -> Self {
        Self {
            transport,
            verifier,
        }
    }

    /// Verifier address.
    pub fn verifier(&self) -> Address {
        self.verifier
    }

    fn dispatch(&self, op: VerifierOp, input: &[u8]) -> Result<Vec<u8>, GatewayError> {
        debug!("[qc-18] {} request: {} bytes", op, input.len());
        self.transport
            .call(&self.verifier, input)
            .map_err(|source| {
                error!("[qc-18] {} transport failure: {}", op, source);
                GatewayError::Transport { op, source }
            })
    }

    fn malformed(op: VerifierOp) -> impl FnOnce(CodecError) -> GatewayError {
        move |source| {
            error!("[qc-18] {} malformed response: {}", op, source);
            GatewayError::Malformed { op, source }
        }
    }

    /// Is `generator` the proof system's group generator?
    pub fn check_generator(&self, generator: &[u8]) -> Result<bool, GatewayError> {
        let op = VerifierOp::CheckGenerator;
        let input = CheckGeneratorRequest {
            generator: generator.to_vec(),
        }
        .encode();
        let raw = self.dispatch(op, &input)?;
        let resp = CheckGeneratorResponse::decode(&raw).map_err(Self::malformed(op))?;
        Ok(resp.valid)
    }

    /// Verify a registration proof against the commitment digest.
    pub fn verify_register(
        &self,
        digest: &Digest,
        proof: &[u8],
    ) -> Result<VerifyRegisterResponse, GatewayError> {
        let op = VerifierOp::VerifyRegister;
        let input = VerifyRegisterRequest {
            digest: *digest,
            proof: proof.to_vec(),
        }
        .encode();
        let raw = self.dispatch(op, &input)?;
        VerifyRegisterResponse::decode(&raw).map_err(Self::malformed(op))
    }

    /// Verify a cast proof against the stored keys, in the given order.
    pub fn verify_cast(
        &self,
        keys: &[VotingKey],
        proof: &[u8],
    ) -> Result<VerifyCastResponse, GatewayError> {
        let op = VerifierOp::VerifyCast;
        let input = VerifyCastRequest {
            keys: keys.to_vec(),
            proof: proof.to_vec(),
        }
        .encode();
        let raw = self.dispatch(op, &input)?;
        VerifyCastResponse::decode(&raw).map_err(Self::malformed(op))
    }

    /// Check a claimed result against the stored encrypted votes.
    pub fn verify_tally(&self, claimed: u32, blob: &[u8]) -> Result<bool, GatewayError> {
        let op = VerifierOp::VerifyTally;
        let input = VerifyTallyRequest {
            claimed,
            blob: blob.to_vec(),
        }
        .encode();
        let raw = self.dispatch(op, &input)?;
        let resp = VerifyTallyResponse::decode(&raw).map_err(Self::malformed(op))?;
        Ok(resp.valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ScriptedVerifier, VerifierScript};
    use crate::gateway::codec::{VerifierRequest, SELECTOR_VERIFY_REGISTER};

    fn gateway(verifier: ScriptedVerifier) -> (ProofGateway<ScriptedVerifier>, Arc<ScriptedVerifier>) {
        let transport = Arc::new(verifier);
        (
            ProofGateway::new(Arc::clone(&transport), Address::new([0x42; 20])),
            transport,
        )
    }

    #[test]
    fn test_register_request_carries_selector_and_digest() {
        let (gw, transport) = gateway(ScriptedVerifier::accepting());
        let digest = Digest::from_slice(&[7u8; 56]).unwrap();
        gw.verify_register(&digest, &[1, 2, 3]).unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(&calls[0][..4], &SELECTOR_VERIFY_REGISTER);
        assert_eq!(calls[0].len(), 4 + 56 + 3);
        assert!(matches!(
            VerifierRequest::decode(&calls[0]),
            Ok(VerifierRequest::VerifyRegister(_))
        ));
    }

    #[test]
    fn test_transport_failure_maps_to_unavailable() {
        let (gw, transport) = gateway(ScriptedVerifier::accepting());
        transport.set_script(VerifierScript::Unavailable);
        let err: ElectionError = gw.verify_tally(1, &[0; 4]).unwrap_err().into();
        assert!(matches!(
            err,
            ElectionError::VerifierUnavailable {
                op: VerifierOp::VerifyTally,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_response_maps_to_protocol_error() {
        let (gw, transport) = gateway(ScriptedVerifier::accepting());
        transport.set_script(VerifierScript::Garbage(vec![0xFF; 7]));
        let err: ElectionError = gw.check_generator(&[1]).unwrap_err().into();
        assert!(matches!(
            err,
            ElectionError::MalformedResponse {
                op: VerifierOp::CheckGenerator,
                ..
            }
        ));
    }

    #[test]
    fn test_verifier_address_is_forwarded() {
        let (gw, _) = gateway(ScriptedVerifier::accepting());
        assert_eq!(gw.verifier(), Address::new([0x42; 20]));
    }
}
