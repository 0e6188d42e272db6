//! Scripted Verifier Adapter
//!
//! Implements `VerifierTransport` with deterministic verdicts. Requests are
//! parsed and responses built through the real codec, so tests exercise the
//! same bytes a production verifier would see.

use crate::domain::{Address, CastOutput};
use crate::gateway::codec::{
    CheckGeneratorResponse, VerifierRequest, VerifyCastResponse, VerifyRegisterResponse,
    VerifyTallyResponse, COUNT_SIZE,
};
use crate::ports::outbound::{TransportError, VerifierTransport};
use parking_lot::RwLock;
use tracing::debug;

/// Verdicts returned while the script is `Respond`.
#[derive(Clone, Debug)]
pub struct Verdicts {
    /// `check_generator` answer.
    pub generator: bool,
    /// `verify_register` validity.
    pub register: bool,
    /// Registration count; `None` reads the proof's little-endian header.
    pub register_count: Option<u32>,
    /// `verify_cast` validity of the proof as a whole.
    pub cast: bool,
    /// Per-voter outputs; `None` answers 0x01 for every key.
    pub cast_outputs: Option<Vec<CastOutput>>,
    /// `verify_tally` answer.
    pub tally: bool,
}

impl Default for Verdicts {
    fn default() -> Self {
        Self {
            generator: true,
            register: true,
            register_count: None,
            cast: true,
            cast_outputs: None,
            tally: true,
        }
    }
}

/// Verifier behaviour.
#[derive(Clone, Debug)]
pub enum VerifierScript {
    /// Well-formed responses carrying the given verdicts.
    Respond(Verdicts),
    /// Every call fails at the transport.
    Unavailable,
    /// Every call returns these raw bytes.
    Garbage(Vec<u8>),
}

/// Verifier test double.
pub struct ScriptedVerifier {
    script: RwLock<VerifierScript>,
    calls: RwLock<Vec<Vec<u8>>>,
}

impl ScriptedVerifier {
    /// Create with a script.
    pub fn new(script: VerifierScript) -> Self {
        Self {
            script: RwLock::new(script),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Accepts everything.
    pub fn accepting() -> Self {
        Self::new(VerifierScript::Respond(Verdicts::default()))
    }

    /// Replace the script.
    pub fn set_script(&self, script: VerifierScript) {
        *self.script.write() = script;
    }

    /// Edit the verdicts in place, switching to `Respond` if needed.
    pub fn update_verdicts(&self, edit: impl FnOnce(&mut Verdicts)) {
        let mut script = self.script.write();
        if !matches!(*script, VerifierScript::Respond(_)) {
            *script = VerifierScript::Respond(Verdicts::default());
        }
        if let VerifierScript::Respond(verdicts) = &mut *script {
            edit(verdicts);
        }
    }

    /// Raw inputs received, oldest first.
    pub fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.read().clone()
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }

    fn respond(verdicts: &Verdicts, request: VerifierRequest) -> Vec<u8> {
        match request {
            VerifierRequest::CheckGenerator(_) => CheckGeneratorResponse {
                valid: verdicts.generator,
            }
            .encode(),
            VerifierRequest::VerifyRegister(req) => {
                let count = verdicts.register_count.unwrap_or_else(|| {
                    req.proof
                        .get(..COUNT_SIZE)
                        .map(|h| u32::from_le_bytes([h[0], h[1], h[2], h[3]]))
                        .unwrap_or(0)
                });
                VerifyRegisterResponse {
                    valid: verdicts.register,
                    count,
                }
                .encode()
            }
            VerifierRequest::VerifyCast(req) => VerifyCastResponse {
                valid: verdicts.cast,
                outputs: verdicts
                    .cast_outputs
                    .clone()
                    .unwrap_or_else(|| vec![CastOutput::Valid; req.keys.len()]),
            }
            .encode(),
            VerifierRequest::VerifyTally(req) => {
                // A result above the number of encrypted votes is never valid.
                let voters = req
                    .blob
                    .get(..COUNT_SIZE)
                    .map(|h| u32::from_le_bytes([h[0], h[1], h[2], h[3]]))
                    .unwrap_or(0);
                VerifyTallyResponse {
                    valid: verdicts.tally && req.claimed <= voters,
                }
                .encode()
            }
        }
    }
}

impl Default for ScriptedVerifier {
    fn default() -> Self {
        Self::accepting()
    }
}

impl VerifierTransport for ScriptedVerifier {
    fn call(&self, verifier: &Address, input: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.calls.write().push(input.to_vec());
        debug!("[qc-18] Scripted verifier {} received {} bytes", verifier, input.len());

        match &*self.script.read() {
            VerifierScript::Unavailable => Err(TransportError::Unreachable(*verifier)),
            VerifierScript::Garbage(bytes) => Ok(bytes.clone()),
            VerifierScript::Respond(verdicts) => {
                let request = VerifierRequest::decode(input)
                    .map_err(|e| TransportError::ExecutionFailed(e.to_string()))?;
                Ok(Self::respond(verdicts, request))
            }
        }
    }
}
