//! # Phase Controller
//!
//! Top-level election state machine. Sequences the time windows, the proof
//! gateway, the registry, the deposit ledger and the vote aggregator.
//!
//! ## Guard Transitions
//!
//! | Operation          | Window | Guard     |
//! |--------------------|--------|-----------|
//! | deploy             | -      | 0 -> 1    |
//! | `register_voters`  | 1      | 1 -> 2    |
//! | `register_confirm` | 2      | unchanged |
//! | `cast_votes`       | 3      | 2 -> 3    |
//! | `vote_tallying`    | 4      | 3 -> 4    |
//! | `refund`           | 5      | unchanged |
//!
//! Every check runs before the first mutation, so a failed operation leaves
//! every stored field as it was. The controller takes `&mut self`; there is
//! no other concurrency control.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::algorithms::{
    CastDecision, DepositLedger, ElectionRecord, StagedCast, TimeWindowGuard, VoteAggregator,
    VoterRegistry,
};
use crate::domain::{
    invariant_exact_fee, invariant_guard_is, invariant_output_length, Address, ControllerStats,
    DeployParams, Digest, ElectionConfig, ElectionError, ElectionParameters, ElectionSnapshot,
    EncryptedVotesBlob, ErrorClass, GuardState, Timestamp, VerifierOp, VoterRecord, Window, U256,
};
use crate::events::ElectionEvent;
use crate::gateway::codec::decode_register_batch;
use crate::gateway::ProofGateway;
use crate::ports::inbound::ElectionApi;
use crate::ports::outbound::{LogicalClock, PayoutPort, VerifierTransport};

/// Outbound dependencies of the controller.
pub struct ControllerPorts<V, C, P> {
    /// Verifier transport.
    pub verifier: Arc<V>,
    /// Logical clock.
    pub clock: Arc<C>,
    /// Funds port.
    pub treasury: Arc<P>,
}

/// Private voting state machine.
pub struct PhaseController<V, C, P>
where
    V: VerifierTransport,
    C: LogicalClock,
    P: PayoutPort,
{
    config: ElectionConfig,
    parameters: ElectionParameters,
    windows: TimeWindowGuard,
    guard: GuardState,
    gateway: ProofGateway<V>,
    clock: Arc<C>,
    treasury: Arc<P>,
    registry: VoterRegistry,
    ledger: DepositLedger,
    aggregator: VoteAggregator,
    record: ElectionRecord,
    events: Vec<ElectionEvent>,
    stats: ControllerStats,
}

impl<V, C, P> PhaseController<V, C, P>
where
    V: VerifierTransport,
    C: LogicalClock,
    P: PayoutPort,
{
    /// Deploy an election.
    ///
    /// `value` must be exactly one fee unit; it is held as the aggregator's
    /// deposit. Markers must be strictly ascending and in the future, the
    /// digest 56 bytes, and the generator accepted by the verifier.
    #[instrument(skip(config, params, ports), fields(aggregator = %aggregator))]
    pub fn deploy(
        config: ElectionConfig,
        params: DeployParams,
        aggregator: Address,
        value: U256,
        ports: ControllerPorts<V, C, P>,
    ) -> Result<Self, ElectionError> {
        let result = Self::try_deploy(config, params, aggregator, value, ports);
        if let Err(err) = &result {
            warn!("[qc-18] Deployment rejected: {}", err);
        }
        result
    }

    fn try_deploy(
        config: ElectionConfig,
        params: DeployParams,
        aggregator: Address,
        value: U256,
        ports: ControllerPorts<V, C, P>,
    ) -> Result<Self, ElectionError> {
        config.validate()?;

        let digest = Digest::from_slice(&params.digest).ok_or(ElectionError::MalformedDigest {
            len: params.digest.len(),
        })?;

        if value != config.fee {
            return Err(ElectionError::IncorrectDeploymentFee {
                expected: config.fee,
                paid: value,
            });
        }

        let windows = TimeWindowGuard::new(params.markers, ports.clock.now())?;

        let gateway = ProofGateway::new(ports.verifier, config.verifier);
        if !gateway.check_generator(&params.generator)? {
            return Err(ElectionError::InvalidGenerator);
        }

        let mut ledger = DepositLedger::new();
        ledger.set(aggregator)?;
        ports.treasury.deposit(&aggregator, value);

        let mut controller = Self {
            parameters: ElectionParameters {
                markers: params.markers,
                digest,
                generator: params.generator,
                aggregator,
            },
            config,
            windows,
            guard: GuardState::Uninitialized,
            gateway,
            clock: ports.clock,
            treasury: ports.treasury,
            registry: VoterRegistry::new(),
            ledger,
            aggregator: VoteAggregator::new(),
            record: ElectionRecord::default(),
            events: Vec::new(),
            stats: ControllerStats::default(),
        };
        controller.advance_guard(GuardState::AwaitingRegistration)?;
        controller.emit(ElectionEvent::ElectionCreated {
            aggregator,
            markers: params.markers,
        });
        info!(
            "[qc-18] Election deployed: markers={:?}, guard={}",
            params.markers, controller.guard
        );
        Ok(controller)
    }

    // =========================================================================
    // GUARD
    // =========================================================================

    /// The only place the guard changes.
    fn advance_guard(&mut self, next: GuardState) -> Result<(), ElectionError> {
        if !self.guard.can_transition_to(next) {
            return Err(ElectionError::WrongGuard {
                expected: next,
                actual: self.guard,
            });
        }
        self.guard = next;
        Ok(())
    }

    fn ensure_aggregator(&self, caller: &Address) -> Result<(), ElectionError> {
        if *caller != self.parameters.aggregator {
            return Err(ElectionError::NotAggregator { caller: *caller });
        }
        Ok(())
    }

    fn ensure_gate(&self, window: Window, guard: Option<GuardState>) -> Result<(), ElectionError> {
        self.windows.ensure_open(window, self.clock.now())?;
        if let Some(expected) = guard {
            invariant_guard_is(self.guard, expected)?;
        }
        Ok(())
    }

    fn emit(&mut self, event: ElectionEvent) {
        self.events.push(event);
    }

    fn track<T>(&mut self, op: &str, result: Result<T, ElectionError>) -> Result<T, ElectionError> {
        match &result {
            Ok(_) => self.stats.committed += 1,
            Err(err) => {
                let class = err.class();
                self.stats.record_rejection(class);
                if class == ErrorClass::Protocol {
                    error!("[qc-18] {} failed: {}", op, err);
                } else {
                    warn!("[qc-18] {} rejected: {}", op, err);
                }
            }
        }
        result
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    fn do_register_voters(&mut self, caller: Address, proof: &[u8]) -> Result<u32, ElectionError> {
        self.ensure_aggregator(&caller)?;
        self.ensure_gate(Window::Registration, Some(GuardState::AwaitingRegistration))?;

        let verdict = self
            .gateway
            .verify_register(&self.parameters.digest, proof)?;
        if !verdict.valid {
            return Err(ElectionError::ProofRejected {
                op: VerifierOp::VerifyRegister,
            });
        }

        let batch = decode_register_batch(proof, verdict.count);
        if batch.truncated {
            warn!(
                "[qc-18] Registration proof holds {} of {} declared pairs",
                batch.pairs.len(),
                verdict.count
            );
        }

        let count = batch.pairs.len() as u32;
        for (address, key) in batch.pairs {
            self.registry.record_partial(address, key);
        }
        self.advance_guard(GuardState::VotersRegistered)?;
        self.emit(ElectionEvent::VotersRegistered { count });
        info!("[qc-18] Voters registered: count={}, guard={}", count, self.guard);
        Ok(count)
    }

    fn do_register_confirm(&mut self, caller: Address, value: U256) -> Result<u32, ElectionError> {
        self.ensure_gate(Window::Confirmation, None)?;
        invariant_exact_fee(value, self.config.fee)?;
        self.registry.ensure_confirmable(&caller)?;
        if self.ledger.has_deposit(&caller) {
            return Err(ElectionError::DepositAlreadyHeld(caller));
        }

        self.ledger.set(caller)?;
        let index = self.registry.confirm(caller)?;
        self.treasury.deposit(&caller, value);
        self.emit(ElectionEvent::IndexAssigned {
            voter: caller,
            index,
        });
        info!("[qc-18] Voter {} confirmed: index={}", caller, index);
        Ok(index)
    }

    fn do_cast_votes(&mut self, caller: Address, proof: &[u8]) -> Result<(), ElectionError> {
        self.ensure_aggregator(&caller)?;
        self.ensure_gate(Window::Casting, Some(GuardState::VotersRegistered))?;

        let keys = VoteAggregator::key_buffer(&self.registry);
        let n = keys.len();
        let verdict = self.gateway.verify_cast(&keys, proof)?;
        invariant_output_length(n, verdict.outputs.len())?;
        let blob = EncryptedVotesBlob::from_proof(proof, n)?;

        let mut stage = StagedCast::new(verdict.valid, blob, GuardState::VotesCast);
        stage.stage_outputs(self.registry.registered_addrs(), &verdict.outputs);
        if let CastDecision::Abort(reason) = stage.decide() {
            for voter in stage.forfeited_voters() {
                warn!("[qc-18] Invalid encrypted vote from {}", voter);
            }
            return Err(reason);
        }

        let next = stage.commit(&mut self.aggregator)?;
        self.advance_guard(next)?;
        self.emit(ElectionEvent::VotesCast { count: n as u32 });
        info!("[qc-18] Votes cast: count={}, guard={}", n, self.guard);
        Ok(())
    }

    fn do_vote_tallying(&mut self, caller: Address, claimed: u32) -> Result<(), ElectionError> {
        self.ensure_aggregator(&caller)?;
        self.ensure_gate(Window::Tallying, Some(GuardState::VotesCast))?;

        let blob = self
            .aggregator
            .blob()
            .map(EncryptedVotesBlob::as_bytes)
            .unwrap_or_default();
        if !self.gateway.verify_tally(claimed, blob)? {
            return Err(ElectionError::ProofRejected {
                op: VerifierOp::VerifyTally,
            });
        }

        self.record.record(claimed)?;
        self.advance_guard(GuardState::Tallied)?;
        self.emit(ElectionEvent::TallyRecorded { result: claimed });
        info!("[qc-18] Tally recorded: result={}, guard={}", claimed, self.guard);
        Ok(())
    }

    fn do_refund(&mut self, caller: Address) -> Result<U256, ElectionError> {
        self.ensure_gate(Window::Refund, None)?;

        let amount = self.config.fee;
        self.ledger.clear(&caller)?;
        if let Err(err) = self.treasury.transfer(&caller, amount) {
            self.ledger.set(caller)?;
            return Err(ElectionError::PayoutFailed {
                account: caller,
                reason: err.to_string(),
            });
        }

        self.emit(ElectionEvent::DepositRefunded {
            account: caller,
            amount,
        });
        info!("[qc-18] Deposit refunded to {}: {}", caller, amount);
        Ok(amount)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Election configuration.
    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    /// Construction parameters.
    pub fn parameters(&self) -> &ElectionParameters {
        &self.parameters
    }

    /// Window containing the current clock.
    pub fn active_window(&self) -> Option<Window> {
        self.windows.active_window(self.clock.now())
    }

    /// Inclusive start and exclusive end of `window`.
    pub fn window_bounds(&self, window: Window) -> (Timestamp, Option<Timestamp>) {
        self.windows.bounds(window)
    }

    /// View of one address.
    pub fn voter(&self, address: &Address) -> VoterRecord {
        VoterRecord {
            address: *address,
            partial_key: self.registry.partial_key(address).copied(),
            confirmed_key: self.registry.confirmed_key(address).copied(),
            deposit: self.ledger.has_deposit(address),
            index: self.registry.index_of(address),
        }
    }

    /// Confirmed voters in canonical order.
    pub fn registered_addrs(&self) -> &[Address] {
        self.registry.registered_addrs()
    }

    /// Is a fee unit held for `address`?
    pub fn has_deposit(&self, address: &Address) -> bool {
        self.ledger.has_deposit(address)
    }

    /// Stored encrypted votes.
    pub fn encrypted_votes(&self) -> Option<&EncryptedVotesBlob> {
        self.aggregator.blob()
    }

    /// Recorded result.
    pub fn result(&self) -> Option<u32> {
        self.record.result()
    }

    /// Committed events, oldest first.
    pub fn events(&self) -> &[ElectionEvent] {
        &self.events
    }

    /// Operation counters.
    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }
}

impl<V, C, P> ElectionApi for PhaseController<V, C, P>
where
    V: VerifierTransport,
    C: LogicalClock,
    P: PayoutPort,
{
    #[instrument(skip(self, proof), fields(caller = %caller, proof_len = proof.len()))]
    fn register_voters(&mut self, caller: Address, proof: &[u8]) -> Result<u32, ElectionError> {
        let result = self.do_register_voters(caller, proof);
        self.track("register_voters", result)
    }

    #[instrument(skip(self), fields(caller = %caller))]
    fn register_confirm(&mut self, caller: Address, value: U256) -> Result<u32, ElectionError> {
        let result = self.do_register_confirm(caller, value);
        self.track("register_confirm", result)
    }

    #[instrument(skip(self, proof), fields(caller = %caller, proof_len = proof.len()))]
    fn cast_votes(&mut self, caller: Address, proof: &[u8]) -> Result<(), ElectionError> {
        let result = self.do_cast_votes(caller, proof);
        self.track("cast_votes", result)
    }

    #[instrument(skip(self), fields(caller = %caller))]
    fn vote_tallying(&mut self, caller: Address, claimed: u32) -> Result<(), ElectionError> {
        let result = self.do_vote_tallying(caller, claimed);
        self.track("vote_tallying", result)
    }

    #[instrument(skip(self), fields(caller = %caller))]
    fn refund(&mut self, caller: Address) -> Result<U256, ElectionError> {
        let result = self.do_refund(caller);
        self.track("refund", result)
    }

    fn guard(&self) -> GuardState {
        self.guard
    }

    fn snapshot(&self) -> ElectionSnapshot {
        let mut addresses: BTreeSet<Address> =
            self.registry.partial_keys().map(|(a, _)| *a).collect();
        addresses.extend(self.registry.registered_addrs().iter().copied());
        addresses.extend(self.ledger.holders().copied());

        ElectionSnapshot {
            parameters: self.parameters.clone(),
            guard: self.guard,
            voters: addresses.iter().map(|a| self.voter(a)).collect(),
            registered_addrs: self.registry.registered_addrs().to_vec(),
            encrypted_votes: self.aggregator.blob().cloned(),
            result: self.record.result(),
            deposits_held: self.ledger.held_total(self.config.fee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryTreasury, ManualClock, ScriptedVerifier, VerifierScript};
    use crate::domain::{CastOutput, VotingKey};
    use crate::gateway::codec::encode_register_batch;

    type Controller = PhaseController<ScriptedVerifier, ManualClock, InMemoryTreasury>;

    const AGGREGATOR: Address = Address::new([0xAA; 20]);

    fn fee() -> U256 {
        ElectionConfig::default().fee
    }

    struct Harness {
        verifier: Arc<ScriptedVerifier>,
        clock: Arc<ManualClock>,
        treasury: Arc<InMemoryTreasury>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                verifier: Arc::new(ScriptedVerifier::accepting()),
                clock: Arc::new(ManualClock::new(0)),
                treasury: Arc::new(InMemoryTreasury::new()),
            }
        }

        fn ports(&self) -> ControllerPorts<ScriptedVerifier, ManualClock, InMemoryTreasury> {
            ControllerPorts {
                verifier: Arc::clone(&self.verifier),
                clock: Arc::clone(&self.clock),
                treasury: Arc::clone(&self.treasury),
            }
        }

        fn deploy(&self) -> Controller {
            PhaseController::deploy(
                ElectionConfig::default(),
                params(),
                AGGREGATOR,
                fee(),
                self.ports(),
            )
            .unwrap()
        }
    }

    fn params() -> DeployParams {
        DeployParams {
            markers: [5, 10, 15, 20, 25],
            digest: vec![7u8; 56],
            generator: vec![1, 2, 3],
        }
    }

    fn voter(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn register_proof(voters: &[u8]) -> Vec<u8> {
        let pairs: Vec<_> = voters
            .iter()
            .map(|&b| (voter(b), VotingKey::new([b; 96])))
            .collect();
        encode_register_batch(&pairs, &[0xEE; 16])
    }

    #[test]
    fn test_deploy_sets_guard_and_aggregator_deposit() {
        let h = Harness::new();
        let c = h.deploy();
        assert_eq!(c.guard(), GuardState::AwaitingRegistration);
        assert!(c.has_deposit(&AGGREGATOR));
        assert_eq!(h.treasury.balance(), fee());
        assert!(matches!(
            c.events()[0],
            ElectionEvent::ElectionCreated { .. }
        ));
    }

    #[test]
    fn test_deploy_rejects_wrong_fee() {
        let h = Harness::new();
        let result = Controller::deploy(
            ElectionConfig::default(),
            params(),
            AGGREGATOR,
            fee() + U256::one(),
            h.ports(),
        );
        assert!(matches!(
            result,
            Err(ElectionError::IncorrectDeploymentFee { .. })
        ));
        assert!(h.treasury.balance().is_zero());
    }

    #[test]
    fn test_deploy_rejects_malformed_digest() {
        let h = Harness::new();
        let mut p = params();
        p.digest = vec![0u8; 32];
        let result = Controller::deploy(ElectionConfig::default(), p, AGGREGATOR, fee(), h.ports());
        assert_eq!(result.err(), Some(ElectionError::MalformedDigest { len: 32 }));
    }

    #[test]
    fn test_deploy_rejects_invalid_generator() {
        let h = Harness::new();
        h.verifier.update_verdicts(|v| v.generator = false);
        let result = Controller::deploy(
            ElectionConfig::default(),
            params(),
            AGGREGATOR,
            fee(),
            h.ports(),
        );
        assert_eq!(result.err(), Some(ElectionError::InvalidGenerator));
        assert_eq!(ElectionError::InvalidGenerator.class(), ErrorClass::Configuration);
    }

    #[test]
    fn test_deploy_rejects_past_markers() {
        let h = Harness::new();
        h.clock.set_time(5);
        let result = Controller::deploy(
            ElectionConfig::default(),
            params(),
            AGGREGATOR,
            fee(),
            h.ports(),
        );
        assert!(matches!(
            result,
            Err(ElectionError::MarkerNotInFuture { .. })
        ));
    }

    #[test]
    fn test_register_voters_requires_aggregator() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        let result = c.register_voters(voter(1), &register_proof(&[1]));
        assert_eq!(result, Err(ElectionError::NotAggregator { caller: voter(1) }));
        assert_eq!(h.verifier.call_count(), 1);
        assert_eq!(c.stats().rejections(ErrorClass::Authorization), 1);
    }

    #[test]
    fn test_register_voters_records_partial_keys() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        assert_eq!(c.register_voters(AGGREGATOR, &register_proof(&[1, 2])), Ok(2));
        assert_eq!(c.guard(), GuardState::VotersRegistered);
        assert_eq!(c.voter(&voter(2)).partial_key, Some(VotingKey::new([2; 96])));
    }

    #[test]
    fn test_register_voters_zero_count_still_advances() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        assert_eq!(c.register_voters(AGGREGATOR, &register_proof(&[])), Ok(0));
        assert_eq!(c.guard(), GuardState::VotersRegistered);
    }

    #[test]
    fn test_register_voters_twice_fails_on_guard() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        c.register_voters(AGGREGATOR, &register_proof(&[1])).unwrap();
        assert!(matches!(
            c.register_voters(AGGREGATOR, &register_proof(&[2])),
            Err(ElectionError::WrongGuard { .. })
        ));
        assert!(c.voter(&voter(2)).partial_key.is_none());
    }

    #[test]
    fn test_register_voters_rejected_proof() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        h.verifier.update_verdicts(|v| v.register = false);
        assert_eq!(
            c.register_voters(AGGREGATOR, &register_proof(&[1])),
            Err(ElectionError::ProofRejected {
                op: VerifierOp::VerifyRegister
            })
        );
        assert_eq!(c.guard(), GuardState::AwaitingRegistration);
        assert!(c.voter(&voter(1)).partial_key.is_none());
    }

    #[test]
    fn test_register_voters_truncated_proof() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        // Declaring 3 pairs moves the address region past the end of the proof.
        h.verifier.update_verdicts(|v| v.register_count = Some(3));
        assert_eq!(c.register_voters(AGGREGATOR, &register_proof(&[1, 2])), Ok(0));
        assert_eq!(c.guard(), GuardState::VotersRegistered);
    }

    #[test]
    fn test_verifier_unavailable_is_protocol_error() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        h.verifier.set_script(VerifierScript::Unavailable);
        let err = c
            .register_voters(AGGREGATOR, &register_proof(&[1]))
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Protocol);
        assert_eq!(c.guard(), GuardState::AwaitingRegistration);
    }

    fn frozen_state(c: &Controller) -> String {
        c.snapshot().to_json().unwrap()
    }

    fn failing_scripts() -> Vec<VerifierScript> {
        vec![
            VerifierScript::Unavailable,
            VerifierScript::Garbage(vec![0xFF; 7]),
        ]
    }

    #[test]
    fn test_deploy_verifier_failure_creates_nothing() {
        for script in failing_scripts() {
            let h = Harness::new();
            h.verifier.set_script(script);
            let err = PhaseController::deploy(
                ElectionConfig::default(),
                params(),
                AGGREGATOR,
                fee(),
                h.ports(),
            )
            .map(|_| ())
            .unwrap_err();
            assert_eq!(err.class(), ErrorClass::Protocol);
            assert_eq!(h.treasury.balance(), U256::zero());
        }
    }

    #[test]
    fn test_cast_verifier_failure_leaves_state_unchanged() {
        for script in failing_scripts() {
            let h = Harness::new();
            let mut c = registered(&h, &[1, 2]);
            let before = frozen_state(&c);
            let events = c.events().len();

            h.verifier.set_script(script);
            let err = c.cast_votes(AGGREGATOR, &[0u8; 196]).unwrap_err();
            assert_eq!(err.class(), ErrorClass::Protocol);

            assert_eq!(frozen_state(&c), before);
            assert_eq!(c.guard(), GuardState::VotersRegistered);
            assert!(c.has_deposit(&voter(1)));
            assert!(c.has_deposit(&voter(2)));
            assert!(c.has_deposit(&AGGREGATOR));
            assert!(c.encrypted_votes().is_none());
            assert_eq!(c.events().len(), events);
        }
    }

    #[test]
    fn test_tally_verifier_failure_leaves_state_unchanged() {
        for script in failing_scripts() {
            let h = Harness::new();
            let mut c = registered(&h, &[1]);
            let mut proof = 1u32.to_le_bytes().to_vec();
            proof.extend_from_slice(&[0u8; 96]);
            c.cast_votes(AGGREGATOR, &proof).unwrap();
            h.clock.set_time(21);
            let before = frozen_state(&c);

            h.verifier.set_script(script);
            let err = c.vote_tallying(AGGREGATOR, 1).unwrap_err();
            assert_eq!(err.class(), ErrorClass::Protocol);

            assert_eq!(frozen_state(&c), before);
            assert_eq!(c.guard(), GuardState::VotesCast);
            assert_eq!(c.result(), None);
            assert!(c.has_deposit(&voter(1)));
        }
    }

    fn registered(h: &Harness, voters: &[u8]) -> Controller {
        let mut c = h.deploy();
        h.clock.set_time(6);
        c.register_voters(AGGREGATOR, &register_proof(voters)).unwrap();
        h.clock.set_time(11);
        for &b in voters {
            c.register_confirm(voter(b), fee()).unwrap();
        }
        h.clock.set_time(16);
        c
    }

    #[test]
    fn test_aggregator_cannot_confirm_twice_with_deposit() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(6);
        c.register_voters(AGGREGATOR, &register_proof(&[0xAA])).unwrap();
        h.clock.set_time(11);
        assert_eq!(
            c.register_confirm(AGGREGATOR, fee()),
            Err(ElectionError::DepositAlreadyHeld(AGGREGATOR))
        );
        assert!(c.registered_addrs().is_empty());
    }

    #[test]
    fn test_cast_outputs_length_mismatch() {
        let h = Harness::new();
        let mut c = registered(&h, &[1, 2]);
        h.verifier
            .update_verdicts(|v| v.cast_outputs = Some(vec![CastOutput::Valid]));
        let proof = vec![0u8; 300];
        assert_eq!(
            c.cast_votes(AGGREGATOR, &proof),
            Err(ElectionError::OutputLengthMismatch {
                expected: 2,
                got: 1
            })
        );
        assert!(c.encrypted_votes().is_none());
    }

    #[test]
    fn test_cast_short_proof() {
        let h = Harness::new();
        let mut c = registered(&h, &[1, 2]);
        assert!(matches!(
            c.cast_votes(AGGREGATOR, &[0u8; 100]),
            Err(ElectionError::CastProofTooShort { required: 196, .. })
        ));
        assert_eq!(c.guard(), GuardState::VotersRegistered);
    }

    #[test]
    fn test_cast_sends_stored_keys_in_canonical_order() {
        let h = Harness::new();
        let mut c = registered(&h, &[2, 1]);
        c.cast_votes(AGGREGATOR, &[0u8; 196]).unwrap();

        let calls = h.verifier.calls();
        let cast = calls.last().unwrap();
        assert_eq!(&cast[4..8], &[0, 0, 0, 2]);
        assert_eq!(cast[8], 2);
        assert_eq!(cast[8 + 96], 1);
    }

    #[test]
    fn test_tally_rejected_keeps_guard() {
        let h = Harness::new();
        let mut c = registered(&h, &[1]);
        let mut proof = 1u32.to_le_bytes().to_vec();
        proof.extend_from_slice(&[0u8; 96]);
        c.cast_votes(AGGREGATOR, &proof).unwrap();
        h.clock.set_time(21);
        assert_eq!(
            c.vote_tallying(AGGREGATOR, 2),
            Err(ElectionError::ProofRejected {
                op: VerifierOp::VerifyTally
            })
        );
        assert_eq!(c.guard(), GuardState::VotesCast);
        assert_eq!(c.result(), None);
    }

    #[test]
    fn test_refund_payout_failure_restores_flag() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(30);
        h.treasury.set_rejecting(true);
        let err = c.refund(AGGREGATOR).unwrap_err();
        assert!(matches!(err, ElectionError::PayoutFailed { .. }));
        assert!(c.has_deposit(&AGGREGATOR));

        h.treasury.set_rejecting(false);
        assert_eq!(c.refund(AGGREGATOR), Ok(fee()));
        assert!(!c.has_deposit(&AGGREGATOR));
    }

    #[test]
    fn test_refund_before_window() {
        let h = Harness::new();
        let mut c = h.deploy();
        h.clock.set_time(24);
        assert!(matches!(
            c.refund(AGGREGATOR),
            Err(ElectionError::OutsideWindow {
                window: Window::Refund,
                ..
            })
        ));
    }

    #[test]
    fn test_snapshot_json_export() {
        let h = Harness::new();
        let c = registered(&h, &[1]);
        let snapshot = c.snapshot();
        assert_eq!(snapshot.deposits_held, fee() * U256::from(2u64));
        assert_eq!(snapshot.deposits_held, h.treasury.balance());
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("registered_addrs"));
        assert!(json.contains("deposits_held"));
        assert_eq!(c.active_window(), Some(Window::Casting));
        assert_eq!(c.window_bounds(Window::Casting), (15, Some(20)));
    }
}
