//! End-to-end admission tests: registry → proposal construction → deployment
//! → submission → registered `ProposalParams`.
//!
//! The engine is wired to `quorate-nullables` doubles so time and fee
//! collection are fully controlled by the test.

use quorate_governance::{
    DeployOrigin, ExecLoggingProposal, ExplicitProposal, GovernanceConfig, GovernanceEngine,
    GovernanceError, PlainTextProposal, PlainTextProposalFactory, Proposal, ProposalBody,
    SlashingRefundProposal, Template, TemplateRegistry, VerificationError, VotingTerms,
};
use quorate_nullables::{NullClock, NullFeeLedger};
use quorate_types::{
    Amount, Bytes32, ExecutableKind, Identity, ProposalId, ProposalRef, ProposalType, Ratio,
    Timestamp,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Weak};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const START: u64 = 1_700_000_000;

type Engine = GovernanceEngine<NullClock, NullFeeLedger>;

struct Harness {
    engine: Arc<Engine>,
    clock: NullClock,
    ledger: NullFeeLedger,
}

fn admin() -> Identity {
    Identity::new("admin")
}

fn alice() -> Identity {
    Identity::new("alice")
}

fn ratio(s: &str) -> Ratio {
    s.parse().unwrap()
}

fn fee() -> Amount {
    GovernanceConfig::default().proposal_fee
}

fn label(s: &str) -> Bytes32 {
    Bytes32::from_ascii(s).unwrap()
}

fn options(n: usize) -> Vec<Bytes32> {
    let mut out = vec![label("option")];
    out.extend((1..n).map(|i| label(&format!("option-{}", i))));
    out.truncate(n);
    out
}

fn terms(min_votes: &str, min_agreement: &str, delay: u64, min: u64, max: u64) -> VotingTerms {
    VotingTerms {
        min_votes: ratio(min_votes),
        min_agreement: ratio(min_agreement),
        start_delay_secs: delay,
        min_voting_duration_secs: min,
        max_voting_duration_secs: max,
    }
}

fn compliant_terms() -> VotingTerms {
    terms("0.5", "0.6", 30, 121, 1199)
}

fn template(name: &str, executable: ExecutableKind) -> Template {
    Template {
        name: name.into(),
        factory: None,
        executable,
        min_votes: ratio("0.4"),
        min_agreement: ratio("0.6"),
        opinion_scales: BTreeSet::from([0, 1, 2, 3, 4]),
        min_voting_duration_secs: 120,
        max_voting_duration_secs: 1200,
        min_start_delay_secs: 0,
        max_start_delay_secs: 60,
    }
}

fn harness() -> Harness {
    harness_with(&GovernanceConfig::default())
}

fn harness_with(config: &GovernanceConfig) -> Harness {
    let registry = TemplateRegistry::new(admin());
    registry
        .add_template(
            &admin(),
            ProposalType::PLAIN_TEXT,
            template("plaintext", ExecutableKind::NonExecutable),
        )
        .unwrap();
    registry
        .add_template(
            &admin(),
            ProposalType::DELEGATECALL_EXECUTABLE,
            template("delegatecall", ExecutableKind::Delegatecall),
        )
        .unwrap();

    let clock = NullClock::new(START);
    let ledger = NullFeeLedger::new();
    ledger.fund(&alice(), Amount::from_tokens(10_000));

    let engine = GovernanceEngine::new(
        config,
        admin(),
        Arc::new(registry),
        clock.clone(),
        ledger.clone(),
    );
    Harness {
        engine: Arc::new(engine),
        clock,
        ledger,
    }
}

fn plaintext(h: &Harness, options: Vec<Bytes32>, terms: VotingTerms) -> PlainTextProposal {
    let body = ProposalBody::new("plaintext", "plaintext-descr", options, terms);
    PlainTextProposal::new(alice(), body, Some(h.engine.templates())).unwrap()
}

/// Deploy directly as alice and submit with the exact fee.
fn submit<P: Proposal + 'static>(h: &Harness, proposal: P) -> Result<ProposalId, GovernanceError> {
    let handle = h.engine.deploy(&alice(), proposal);
    h.engine.create_proposal(&alice(), handle, fee())
}

fn verification(err: GovernanceError) -> VerificationError {
    err.verification()
        .cloned()
        .unwrap_or_else(|| panic!("expected a verification error, got {}", err))
}

// ---------------------------------------------------------------------------
// 1. Fee
// ---------------------------------------------------------------------------

#[test]
fn fee_must_be_exact() {
    let h = harness();
    let handle = h.engine.deploy(&alice(), plaintext(&h, options(1), compliant_terms()));
    let one = Amount::new(1);

    for paid in [
        Amount::ZERO,
        fee().checked_sub(one).unwrap(),
        fee().checked_add(one).unwrap(),
    ] {
        let err = h.engine.create_proposal(&alice(), handle, paid).unwrap_err();
        assert!(
            matches!(err, GovernanceError::FeeMismatch { paid: p, expected } if p == paid && expected == fee()),
            "paid {}: {}",
            paid,
            err
        );
        assert!(err.to_string().starts_with("paid proposal fee is wrong"));
    }
    assert_eq!(h.engine.last_proposal_id(), ProposalId::NONE);
    assert!(h.ledger.treasury().is_zero());

    let id = h.engine.create_proposal(&alice(), handle, fee()).unwrap();
    assert_eq!(id, ProposalId::new(1));
    assert_eq!(h.ledger.treasury(), fee());
    assert_eq!(h.ledger.collections(), vec![(alice(), fee())]);
}

#[test]
fn fee_is_checked_before_deployment_lookup() {
    let h = harness();
    let missing = ProposalRef::new(99);
    assert!(matches!(
        h.engine.create_proposal(&alice(), missing, Amount::ZERO),
        Err(GovernanceError::FeeMismatch { .. })
    ));
    assert!(matches!(
        h.engine.create_proposal(&alice(), missing, fee()),
        Err(GovernanceError::ProposalNotDeployed(r)) if r == missing
    ));
}

#[test]
fn admin_may_change_fee() {
    let h = harness();
    let new_fee = Amount::from_tokens(5);
    assert!(matches!(
        h.engine.set_proposal_fee(&alice(), new_fee),
        Err(GovernanceError::NotAdmin(_))
    ));
    assert_eq!(h.engine.proposal_fee(), fee());

    h.engine.set_proposal_fee(&admin(), new_fee).unwrap();
    assert_eq!(h.engine.proposal_fee(), new_fee);

    let handle = h.engine.deploy(&alice(), plaintext(&h, options(1), compliant_terms()));
    assert!(h.engine.create_proposal(&alice(), handle, fee()).is_err());
    assert!(h.engine.create_proposal(&alice(), handle, new_fee).is_ok());
}

// ---------------------------------------------------------------------------
// 2. Registration
// ---------------------------------------------------------------------------

#[test]
fn admitted_proposal_params_are_recorded() {
    let h = harness();
    let opts = options(10);
    let handle = h.engine.deploy(&alice(), plaintext(&h, opts.clone(), compliant_terms()));
    let id = h.engine.create_proposal(&alice(), handle, fee()).unwrap();
    assert_eq!(id, ProposalId::new(1));
    assert_eq!(h.engine.last_proposal_id(), id);

    let params = h.engine.proposal_params(id).unwrap();
    assert_eq!(params.id, id);
    assert_eq!(params.proposal_type, ProposalType::PLAIN_TEXT);
    assert_eq!(params.executable, ExecutableKind::NonExecutable);
    assert_eq!(params.min_votes, ratio("0.5"));
    assert_eq!(params.min_agreement, ratio("0.6"));
    assert_eq!(params.opinion_scales, vec![0, 1, 2, 3, 4]);
    assert_eq!(params.proposal_ref, handle);
    assert_eq!(params.options.len(), 10);
    assert_eq!(params.options, opts);
    assert_eq!(
        params.options[0].to_string(),
        "0x6f7074696f6e0000000000000000000000000000000000000000000000000000"
    );

    assert!(params.voting_start_time >= Timestamp::new(START));
    assert_eq!(params.voting_start_time, Timestamp::new(START + 30));
    assert_eq!(
        params.voting_min_end_time.as_secs(),
        params.voting_start_time.as_secs() + 121
    );
    assert_eq!(
        params.voting_max_end_time.as_secs(),
        params.voting_start_time.as_secs() + 1199
    );
}

#[test]
fn voting_window_follows_the_clock() {
    let h = harness();
    let first = submit(&h, plaintext(&h, options(1), compliant_terms())).unwrap();
    h.clock.advance(1_000);
    let second = submit(&h, plaintext(&h, options(1), compliant_terms())).unwrap();

    let a = h.engine.proposal_params(first).unwrap();
    let b = h.engine.proposal_params(second).unwrap();
    assert_eq!(b.voting_start_time.as_secs() - a.voting_start_time.as_secs(), 1_000);

    let opens = b.voting_start_time;
    assert!(!b.is_voting_open(Timestamp::new(opens.as_secs() - 1)));
    assert!(b.is_voting_open(opens));
    assert!(!b.may_finalize(opens));
    assert!(b.may_finalize(b.voting_min_end_time));
    assert!(!b.is_voting_open(b.voting_max_end_time));
}

#[test]
fn ids_are_sequential_without_gaps_after_failures() {
    let h = harness();
    assert_eq!(submit(&h, plaintext(&h, options(1), compliant_terms())).unwrap(), ProposalId::new(1));

    // Rejected: no options.
    assert!(submit(&h, plaintext(&h, vec![], compliant_terms())).is_err());
    // Rejected: wrong fee.
    let handle = h.engine.deploy(&alice(), plaintext(&h, options(1), compliant_terms()));
    assert!(h.engine.create_proposal(&alice(), handle, Amount::ZERO).is_err());

    assert_eq!(h.engine.last_proposal_id(), ProposalId::new(1));
    assert_eq!(h.engine.create_proposal(&alice(), handle, fee()).unwrap(), ProposalId::new(2));
}

#[test]
fn lookups_are_stable_and_absent_ids_are_none() {
    let h = harness();
    let id = submit(&h, plaintext(&h, options(2), compliant_terms())).unwrap();
    let first = h.engine.proposal_params(id).unwrap();
    h.clock.advance(500);
    assert_eq!(h.engine.proposal_params(id).unwrap(), first);

    assert!(h.engine.proposal_params(ProposalId::NONE).is_none());
    assert!(h.engine.proposal_params(ProposalId::new(2)).is_none());
}

#[test]
fn same_deployment_may_be_submitted_twice() {
    let h = harness();
    let handle = h.engine.deploy(&alice(), plaintext(&h, options(1), compliant_terms()));
    let a = h.engine.create_proposal(&alice(), handle, fee()).unwrap();
    let b = h.engine.create_proposal(&alice(), handle, fee()).unwrap();
    assert_ne!(a, b);
    assert_eq!(
        h.engine.proposal_params(a).unwrap().proposal_ref,
        h.engine.proposal_params(b).unwrap().proposal_ref
    );
}

// ---------------------------------------------------------------------------
// 3. Submission-time validation
// ---------------------------------------------------------------------------

#[test]
fn options_are_checked_at_submission() {
    let h = harness();

    let err = submit(&h, plaintext(&h, vec![], compliant_terms())).unwrap_err();
    assert_eq!(verification(err), VerificationError::OptionsEmpty);

    let eleven = options(11);
    let err = submit(&h, plaintext(&h, eleven.clone(), compliant_terms())).unwrap_err();
    assert_eq!(
        verification(err),
        VerificationError::TooManyOptions { count: 11, max: 10 }
    );

    let mut ten = eleven;
    ten.truncate(10);
    let id = submit(&h, plaintext(&h, ten, compliant_terms())).unwrap();
    assert_eq!(id, ProposalId::new(1));
}

#[test]
fn unchecked_construction_is_caught_at_submission() {
    let h = harness();
    let cases = [
        (terms("0.4", "0.6", 0, 120, 1201), VerificationError::DurationTooLong),
        (terms("0.4", "0.6", 0, 119, 1201), VerificationError::DurationTooShort),
        (terms("0.4", "0.6", 0, 501, 500), VerificationError::EndOrderInvalid),
        (terms("0.4", "0.6", 61, 120, 1200), VerificationError::StartDelayTooLong),
        (terms("0.4", "0.599", 60, 120, 1200), VerificationError::QuorumTooSmall),
        (terms("0.4", "1.01", 60, 120, 1200), VerificationError::QuorumExceedsMax),
        (terms("0.3", "0.6", 60, 120, 1200), VerificationError::TurnoutTooSmall),
        (terms("1.5", "0.6", 60, 120, 1200), VerificationError::TurnoutExceedsMax),
    ];
    for (terms, expected) in cases {
        let body = ProposalBody::new("plaintext", "d", options(1), terms.clone());
        let unchecked = PlainTextProposal::new(alice(), body, None).unwrap();
        let err = submit(&h, unchecked).unwrap_err();
        assert_eq!(verification(err), expected, "terms {:?}", terms);
    }
    assert_eq!(h.engine.last_proposal_id(), ProposalId::NONE);
    assert!(h.ledger.treasury().is_zero());
}

#[test]
fn missing_template_fails_closed() {
    let h = harness();
    let body = ProposalBody::new("refund", "d", options(1), compliant_terms());
    let p = ExplicitProposal::new(
        alice(),
        ProposalType::CALL_EXECUTABLE,
        ExecutableKind::Call,
        body,
        None,
    )
    .unwrap();
    assert_eq!(
        verification(submit(&h, p).unwrap_err()),
        VerificationError::TemplateNotFound(ProposalType::CALL_EXECUTABLE)
    );
}

#[test]
fn executable_kind_must_match_template() {
    let h = harness();
    let body = ProposalBody::new("x", "d", options(1), compliant_terms());
    let p = ExplicitProposal::new(
        alice(),
        ProposalType::PLAIN_TEXT,
        ExecutableKind::Delegatecall,
        body,
        None,
    )
    .unwrap();
    assert!(matches!(
        verification(submit(&h, p).unwrap_err()),
        VerificationError::ExecutableMismatch { .. }
    ));
}

#[test]
fn executable_variants_are_admitted_under_their_template() {
    let h = harness();
    let body = ProposalBody::new("log", "emit", options(2), compliant_terms());
    let logging = ExecLoggingProposal::new(alice(), body, "hello", Some(h.engine.templates())).unwrap();
    let id = submit(&h, logging).unwrap();
    let params = h.engine.proposal_params(id).unwrap();
    assert_eq!(params.proposal_type, ProposalType::DELEGATECALL_EXECUTABLE);
    assert_eq!(params.executable, ExecutableKind::Delegatecall);

    h.engine
        .templates()
        .add_template(
            &admin(),
            ProposalType::SLASHING_REFUND,
            template("slashing-refund", ExecutableKind::Delegatecall),
        )
        .unwrap();
    let refund = SlashingRefundProposal::new(
        alice(),
        3,
        "validator 3 slashed by a client bug",
        compliant_terms(),
        Some(h.engine.templates()),
    )
    .unwrap();
    let id = submit(&h, refund).unwrap();
    let params = h.engine.proposal_params(id).unwrap();
    assert_eq!(params.proposal_type, ProposalType::SLASHING_REFUND);
    assert_eq!(params.options.len(), 6);
    assert_eq!(params.options[0], label("0%"));
}

#[test]
fn submission_uses_the_live_template() {
    let h = harness();
    let checked = plaintext(&h, options(1), terms("0.4", "0.6", 0, 120, 1200));
    let handle = h.engine.deploy(&alice(), checked);

    let mut stricter = template("plaintext-v2", ExecutableKind::NonExecutable);
    stricter.min_agreement = ratio("0.7");
    h.engine
        .templates()
        .add_template(&admin(), ProposalType::PLAIN_TEXT, stricter)
        .unwrap();

    let err = h.engine.create_proposal(&alice(), handle, fee()).unwrap_err();
    assert_eq!(verification(err), VerificationError::QuorumTooSmall);
    assert!(matches!(
        h.engine.audit(handle),
        Err(GovernanceError::Verification(VerificationError::QuorumTooSmall))
    ));
}

#[test]
fn option_limit_cannot_be_raised_by_config() {
    let loose = GovernanceConfig {
        max_options: 50,
        ..GovernanceConfig::default()
    };
    let h = harness_with(&loose);
    let err = submit(&h, plaintext(&h, options(11), compliant_terms())).unwrap_err();
    assert_eq!(
        verification(err),
        VerificationError::TooManyOptions { count: 11, max: 10 }
    );

    let tight = GovernanceConfig {
        max_options: 4,
        ..GovernanceConfig::default()
    };
    let h = harness_with(&tight);
    let err = submit(&h, plaintext(&h, options(5), compliant_terms())).unwrap_err();
    assert_eq!(
        verification(err),
        VerificationError::TooManyOptions { count: 5, max: 4 }
    );
    assert!(submit(&h, plaintext(&h, options(4), compliant_terms())).is_ok());
}

// ---------------------------------------------------------------------------
// 4. Ledger
// ---------------------------------------------------------------------------

#[test]
fn refused_payment_leaves_no_trace() {
    let h = harness();
    let bob = Identity::new("bob");
    let handle = h.engine.deploy(&bob, plaintext(&h, options(1), compliant_terms()));

    let err = h.engine.create_proposal(&bob, handle, fee()).unwrap_err();
    assert!(matches!(err, GovernanceError::Ledger(_)));
    assert_eq!(h.engine.last_proposal_id(), ProposalId::NONE);
    assert!(h.engine.proposal_params(ProposalId::new(1)).is_none());

    h.ledger.set_unavailable(true);
    assert!(h.engine.create_proposal(&alice(), handle, fee()).is_err());
    h.ledger.set_unavailable(false);

    assert_eq!(h.engine.create_proposal(&alice(), handle, fee()).unwrap(), ProposalId::new(1));
}

#[test]
fn rejected_submissions_are_not_charged() {
    let h = harness();
    let before = h.ledger.balance(&alice());
    assert!(submit(&h, plaintext(&h, vec![], compliant_terms())).is_err());
    assert_eq!(h.ledger.balance(&alice()), before);
}

// ---------------------------------------------------------------------------
// 5. Factory origin
// ---------------------------------------------------------------------------

fn factory_harness() -> (Harness, PlainTextProposalFactory<NullClock, NullFeeLedger>) {
    let h = harness();
    let factory = PlainTextProposalFactory::new(Arc::clone(&h.engine));
    let mut t = template("plaintext", ExecutableKind::NonExecutable);
    t.factory = Some(factory.identity().clone());
    h.engine
        .templates()
        .add_template(&admin(), ProposalType::PLAIN_TEXT, t)
        .unwrap();
    (h, factory)
}

#[test]
fn factory_records_caller_as_owner() {
    let (h, factory) = factory_harness();
    let id = factory
        .create(&alice(), "plaintext", "plaintext-descr", options(1), compliant_terms(), fee())
        .unwrap();
    assert_eq!(id, ProposalId::new(1));

    let params = h.engine.proposal_params(id).unwrap();
    let proposal = h.engine.proposal(params.proposal_ref).unwrap();
    assert_eq!(proposal.owner(), &alice());
    assert_eq!(proposal.name(), "plaintext");
    assert_eq!(proposal.description(), "plaintext-descr");
    assert_eq!(
        h.engine.deployment_origin(params.proposal_ref),
        Some(DeployOrigin::Factory {
            factory: factory.identity().clone()
        })
    );
    assert!(h.engine.audit(params.proposal_ref).is_ok());
}

#[test]
fn direct_deployment_fails_origin_check() {
    let (h, factory) = factory_harness();
    // Construction against the registry succeeds; origin is unknown there.
    let direct = plaintext(&h, options(1), compliant_terms());
    let err = submit(&h, direct).unwrap_err();
    assert_eq!(verification(err), VerificationError::OriginVerificationFailed);

    // Deploying under the factory's name does not make it factory-made.
    let spoof = plaintext(&h, options(1), compliant_terms());
    let handle = h.engine.deploy(factory.identity(), spoof);
    let err = h.engine.create_proposal(&alice(), handle, fee()).unwrap_err();
    assert_eq!(verification(err), VerificationError::OriginVerificationFailed);
    assert_eq!(h.engine.last_proposal_id(), ProposalId::NONE);
}

#[test]
fn failed_factory_create_deploys_nothing() {
    let (h, factory) = factory_harness();
    let err = factory
        .create(&alice(), "p", "d", vec![], compliant_terms(), fee())
        .unwrap_err();
    assert_eq!(verification(err), VerificationError::OptionsEmpty);
    assert!(h.engine.proposal(ProposalRef::new(1)).is_none());

    let err = factory
        .create(&alice(), "p", "d", options(1), terms("0.4", "0.6", 0, 119, 1201), fee())
        .unwrap_err();
    assert_eq!(verification(err), VerificationError::DurationTooShort);

    let id = factory
        .create(&alice(), "p", "d", options(1), compliant_terms(), fee())
        .unwrap();
    assert_eq!(id, ProposalId::new(1));
    assert_eq!(h.engine.proposal_params(id).unwrap().proposal_ref, ProposalRef::new(1));
}

#[test]
fn another_factory_is_not_the_approved_one() {
    let (h, _approved) = factory_harness();
    let other = PlainTextProposalFactory::new(Arc::clone(&h.engine));
    let err = other
        .create(&alice(), "p", "d", options(1), compliant_terms(), fee())
        .unwrap_err();
    assert_eq!(verification(err), VerificationError::OriginVerificationFailed);
}

// ---------------------------------------------------------------------------
// 6. Adversarial proposals
// ---------------------------------------------------------------------------

/// Answers honestly on the first read and lies on every read after.
#[derive(Debug)]
struct ShapeShifter {
    owner: Identity,
    honest: ProposalBody,
    lying: ProposalBody,
    reads: AtomicUsize,
}

impl Proposal for ShapeShifter {
    fn proposal_type(&self) -> ProposalType {
        ProposalType::PLAIN_TEXT
    }

    fn executable(&self) -> ExecutableKind {
        ExecutableKind::NonExecutable
    }

    fn body(&self) -> &ProposalBody {
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            &self.honest
        } else {
            &self.lying
        }
    }

    fn owner(&self) -> &Identity {
        &self.owner
    }
}

#[test]
fn registered_record_is_the_validated_read() {
    let h = harness();
    let shifter = ShapeShifter {
        owner: alice(),
        honest: ProposalBody::new("ok", "d", options(3), compliant_terms()),
        lying: ProposalBody::new("evil", "d", options(1), terms("0.01", "0.01", 0, 1, 10_000_000)),
        reads: AtomicUsize::new(0),
    };
    let handle = h.engine.deploy(&alice(), shifter);
    let id = h.engine.create_proposal(&alice(), handle, fee()).unwrap();

    let params = h.engine.proposal_params(id).unwrap();
    assert_eq!(params.options, options(3));
    assert_eq!(params.min_votes, ratio("0.5"));
    assert_eq!(params.min_agreement, ratio("0.6"));
    assert_eq!(
        params.voting_max_end_time.as_secs() - params.voting_start_time.as_secs(),
        1199
    );

    // Later reads see the lie, and it does not pass.
    assert_eq!(
        h.engine.audit(handle).unwrap_err().verification(),
        Some(&VerificationError::DurationTooShort)
    );
}

/// Calls back into the engine from every accessor read.
#[derive(Debug)]
struct Reentrant {
    owner: Identity,
    body: ProposalBody,
    engine: Weak<Engine>,
    callbacks: Arc<AtomicUsize>,
}

impl Reentrant {
    fn call_back(&self) {
        if let Some(engine) = self.engine.upgrade() {
            let _ = engine.last_proposal_id();
            let _ = engine.proposal_params(ProposalId::new(1));
            let _ = engine.proposal(ProposalRef::new(1));
            let _ = engine.stats();
            let _ = engine.templates().get_template(ProposalType::PLAIN_TEXT);
            self.callbacks.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Proposal for Reentrant {
    fn proposal_type(&self) -> ProposalType {
        self.call_back();
        ProposalType::PLAIN_TEXT
    }

    fn executable(&self) -> ExecutableKind {
        self.call_back();
        ExecutableKind::NonExecutable
    }

    fn body(&self) -> &ProposalBody {
        self.call_back();
        &self.body
    }

    fn owner(&self) -> &Identity {
        &self.owner
    }
}

/// Run `f` on its own thread and fail instead of hanging.
fn within_timeout<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("engine call did not return; proposal callback deadlocked")
}

#[test]
fn proposal_callbacks_into_engine_do_not_deadlock() {
    let h = harness();
    let callbacks = Arc::new(AtomicUsize::new(0));
    let proposal = Reentrant {
        owner: alice(),
        body: ProposalBody::new("reentrant", "d", options(2), compliant_terms()),
        engine: Arc::downgrade(&h.engine),
        callbacks: Arc::clone(&callbacks),
    };
    let handle = h.engine.deploy(&alice(), proposal);

    let engine = Arc::clone(&h.engine);
    let id = within_timeout(move || engine.create_proposal(&alice(), handle, fee())).unwrap();
    assert_eq!(id, ProposalId::new(1));
    assert_eq!(h.engine.proposal_params(id).unwrap().options, options(2));

    assert!(callbacks.load(Ordering::SeqCst) > 0);

    let engine = Arc::clone(&h.engine);
    within_timeout(move || engine.audit(handle)).unwrap();

    // Other callers are not blocked afterwards.
    let engine = Arc::clone(&h.engine);
    within_timeout(move || {
        engine
            .templates()
            .add_template(
                &admin(),
                ProposalType::PLAIN_TEXT,
                template("plaintext-v2", ExecutableKind::NonExecutable),
            )
            .unwrap();
        engine.last_proposal_id()
    });
    assert_eq!(
        submit(&h, plaintext(&h, options(1), compliant_terms())).unwrap(),
        ProposalId::new(2)
    );
}

// ---------------------------------------------------------------------------
// 7. Stats and concurrency
// ---------------------------------------------------------------------------

#[test]
fn stats_count_outcomes() {
    let h = harness();
    submit(&h, plaintext(&h, options(1), compliant_terms())).unwrap();
    let _ = submit(&h, plaintext(&h, vec![], compliant_terms()));
    let _ = h.engine.create_proposal(&alice(), ProposalRef::new(42), fee());

    let stats = h.engine.stats();
    assert_eq!(stats["proposals_submitted"], 3);
    assert_eq!(stats["proposals_admitted"], 1);
    assert_eq!(stats["proposals_rejected"], 2);
}

#[test]
fn concurrent_submissions_get_unique_dense_ids() {
    let h = harness();
    let handle = h.engine.deploy(&alice(), plaintext(&h, options(1), compliant_terms()));

    let mut ids: Vec<ProposalId> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&h.engine);
                s.spawn(move || {
                    (0..10)
                        .map(|_| engine.create_proposal(&alice(), handle, fee()).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect()
    });
    ids.sort();
    let expected: Vec<ProposalId> = (1..=80).map(ProposalId::new).collect();
    assert_eq!(ids, expected);
    assert_eq!(h.engine.last_proposal_id(), ProposalId::new(80));
}

#[test]
fn template_changes_do_not_interleave_with_admission() {
    let h = harness();
    let handle = h.engine.deploy(&alice(), plaintext(&h, options(1), compliant_terms()));

    std::thread::scope(|s| {
        let engine = Arc::clone(&h.engine);
        s.spawn(move || {
            for i in 0..50 {
                let mut t = template("plaintext", ExecutableKind::NonExecutable);
                // Alternate between an envelope the proposal fits and one it does not.
                if i % 2 == 1 {
                    t.min_agreement = ratio("0.9");
                }
                engine
                    .templates()
                    .add_template(&admin(), ProposalType::PLAIN_TEXT, t)
                    .unwrap();
            }
        });
        for _ in 0..50 {
            if let Ok(id) = h.engine.create_proposal(&alice(), handle, fee()) {
                assert_eq!(h.engine.proposal_params(id).unwrap().min_agreement, ratio("0.6"));
            }
        }
    });

    let admitted = h.engine.last_proposal_id().as_u64();
    assert_eq!(h.engine.stats()["proposals_admitted"], admitted);
    assert_eq!(
        h.ledger.treasury().raw(),
        fee().raw() * u128::from(admitted)
    );
}
