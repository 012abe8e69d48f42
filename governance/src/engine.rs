//! Governance engine: the admission checkpoint proper.
//!
//! A proposal is read once, through [`Proposal::snapshot`], while the engine
//! holds no lock, so proposal code may call back into the engine freely.
//! Everything after that read is one critical section: the template read lock
//! is taken first and held until the record is written, then the engine state
//! mutex. Nothing takes them in the other order, and `add_template` needs the
//! write lock, so a template cannot change between "read template",
//! "validate" and "write ProposalParams".

use crate::config::GovernanceConfig;
use crate::deployment::{DeployOrigin, DeploymentTable, FactoryCredential};
use crate::error::GovernanceError;
use crate::params::ProposalParams;
use crate::proposal::{Proposal, ProposalSnapshot};
use crate::template::{TemplateMap, TemplateRegistry};
use crate::validation::{self, Checkpoint, MAX_OPTIONS};
use quorate_types::{Amount, Clock, FeeLedger, Identity, ProposalId, ProposalRef, Timestamp};
use quorate_utils::StatsCounter;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const STAT_SUBMITTED: &str = "proposals_submitted";
pub const STAT_ADMITTED: &str = "proposals_admitted";
pub const STAT_REJECTED: &str = "proposals_rejected";

struct EngineState {
    proposal_fee: Amount,
    deployments: DeploymentTable,
    proposals: BTreeMap<ProposalId, ProposalParams>,
    last_proposal_id: ProposalId,
}

pub struct GovernanceEngine<C: Clock, L: FeeLedger> {
    admin: Identity,
    templates: Arc<TemplateRegistry>,
    clock: C,
    ledger: L,
    max_options: usize,
    state: Mutex<EngineState>,
    stats: StatsCounter,
}

impl<C: Clock, L: FeeLedger> GovernanceEngine<C, L> {
    pub fn new(
        config: &GovernanceConfig,
        admin: Identity,
        templates: Arc<TemplateRegistry>,
        clock: C,
        ledger: L,
    ) -> Self {
        Self {
            admin,
            templates,
            clock,
            ledger,
            // A config built in code skips `validate`; never exceed the hard limit.
            max_options: config.max_options.clamp(1, MAX_OPTIONS),
            state: Mutex::new(EngineState {
                proposal_fee: config.proposal_fee,
                deployments: DeploymentTable::default(),
                proposals: BTreeMap::new(),
                last_proposal_id: ProposalId::NONE,
            }),
            stats: StatsCounter::new(&[STAT_SUBMITTED, STAT_ADMITTED, STAT_REJECTED]),
        }
    }

    pub fn templates(&self) -> &Arc<TemplateRegistry> {
        &self.templates
    }

    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    pub fn proposal_fee(&self) -> Amount {
        self.lock().proposal_fee
    }

    pub fn set_proposal_fee(&self, caller: &Identity, fee: Amount) -> Result<(), GovernanceError> {
        if caller != &self.admin {
            return Err(GovernanceError::NotAdmin(caller.clone()));
        }
        let mut state = self.lock();
        tracing::info!(old = %state.proposal_fee, new = %fee, "proposal fee changed");
        state.proposal_fee = fee;
        Ok(())
    }

    // ── Deployment environment ─────────────────────────────────────────

    /// Deploy a proposal object directly. Its origin is recorded as `deployer`.
    ///
    /// Deployment is free and entries are never removed; limiting who may
    /// deploy, and how much, is the host's concern.
    pub fn deploy<P: Proposal + 'static>(&self, deployer: &Identity, proposal: P) -> ProposalRef {
        let origin = DeployOrigin::Direct {
            deployer: deployer.clone(),
        };
        let handle = self.lock().deployments.insert(Arc::new(proposal), origin);
        tracing::debug!(%handle, %deployer, "proposal deployed");
        handle
    }

    pub fn proposal(&self, handle: ProposalRef) -> Option<Arc<dyn Proposal>> {
        self.deployed(handle).map(|(proposal, _)| proposal)
    }

    pub fn deployment_origin(&self, handle: ProposalRef) -> Option<DeployOrigin> {
        self.deployed(handle).map(|(_, origin)| origin)
    }

    /// The deployed object and its origin, copied out so no lock is held
    /// while proposal code runs.
    fn deployed(&self, handle: ProposalRef) -> Option<(Arc<dyn Proposal>, DeployOrigin)> {
        self.lock()
            .deployments
            .get(&handle)
            .map(|d| (Arc::clone(&d.proposal), d.origin.clone()))
    }

    pub(crate) fn mint_factory(&self) -> FactoryCredential {
        let credential = self.lock().deployments.mint_factory();
        tracing::info!(factory = %credential.identity(), "factory installed");
        credential
    }

    // ── Submission ─────────────────────────────────────────────────────

    /// Submit a deployed proposal for admission, paying `paid_fee`.
    ///
    /// Re-validates against the live templates regardless of any check done at
    /// construction. On any error nothing is stored, nothing is charged and no
    /// id is consumed.
    pub fn create_proposal(
        &self,
        payer: &Identity,
        proposal_ref: ProposalRef,
        paid_fee: Amount,
    ) -> Result<ProposalId, GovernanceError> {
        self.stats.increment(STAT_SUBMITTED);

        let result = match self.deployed(proposal_ref) {
            Some((proposal, origin)) => {
                let snapshot = proposal.snapshot();
                let templates = self.templates.read();
                let mut state = self.lock();
                self.admit(
                    &mut state,
                    &templates,
                    payer,
                    proposal_ref,
                    snapshot,
                    &origin,
                    paid_fee,
                )
            }
            None => Self::check_fee(&self.lock(), paid_fee)
                .and_then(|()| Err(GovernanceError::ProposalNotDeployed(proposal_ref))),
        };
        self.record_outcome(payer, proposal_ref, result.as_ref().copied());
        result
    }

    /// Deploy and admit in one step on behalf of a factory. Nothing is
    /// deployed unless admission succeeds.
    pub(crate) fn create_from_factory(
        &self,
        credential: &FactoryCredential,
        payer: &Identity,
        proposal: Arc<dyn Proposal>,
        paid_fee: Amount,
    ) -> Result<(ProposalId, ProposalRef), GovernanceError> {
        self.stats.increment(STAT_SUBMITTED);

        let snapshot = proposal.snapshot();
        let origin = DeployOrigin::Factory {
            factory: credential.identity().clone(),
        };

        let templates = self.templates.read();
        let mut state = self.lock();
        let proposal_ref = state.deployments.next_ref();
        let result = self
            .admit(
                &mut state,
                &templates,
                payer,
                proposal_ref,
                snapshot,
                &origin,
                paid_fee,
            )
            .map(|id| {
                let deployed = state.deployments.insert(Arc::clone(&proposal), origin);
                debug_assert_eq!(deployed, proposal_ref);
                (id, deployed)
            });
        drop(state);
        drop(templates);
        self.record_outcome(payer, proposal_ref, result.as_ref().map(|(id, _)| *id));
        result
    }

    fn check_fee(state: &EngineState, paid_fee: Amount) -> Result<(), GovernanceError> {
        if paid_fee != state.proposal_fee {
            return Err(GovernanceError::FeeMismatch {
                paid: paid_fee,
                expected: state.proposal_fee,
            });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn admit(
        &self,
        state: &mut EngineState,
        templates: &TemplateMap,
        payer: &Identity,
        proposal_ref: ProposalRef,
        snapshot: ProposalSnapshot,
        origin: &DeployOrigin,
        paid_fee: Amount,
    ) -> Result<ProposalId, GovernanceError> {
        Self::check_fee(state, paid_fee)?;

        // Validate and store this one copy only.
        let template = validation::verify_in(
            templates,
            &snapshot,
            Checkpoint::Admission {
                origin,
                max_options: self.max_options,
            },
        )?;

        let id = state
            .last_proposal_id
            .next()
            .ok_or(GovernanceError::IdsExhausted)?;
        let (start, min_end, max_end) = self.voting_window(&snapshot)?;
        let terms = snapshot.body.terms;
        let params = ProposalParams {
            id,
            proposal_type: snapshot.proposal_type,
            executable: snapshot.executable,
            min_votes: terms.min_votes,
            min_agreement: terms.min_agreement,
            opinion_scales: template.opinion_scales.iter().copied().collect(),
            proposal_ref,
            options: snapshot.body.options,
            voting_start_time: start,
            voting_min_end_time: min_end,
            voting_max_end_time: max_end,
        };

        // Last fallible step; a refused payment leaves no trace.
        self.ledger.collect(payer, paid_fee)?;

        state.last_proposal_id = id;
        state.proposals.insert(id, params);
        Ok(id)
    }

    /// `(start, min_end, max_end)` for a proposal admitted now.
    fn voting_window(
        &self,
        snapshot: &ProposalSnapshot,
    ) -> Result<(Timestamp, Timestamp, Timestamp), GovernanceError> {
        let terms = &snapshot.body.terms;
        let start = self
            .clock
            .now()
            .checked_add_secs(terms.start_delay_secs)
            .ok_or(GovernanceError::TimeOverflow)?;
        let min_end = start
            .checked_add_secs(terms.min_voting_duration_secs)
            .ok_or(GovernanceError::TimeOverflow)?;
        let max_end = start
            .checked_add_secs(terms.max_voting_duration_secs)
            .ok_or(GovernanceError::TimeOverflow)?;
        Ok((start, min_end, max_end))
    }

    fn record_outcome(
        &self,
        payer: &Identity,
        proposal_ref: ProposalRef,
        result: Result<ProposalId, &GovernanceError>,
    ) {
        match result {
            Ok(id) => {
                self.stats.increment(STAT_ADMITTED);
                tracing::info!(%id, %proposal_ref, %payer, "proposal admitted");
            }
            Err(e) => {
                self.stats.increment(STAT_REJECTED);
                tracing::warn!(%proposal_ref, %payer, error = %e, "proposal rejected");
            }
        }
    }

    // ── Lookups ────────────────────────────────────────────────────────

    pub fn proposal_params(&self, id: ProposalId) -> Option<ProposalParams> {
        self.lock().proposals.get(&id).cloned()
    }

    /// Most recently assigned id, [`ProposalId::NONE`] before the first admission.
    pub fn last_proposal_id(&self) -> ProposalId {
        self.lock().last_proposal_id
    }

    /// Re-run the admission predicate for a deployed proposal without
    /// submitting it. Charges nothing and changes nothing.
    pub fn audit(&self, proposal_ref: ProposalRef) -> Result<(), GovernanceError> {
        let (proposal, origin) = self
            .deployed(proposal_ref)
            .ok_or(GovernanceError::ProposalNotDeployed(proposal_ref))?;
        let snapshot = proposal.snapshot();
        let templates = self.templates.read();
        validation::verify_in(
            &templates,
            &snapshot,
            Checkpoint::Admission {
                origin: &origin,
                max_options: self.max_options,
            },
        )?;
        Ok(())
    }

    pub fn stats(&self) -> BTreeMap<&'static str, u64> {
        self.stats.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
