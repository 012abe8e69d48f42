//! Trusted proposal factory.
//!
//! A template may name a factory; proposals of that type are then admissible
//! only if that factory deployed them. The factory builds the proposal with the
//! external caller as owner and submits it in the same step, so construction
//! and admission are never observable apart.

use crate::deployment::FactoryCredential;
use crate::engine::GovernanceEngine;
use crate::error::GovernanceError;
use crate::proposal::{PlainTextProposal, ProposalBody, VotingTerms};
use quorate_types::{Amount, Bytes32, Clock, FeeLedger, Identity, ProposalId};
use std::sync::Arc;

/// Deploys and submits [`PlainTextProposal`]s.
pub struct PlainTextProposalFactory<C: Clock, L: FeeLedger> {
    governance: Arc<GovernanceEngine<C, L>>,
    credential: FactoryCredential,
}

impl<C: Clock, L: FeeLedger> PlainTextProposalFactory<C, L> {
    /// Install a new factory on `governance`, which mints its identity.
    pub fn new(governance: Arc<GovernanceEngine<C, L>>) -> Self {
        let credential = governance.mint_factory();
        Self {
            governance,
            credential,
        }
    }

    /// The identity templates name to require this factory.
    pub fn identity(&self) -> &Identity {
        self.credential.identity()
    }

    /// Build a proposal owned by `caller` and submit it with `paid_fee`.
    ///
    /// Either both steps succeed and the new id is returned, or neither leaves
    /// a trace.
    pub fn create(
        &self,
        caller: &Identity,
        name: impl Into<String>,
        description: impl Into<String>,
        options: Vec<Bytes32>,
        terms: VotingTerms,
        paid_fee: Amount,
    ) -> Result<ProposalId, GovernanceError> {
        let body = ProposalBody::new(name, description, options, terms);
        let proposal = PlainTextProposal::new(
            caller.clone(),
            body,
            Some(self.governance.templates().as_ref()),
        )?;
        let (id, proposal_ref) = self.governance.create_from_factory(
            &self.credential,
            caller,
            Arc::new(proposal),
            paid_fee,
        )?;
        tracing::debug!(factory = %self.identity(), %caller, %id, %proposal_ref, "factory proposal created");
        Ok(id)
    }
}
