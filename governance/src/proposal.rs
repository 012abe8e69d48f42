//! Proposal objects and their common capability set.
//!
//! A proposal is untrusted: anyone can implement [`Proposal`] and make it say
//! whatever it likes. The engine therefore reads a proposal exactly once, via
//! [`Proposal::snapshot`], and validates and stores that same copy.

use crate::error::VerificationError;
use crate::template::TemplateRegistry;
use crate::validation::Checkpoint;
use quorate_types::{Bytes32, ExecutableKind, Identity, ProposalType, Ratio};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Thresholds and timing a proposal declares for its own vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingTerms {
    /// Minimum turnout.
    pub min_votes: Ratio,
    /// Minimum agreement among participating votes.
    pub min_agreement: Ratio,
    /// Seconds between admission and the start of voting.
    pub start_delay_secs: u64,
    pub min_voting_duration_secs: u64,
    pub max_voting_duration_secs: u64,
}

/// Everything a proposal declares apart from its type and executable kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalBody {
    pub name: String,
    pub description: String,
    pub options: Vec<Bytes32>,
    pub terms: VotingTerms,
}

impl ProposalBody {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        options: Vec<Bytes32>,
        terms: VotingTerms,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options,
            terms,
        }
    }
}

/// One consistent read of a proposal's declared parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalSnapshot {
    pub proposal_type: ProposalType,
    pub executable: ExecutableKind,
    pub body: ProposalBody,
}

/// The capability set every proposal exposes.
pub trait Proposal: Send + Sync + fmt::Debug {
    fn proposal_type(&self) -> ProposalType;

    fn executable(&self) -> ExecutableKind;

    fn body(&self) -> &ProposalBody;

    /// Who created the proposal (the external caller, when made through a factory).
    fn owner(&self) -> &Identity;

    fn name(&self) -> &str {
        &self.body().name
    }

    fn description(&self) -> &str {
        &self.body().description
    }

    fn options(&self) -> &[Bytes32] {
        &self.body().options
    }

    fn min_votes(&self) -> Ratio {
        self.body().terms.min_votes
    }

    fn min_agreement(&self) -> Ratio {
        self.body().terms.min_agreement
    }

    fn start_delay_secs(&self) -> u64 {
        self.body().terms.start_delay_secs
    }

    fn min_voting_duration_secs(&self) -> u64 {
        self.body().terms.min_voting_duration_secs
    }

    fn max_voting_duration_secs(&self) -> u64 {
        self.body().terms.max_voting_duration_secs
    }

    fn snapshot(&self) -> ProposalSnapshot {
        ProposalSnapshot {
            proposal_type: self.proposal_type(),
            executable: self.executable(),
            body: self.body().clone(),
        }
    }
}

/// Advisory construction-time check. Without a registry nothing is checked.
fn precheck(
    snapshot: &ProposalSnapshot,
    templates: Option<&TemplateRegistry>,
) -> Result<(), VerificationError> {
    let Some(registry) = templates else {
        return Ok(());
    };
    let result = registry.verify(snapshot, Checkpoint::Construction);
    tracing::debug!(
        proposal_type = %snapshot.proposal_type,
        name = %snapshot.body.name,
        ok = result.is_ok(),
        "construction-time template check"
    );
    result
}

/// A non-executable proposal carrying only text and options.
#[derive(Clone, Debug)]
pub struct PlainTextProposal {
    owner: Identity,
    body: ProposalBody,
}

impl PlainTextProposal {
    pub fn new(
        owner: Identity,
        body: ProposalBody,
        templates: Option<&TemplateRegistry>,
    ) -> Result<Self, VerificationError> {
        let proposal = Self { owner, body };
        precheck(&proposal.snapshot(), templates)?;
        Ok(proposal)
    }
}

impl Proposal for PlainTextProposal {
    fn proposal_type(&self) -> ProposalType {
        ProposalType::PLAIN_TEXT
    }

    fn executable(&self) -> ExecutableKind {
        ExecutableKind::NonExecutable
    }

    fn body(&self) -> &ProposalBody {
        &self.body
    }

    fn owner(&self) -> &Identity {
        &self.owner
    }
}

/// A proposal whose type and executable kind are chosen by its creator.
#[derive(Clone, Debug)]
pub struct ExplicitProposal {
    owner: Identity,
    proposal_type: ProposalType,
    executable: ExecutableKind,
    body: ProposalBody,
}

impl ExplicitProposal {
    pub fn new(
        owner: Identity,
        proposal_type: ProposalType,
        executable: ExecutableKind,
        body: ProposalBody,
        templates: Option<&TemplateRegistry>,
    ) -> Result<Self, VerificationError> {
        let proposal = Self {
            owner,
            proposal_type,
            executable,
            body,
        };
        precheck(&proposal.snapshot(), templates)?;
        Ok(proposal)
    }
}

impl Proposal for ExplicitProposal {
    fn proposal_type(&self) -> ProposalType {
        self.proposal_type
    }

    fn executable(&self) -> ExecutableKind {
        self.executable
    }

    fn body(&self) -> &ProposalBody {
        &self.body
    }

    fn owner(&self) -> &Identity {
        &self.owner
    }
}

/// A delegatecall proposal whose payload, once approved, emits `message`.
#[derive(Clone, Debug)]
pub struct ExecLoggingProposal {
    owner: Identity,
    body: ProposalBody,
    message: String,
}

impl ExecLoggingProposal {
    pub fn new(
        owner: Identity,
        body: ProposalBody,
        message: impl Into<String>,
        templates: Option<&TemplateRegistry>,
    ) -> Result<Self, VerificationError> {
        let proposal = Self {
            owner,
            body,
            message: message.into(),
        };
        precheck(&proposal.snapshot(), templates)?;
        Ok(proposal)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Proposal for ExecLoggingProposal {
    fn proposal_type(&self) -> ProposalType {
        ProposalType::DELEGATECALL_EXECUTABLE
    }

    fn executable(&self) -> ExecutableKind {
        ExecutableKind::Delegatecall
    }

    fn body(&self) -> &ProposalBody {
        &self.body
    }

    fn owner(&self) -> &Identity {
        &self.owner
    }
}

/// Refund levels offered by every slashing refund vote, in percent.
pub const REFUND_LEVELS: [&str; 6] = ["0%", "20%", "40%", "60%", "80%", "100%"];

/// Votes on how much of a slashed validator's stake to give back.
///
/// Name and options are fixed by the validator id; the creator only supplies
/// a description and the voting terms.
#[derive(Clone, Debug)]
pub struct SlashingRefundProposal {
    owner: Identity,
    validator_id: u64,
    body: ProposalBody,
}

impl SlashingRefundProposal {
    pub fn new(
        owner: Identity,
        validator_id: u64,
        description: impl Into<String>,
        terms: VotingTerms,
        templates: Option<&TemplateRegistry>,
    ) -> Result<Self, VerificationError> {
        let options = REFUND_LEVELS
            .iter()
            .filter_map(|level| Bytes32::from_ascii(level).ok())
            .collect();
        let body = ProposalBody::new(
            format!("Refund for Slashed Validator #{}", validator_id),
            description,
            options,
            terms,
        );
        let proposal = Self {
            owner,
            validator_id,
            body,
        };
        precheck(&proposal.snapshot(), templates)?;
        Ok(proposal)
    }

    pub fn validator_id(&self) -> u64 {
        self.validator_id
    }
}

impl Proposal for SlashingRefundProposal {
    fn proposal_type(&self) -> ProposalType {
        ProposalType::SLASHING_REFUND
    }

    fn executable(&self) -> ExecutableKind {
        ExecutableKind::Delegatecall
    }

    fn body(&self) -> &ProposalBody {
        &self.body
    }

    fn owner(&self) -> &Identity {
        &self.owner
    }
}
