//! The registered record of an admitted proposal.

use quorate_types::{Bytes32, ExecutableKind, ProposalId, ProposalRef, ProposalType, Ratio, Timestamp};
use serde::{Deserialize, Serialize};

/// Written exactly once per successful submission, never modified afterwards.
///
/// Tallying and execution read the voting window and thresholds from here,
/// not from the proposal object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalParams {
    pub id: ProposalId,
    pub proposal_type: ProposalType,
    pub executable: ExecutableKind,
    pub min_votes: Ratio,
    pub min_agreement: Ratio,
    /// Copied from the template at admission.
    pub opinion_scales: Vec<u32>,
    pub proposal_ref: ProposalRef,
    /// Copied from the proposal at admission.
    pub options: Vec<Bytes32>,
    pub voting_start_time: Timestamp,
    /// `voting_start_time + min_voting_duration`
    pub voting_min_end_time: Timestamp,
    /// `voting_start_time + max_voting_duration`
    pub voting_max_end_time: Timestamp,
}

impl ProposalParams {
    /// Whether voting is open at `now` (start inclusive, max end exclusive).
    pub fn is_voting_open(&self, now: Timestamp) -> bool {
        now >= self.voting_start_time && now < self.voting_max_end_time
    }

    /// Whether the vote may be closed early at `now`.
    pub fn may_finalize(&self, now: Timestamp) -> bool {
        now >= self.voting_min_end_time
    }
}
