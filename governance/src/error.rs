use quorate_types::{Amount, ExecutableKind, Identity, LedgerError, ProposalRef, ProposalType};
use thiserror::Error;

/// Why a proposal falls outside its template's envelope.
///
/// Only the first violation in check order is ever reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("no template registered for {0}")]
    TemplateNotFound(ProposalType),

    #[error("executable kind {declared:?} does not match template kind {expected:?}")]
    ExecutableMismatch {
        declared: ExecutableKind,
        expected: ExecutableKind,
    },

    #[error("voting duration too short")]
    DurationTooShort,

    #[error("voting duration too long")]
    DurationTooLong,

    #[error("min end greater than max end")]
    EndOrderInvalid,

    #[error("voting start delay too short")]
    StartDelayTooShort,

    #[error("voting start delay too long")]
    StartDelayTooLong,

    #[error("quorum too small")]
    QuorumTooSmall,

    #[error("quorum bigger than 100%")]
    QuorumExceedsMax,

    #[error("turn out too small")]
    TurnoutTooSmall,

    #[error("turn out bigger than 100%")]
    TurnoutExceedsMax,

    #[error("proposal options are empty - nothing to vote for")]
    OptionsEmpty,

    #[error("too many options: {count} > {max}")]
    TooManyOptions { count: usize, max: usize },

    #[error("proposal contract failed verification")]
    OriginVerificationFailed,
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("paid proposal fee is wrong: paid {paid}, expected {expected}")]
    FeeMismatch { paid: Amount, expected: Amount },

    #[error("{0} is not deployed")]
    ProposalNotDeployed(ProposalRef),

    #[error("{0} is not authorised for this administrative action")]
    NotAdmin(Identity),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("voting window does not fit in the timestamp range")]
    TimeOverflow,

    #[error("proposal id space exhausted")]
    IdsExhausted,

    #[error("fee collection failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl GovernanceError {
    /// The envelope violation behind this error, if any.
    pub fn verification(&self) -> Option<&VerificationError> {
        match self {
            Self::Verification(e) => Some(e),
            _ => None,
        }
    }
}
