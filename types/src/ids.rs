//! Identifiers for proposal types, registered proposals and deployed proposal objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-assigned identifier of a proposal template / proposal class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalType(u64);

impl ProposalType {
    /// Plain-text, non-executable proposals.
    pub const PLAIN_TEXT: Self = Self(1);
    /// Proposals whose payload is invoked directly.
    pub const CALL_EXECUTABLE: Self = Self(2);
    /// Proposals whose payload runs in the governance context.
    pub const DELEGATECALL_EXECUTABLE: Self = Self(3);
    /// Refunds of slashed validator stake.
    pub const SLASHING_REFUND: Self = Self(4);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Identifier of an admitted proposal. Assigned sequentially, starting at 1.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProposalId(u64);

impl ProposalId {
    /// "Nothing admitted yet".
    pub const NONE: Self = Self(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id following this one, or `None` on overflow.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of a deployed proposal object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalRef(u64);

impl ProposalRef {
    pub fn new(handle: u64) -> Self {
        Self(handle)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proposal@{}", self.0)
    }
}
