//! Executable kind of a proposal.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};

/// Declares whether, once approved, a proposal's payload may be invoked, and how.
///
/// Supplied by both the template and the proposal; the two must match for the
/// proposal to be admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutableKind {
    /// Signalling only. Nothing runs after approval.
    NonExecutable,
    /// The payload is invoked directly.
    Call,
    /// The payload is invoked in the governance contract's own context.
    Delegatecall,
}

impl ExecutableKind {
    /// Stable wire code (0, 1, 2).
    pub fn code(&self) -> u8 {
        match self {
            Self::NonExecutable => 0,
            Self::Call => 1,
            Self::Delegatecall => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, TypesError> {
        match code {
            0 => Ok(Self::NonExecutable),
            1 => Ok(Self::Call),
            2 => Ok(Self::Delegatecall),
            other => Err(TypesError::UnknownExecutableKind(other)),
        }
    }

    /// Whether an approved proposal of this kind has a payload to run.
    pub fn is_executable(&self) -> bool {
        !matches!(self, Self::NonExecutable)
    }
}
