//! Deployed proposal objects and how they came to exist.
//!
//! The table is owned by the engine. A [`DeployOrigin::Factory`] entry can only
//! be written through a factory credential minted by that engine, so a
//! proposal deployed by hand can never pass as factory-made.

use crate::proposal::Proposal;
use quorate_types::{Identity, ProposalRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The deployment path of a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeployOrigin {
    /// Deployed directly by `deployer`.
    Direct { deployer: Identity },
    /// Deployed and submitted in one step by the factory `factory`.
    Factory { factory: Identity },
}

impl DeployOrigin {
    /// Whether this proposal was created through `factory`.
    pub fn is_factory(&self, factory: &Identity) -> bool {
        matches!(self, Self::Factory { factory: f } if f == factory)
    }
}

impl fmt::Display for DeployOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { deployer } => write!(f, "direct({})", deployer),
            Self::Factory { factory } => write!(f, "factory({})", factory),
        }
    }
}

/// A deployed proposal.
#[derive(Clone, Debug)]
pub struct Deployment {
    pub proposal: Arc<dyn Proposal>,
    pub origin: DeployOrigin,
}

/// Proof that the holder is a factory registered with a particular engine.
///
/// Only the engine can mint one.
#[derive(Debug)]
pub struct FactoryCredential {
    identity: Identity,
}

impl FactoryCredential {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[derive(Default)]
pub(crate) struct DeploymentTable {
    entries: HashMap<ProposalRef, Deployment>,
    last_ref: u64,
    factories: u64,
}

impl DeploymentTable {
    /// The handle the next insert will receive.
    pub(crate) fn next_ref(&self) -> ProposalRef {
        ProposalRef::new(self.last_ref + 1)
    }

    pub(crate) fn insert(&mut self, proposal: Arc<dyn Proposal>, origin: DeployOrigin) -> ProposalRef {
        let handle = self.next_ref();
        self.last_ref += 1;
        self.entries.insert(handle, Deployment { proposal, origin });
        handle
    }

    pub(crate) fn get(&self, handle: &ProposalRef) -> Option<&Deployment> {
        self.entries.get(handle)
    }

    pub(crate) fn mint_factory(&mut self) -> FactoryCredential {
        self.factories += 1;
        FactoryCredential {
            identity: Identity::new(format!("factory-{}", self.factories)),
        }
    }
}
