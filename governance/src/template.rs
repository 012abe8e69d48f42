//! Proposal templates and their registry.
//!
//! A template is the legal parameter envelope for one proposal type. The
//! registry is the single source of truth for those envelopes; both the
//! optional construction-time check and the mandatory submission-time check
//! read from it.

use crate::error::{GovernanceError, VerificationError};
use crate::proposal::ProposalSnapshot;
use crate::validation::{self, Checkpoint};
use quorate_types::{ExecutableKind, Identity, ProposalType, Ratio};
use quorate_utils::format_duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// The envelope a proposal of one type must fit in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// When set, only proposals deployed through this factory are admissible.
    pub factory: Option<Identity>,
    pub executable: ExecutableKind,
    /// Lowest turnout threshold a proposal may declare.
    pub min_votes: Ratio,
    /// Lowest agreement threshold a proposal may declare.
    pub min_agreement: Ratio,
    /// Opinion scale values tallying may use for this type.
    pub opinion_scales: BTreeSet<u32>,
    pub min_voting_duration_secs: u64,
    pub max_voting_duration_secs: u64,
    pub min_start_delay_secs: u64,
    pub max_start_delay_secs: u64,
}

impl Template {
    /// Internal consistency of the envelope itself.
    pub fn check_consistency(&self) -> Result<(), GovernanceError> {
        if self.min_voting_duration_secs > self.max_voting_duration_secs {
            return Err(GovernanceError::InvalidTemplate(format!(
                "min voting duration {} exceeds max {}",
                self.min_voting_duration_secs, self.max_voting_duration_secs
            )));
        }
        if self.min_start_delay_secs > self.max_start_delay_secs {
            return Err(GovernanceError::InvalidTemplate(format!(
                "min start delay {} exceeds max {}",
                self.min_start_delay_secs, self.max_start_delay_secs
            )));
        }
        if self.min_votes.exceeds_one() || self.min_agreement.exceeds_one() {
            return Err(GovernanceError::InvalidTemplate(
                "thresholds must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serialized form of a registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub owner: Identity,
    pub templates: BTreeMap<ProposalType, Template>,
}

pub(crate) type TemplateMap = BTreeMap<ProposalType, Template>;

/// Maps proposal types to templates. Only `owner` may write.
#[derive(Debug)]
pub struct TemplateRegistry {
    owner: Identity,
    templates: RwLock<TemplateMap>,
}

impl TemplateRegistry {
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            templates: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Register `template` for `proposal_type`, replacing any previous one.
    ///
    /// Replacement is not versioned: a proposal that passed its construction
    /// check against the old envelope is judged against the new one when it is
    /// submitted, and may now fail (or pass where it would have failed).
    pub fn add_template(
        &self,
        caller: &Identity,
        proposal_type: ProposalType,
        template: Template,
    ) -> Result<(), GovernanceError> {
        if caller != &self.owner {
            return Err(GovernanceError::NotAdmin(caller.clone()));
        }
        template.check_consistency()?;

        tracing::info!(
            %proposal_type,
            name = %template.name,
            factory = ?template.factory.as_ref().map(Identity::as_str),
            executable = ?template.executable,
            min_votes = %template.min_votes,
            min_agreement = %template.min_agreement,
            min_duration = %format_duration(template.min_voting_duration_secs),
            max_duration = %format_duration(template.max_voting_duration_secs),
            "template registered"
        );

        let previous = self.write().insert(proposal_type, template);
        if previous.is_some() {
            tracing::warn!(%proposal_type, "template overwritten");
        }
        Ok(())
    }

    pub fn get_template(&self, proposal_type: ProposalType) -> Option<Template> {
        self.read().get(&proposal_type).cloned()
    }

    /// Registered proposal types, ascending.
    pub fn template_ids(&self) -> Vec<ProposalType> {
        self.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Check a proposal against its registered template. Pure; reads only.
    pub fn verify(
        &self,
        snapshot: &ProposalSnapshot,
        checkpoint: Checkpoint<'_>,
    ) -> Result<(), VerificationError> {
        let templates = self.read();
        validation::verify_in(&templates, snapshot, checkpoint)?;
        Ok(())
    }

    /// Hold the templates steady for a whole admission.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, TemplateMap> {
        self.templates.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, TemplateMap> {
        self.templates.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize the registry to bytes.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        let snapshot = RegistrySnapshot {
            owner: self.owner.clone(),
            templates: self.read().clone(),
        };
        bincode::serialize(&snapshot).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    /// Restore a registry from [`save_state`](Self::save_state) output.
    ///
    /// Every template is re-checked for consistency.
    pub fn load_state(data: &[u8]) -> Result<Self, GovernanceError> {
        let snapshot: RegistrySnapshot =
            bincode::deserialize(data).map_err(|e| GovernanceError::Snapshot(e.to_string()))?;
        for (proposal_type, template) in &snapshot.templates {
            template.check_consistency().map_err(|e| {
                GovernanceError::Snapshot(format!("{}: {}", proposal_type, e))
            })?;
        }
        Ok(Self {
            owner: snapshot.owner,
            templates: RwLock::new(snapshot.templates),
        })
    }
}
