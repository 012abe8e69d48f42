//! Governance admission control.
//!
//! An administrator registers templates, each the legal envelope (thresholds,
//! voting window, start delay, option count, required factory) for one proposal
//! type. Proposals are untrusted objects that declare their own parameters and
//! may check themselves against a template when constructed. That check is
//! advisory. The authoritative one runs in [`GovernanceEngine::create_proposal`],
//! against the live registry, before the fee is taken and an id assigned.
//!
//! Both checkpoints call the same predicate, [`validation::check_envelope`].

pub mod config;
pub mod deployment;
pub mod engine;
pub mod error;
pub mod factory;
pub mod params;
pub mod proposal;
pub mod template;
pub mod validation;

pub use config::GovernanceConfig;
pub use deployment::{DeployOrigin, Deployment, FactoryCredential};
pub use engine::GovernanceEngine;
pub use error::{GovernanceError, VerificationError};
pub use factory::PlainTextProposalFactory;
pub use params::ProposalParams;
pub use proposal::{
    ExecLoggingProposal, ExplicitProposal, PlainTextProposal, Proposal, ProposalBody,
    ProposalSnapshot, SlashingRefundProposal, VotingTerms,
};
pub use template::{RegistrySnapshot, Template, TemplateRegistry};
pub use validation::{Checkpoint, MAX_OPTIONS};
