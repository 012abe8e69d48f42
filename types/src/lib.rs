//! Fundamental types for the Quorate governance admission engine.
//!
//! This crate defines the value types shared across every other crate in the workspace:
//! identities, fixed-point ratios, amounts, timestamps, option labels and proposal
//! identifiers, plus the traits describing the external boundary (clock, fee ledger).

pub mod amount;
pub mod error;
pub mod executable;
pub mod hash;
pub mod ids;
pub mod identity;
pub mod ledger;
pub mod ratio;
pub mod time;

pub use amount::Amount;
pub use error::TypesError;
pub use executable::ExecutableKind;
pub use hash::Bytes32;
pub use identity::Identity;
pub use ids::{ProposalId, ProposalRef, ProposalType};
pub use ledger::{FeeLedger, LedgerError};
pub use ratio::Ratio;
pub use time::{Clock, SystemClock, Timestamp};
