//! Fee ledger boundary.
//!
//! Balances and transfers live outside the admission engine. The engine only
//! needs to collect the exact proposal fee attached to a submission.

use crate::{Amount, Identity};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds for {payer}: need {needed}, have {available}")]
    InsufficientFunds {
        payer: String,
        needed: u128,
        available: u128,
    },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Receives proposal fees.
pub trait FeeLedger: Send + Sync {
    /// Move `amount` from `payer` into the governance treasury.
    ///
    /// Either the whole amount moves or nothing does.
    fn collect(&self, payer: &Identity, amount: Amount) -> Result<(), LedgerError>;
}
