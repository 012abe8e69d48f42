//! Nullable fee ledger: thread-safe in-memory balances for testing.

use quorate_types::{Amount, FeeLedger, Identity, LedgerError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Books {
    balances: HashMap<Identity, Amount>,
    treasury: Amount,
    collections: Vec<(Identity, Amount)>,
    unavailable: bool,
}

/// An in-memory ledger.
///
/// Payers must be funded first; every successful collection is recorded so
/// tests can assert exactly who paid what. Clones share the same books.
#[derive(Clone, Default)]
pub struct NullFeeLedger {
    books: Arc<Mutex<Books>>,
}

impl NullFeeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `payer` with `amount`.
    pub fn fund(&self, payer: &Identity, amount: Amount) {
        let mut books = self.books.lock().unwrap();
        let balance = books.balances.entry(payer.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .unwrap_or(Amount::new(u128::MAX));
    }

    pub fn balance(&self, payer: &Identity) -> Amount {
        self.books
            .lock()
            .unwrap()
            .balances
            .get(payer)
            .copied()
            .unwrap_or_default()
    }

    /// Total collected so far.
    pub fn treasury(&self) -> Amount {
        self.books.lock().unwrap().treasury
    }

    /// Successful collections, in order.
    pub fn collections(&self) -> Vec<(Identity, Amount)> {
        self.books.lock().unwrap().collections.clone()
    }

    /// Make every following collection fail with [`LedgerError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.books.lock().unwrap().unavailable = unavailable;
    }
}

impl FeeLedger for NullFeeLedger {
    fn collect(&self, payer: &Identity, amount: Amount) -> Result<(), LedgerError> {
        let mut books = self.books.lock().unwrap();
        if books.unavailable {
            return Err(LedgerError::Unavailable("null ledger switched off".into()));
        }
        let available = books.balances.get(payer).copied().unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                payer: payer.to_string(),
                needed: amount.raw(),
                available: available.raw(),
            })?;
        let treasury = books
            .treasury
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Unavailable("treasury overflow".into()))?;
        books.balances.insert(payer.clone(), remaining);
        books.treasury = treasury;
        books.collections.push((payer.clone(), amount));
        Ok(())
    }
}
