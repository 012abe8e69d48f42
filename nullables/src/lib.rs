//! Nullable infrastructure for deterministic testing.
//!
//! The admission engine reaches outside itself for exactly two things: the
//! current time and fee collection. Both are traits in `quorate-types`; this
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;

pub use clock::NullClock;
pub use ledger::NullFeeLedger;
