//! Fee amounts.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw; one whole token is [`Amount::UNIT`] raw.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A payment amount attached to a proposal submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Raw units per whole token (10^18).
    pub const UNIT: u128 = 1_000_000_000_000_000_000;

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Build an amount from whole tokens, saturating on overflow.
    pub fn from_tokens(tokens: u128) -> Self {
        Self(tokens.saturating_mul(Self::UNIT))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} raw", self.0)
    }
}
