//! Fixed-point ratios for turnout and agreement thresholds.
//!
//! A ratio is an integer numerator over [`Ratio::UNIT`] (10^18), so `0.4` is stored
//! as `400_000_000_000_000_000`. Values above one are representable on purpose:
//! proposals are untrusted input and a value "bigger than 100%" has to survive long
//! enough to be rejected explicitly instead of being clamped.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FRACTION_DIGITS: usize = 18;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Ratio(u128);

impl Ratio {
    /// The denominator, i.e. the raw value of 100%.
    pub const UNIT: u128 = 1_000_000_000_000_000_000;

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(Self::UNIT);

    pub fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Build a ratio from basis points (10_000 = 100%).
    pub fn from_bps(bps: u32) -> Self {
        Self(bps as u128 * (Self::UNIT / 10_000))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Whether the value lies above 100%.
    pub fn exceeds_one(&self) -> bool {
        self.0 > Self::UNIT
    }
}

impl FromStr for Ratio {
    type Err = TypesError;

    /// Parse a decimal such as `"0.4"`, `"1"` or `".25"` (at most 18 fractional digits).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason| TypesError::InvalidRatio {
            input: s.to_string(),
            reason,
        };

        let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty"));
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid("not a decimal number"));
        }
        if frac.len() > FRACTION_DIGITS {
            return Err(invalid("more than 18 fractional digits"));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("integer part out of range"))?
        };
        let frac: u128 = if frac.is_empty() {
            0
        } else {
            // at most 18 digits, always fits
            let digits: u128 = frac.parse().map_err(|_| invalid("fraction out of range"))?;
            digits * 10u128.pow((FRACTION_DIGITS - frac.len()) as u32)
        };

        whole
            .checked_mul(Self::UNIT)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(|| invalid("overflow"))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNIT;
        let frac = self.0 % Self::UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}
