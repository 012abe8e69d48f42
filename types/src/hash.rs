//! Fixed 32-byte values used as proposal option labels.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte word. Proposal options are stored in this form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bytes32([u8; 32]);

impl Bytes32 {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Left-align an ASCII/UTF-8 label and zero-pad it to 32 bytes.
    ///
    /// `"option"` becomes `0x6f7074696f6e0000…`.
    pub fn from_ascii(label: &str) -> Result<Self, TypesError> {
        let raw = label.as_bytes();
        if raw.len() > 32 {
            return Err(TypesError::LabelTooLong { len: raw.len() });
        }
        let mut bytes = [0u8; 32];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
