use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::Ed25519Address;

/// Polymorphic target-network address.
///
/// Only the Ed25519 variant exists today. The type byte is part of the
/// snapshot wire format, so new variants must take new type bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "address", rename_all = "lowercase")]
pub enum Address {
    Ed25519(Ed25519Address),
}

impl Address {
    pub const ED25519_TYPE: u8 = 0;

    /// Wire type byte of this address variant.
    pub fn type_byte(&self) -> u8 {
        match self {
            Address::Ed25519(_) => Self::ED25519_TYPE,
        }
    }

    /// Raw address bytes without the type byte.
    pub fn as_bytes(&self) -> &[u8; 32] {
        match self {
            Address::Ed25519(addr) => addr.as_bytes(),
        }
    }

    /// Rebuild an address from its type byte and raw bytes.
    pub fn from_parts(type_byte: u8, bytes: [u8; 32]) -> Result<Self, TypeError> {
        match type_byte {
            Self::ED25519_TYPE => Ok(Address::Ed25519(Ed25519Address::new(bytes))),
            other => Err(TypeError::UnknownAddressType(other)),
        }
    }
}

impl From<Ed25519Address> for Address {
    fn from(addr: Ed25519Address) -> Self {
        Address::Ed25519(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ed25519(addr) => write!(f, "ed25519:{addr}"),
        }
    }
}
