use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::protocol::{OUTPUT_ID_LENGTH, TRANSACTION_ID_LENGTH};

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], TypeError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(TypeError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the identifier in bytes.
            pub const LENGTH: usize = $len;

            /// Create from raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// The all-zero identifier.
            pub const fn null() -> Self {
                Self([0u8; $len])
            }

            /// Returns `true` if every byte is zero.
            pub fn is_null(&self) -> bool {
                self.0 == [0u8; $len]
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from a hex string, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, TypeError> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::null()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_id!(
    /// Identifier of a message in the target network.
    MessageId,
    32
);

fixed_id!(
    /// Identifier of a milestone.
    MilestoneId,
    32
);

fixed_id!(
    /// Identifier of a transaction. For outputs not backed by a real
    /// transaction this is a synthetic, counter-derived value.
    TransactionId,
    TRANSACTION_ID_LENGTH
);

fixed_id!(
    /// Output identifier: the creating [`TransactionId`] followed by the
    /// little-endian u16 output index.
    OutputId,
    OUTPUT_ID_LENGTH
);

fixed_id!(
    /// Ed25519 address: the Blake2b-256 hash of an Ed25519 public key.
    Ed25519Address,
    32
);

impl OutputId {
    /// Compose an output id from a transaction id and an output index.
    pub fn from_parts(transaction_id: &TransactionId, index: u16) -> Self {
        let mut bytes = [0u8; OUTPUT_ID_LENGTH];
        bytes[..TRANSACTION_ID_LENGTH].copy_from_slice(transaction_id.as_bytes());
        bytes[TRANSACTION_ID_LENGTH..].copy_from_slice(&index.to_le_bytes());
        Self(bytes)
    }

    pub fn transaction_id(&self) -> TransactionId {
        let mut bytes = [0u8; TRANSACTION_ID_LENGTH];
        bytes.copy_from_slice(&self.0[..TRANSACTION_ID_LENGTH]);
        TransactionId(bytes)
    }

    pub fn index(&self) -> u16 {
        u16::from_le_bytes([self.0[TRANSACTION_ID_LENGTH], self.0[TRANSACTION_ID_LENGTH + 1]])
    }

    /// Mutable access to the raw bytes, used by id-rewriting transforms.
    pub fn as_mut_bytes(&mut self) -> &mut [u8; OUTPUT_ID_LENGTH] {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_all_zeros() {
        let id = MessageId::null();
        assert!(id.is_null());
        assert_eq!(id.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn hex_roundtrip_with_prefix() {
        let id = MilestoneId::new([7u8; 32]);
        let parsed = MilestoneId::from_hex(&format!("0x{}", id.to_hex())).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn wrong_length_rejected() {
        let err = TransactionId::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 2 });
    }

    #[test]
    fn output_id_parts() {
        let tx = TransactionId::new([3u8; 32]);
        let id = OutputId::from_parts(&tx, 0x0102);
        assert_eq!(id.transaction_id(), tx);
        assert_eq!(id.index(), 0x0102);
        assert_eq!(&id.as_bytes()[32..], &[0x02, 0x01]);
    }

    #[test]
    fn output_id_serde_as_hex() {
        let id = OutputId::from_parts(&TransactionId::new([9u8; 32]), 5);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json.len(), 2 + 68);
        let parsed: OutputId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn ordering_is_bytewise() {
        assert!(MessageId::new([0; 32]) < MessageId::new([1; 32]));
    }
}
