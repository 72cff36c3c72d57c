//! Legacy trinary ledger primitives: trytes, addresses and the b1t6 byte
//! encoding used to embed binary data in tryte strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Tryte alphabet, indexed by `value + 13` for balanced values `-13..=13`
/// rotated so that `'9'` is zero.
const TRYTE_ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of trytes in a legacy address without checksum.
pub const ADDRESS_TRYTES: usize = 81;

/// Number of trytes in a legacy address followed by its 9-tryte checksum.
pub const ADDRESS_WITH_CHECKSUM_TRYTES: usize = 90;

/// Balanced value of a tryte character (`'9'` = 0, `'A'..='M'` = 1..=13,
/// `'N'..='Z'` = -13..=-1).
pub fn tryte_value(tryte: char) -> Option<i8> {
    match tryte {
        '9' => Some(0),
        'A'..='M' => Some(tryte as i8 - b'A' as i8 + 1),
        'N'..='Z' => Some(tryte as i8 - b'Z' as i8 - 1),
        _ => None,
    }
}

/// Tryte character for a balanced value in `-13..=13`.
pub fn tryte_char(value: i8) -> Option<char> {
    if !(-13..=13).contains(&value) {
        return None;
    }
    let index = if value < 0 { 27 + value as i32 } else { value as i32 };
    Some(TRYTE_ALPHABET[index as usize] as char)
}

/// Encode bytes into trytes, two trytes per byte (b1t6).
///
/// Each byte is read as a signed 8-bit value and split into a low and a high
/// balanced tryte so that `value = low + 27 * high`.
pub fn b1t6_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        let v = b as i8 as i32 + 13 * 27 + 13;
        let (quo, rem) = (v / 27, v % 27);
        // both in -13..=13 by construction
        out.push(TRYTE_ALPHABET[((rem - 13 + 27) % 27) as usize] as char);
        out.push(TRYTE_ALPHABET[((quo - 13 + 27) % 27) as usize] as char);
    }
    out
}

/// Decode a b1t6 tryte string back into bytes.
pub fn b1t6_decode(trytes: &str) -> Result<Vec<u8>, TypeError> {
    let chars: Vec<char> = trytes.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(TypeError::InvalidLength {
            expected: chars.len() + 1,
            actual: chars.len(),
        });
    }
    let mut out = Vec::with_capacity(chars.len() / 2);
    for (pair_index, pair) in chars.chunks(2).enumerate() {
        let low = tryte_value(pair[0]).ok_or(TypeError::InvalidTryte {
            tryte: pair[0],
            position: pair_index * 2,
        })? as i32;
        let high = tryte_value(pair[1]).ok_or(TypeError::InvalidTryte {
            tryte: pair[1],
            position: pair_index * 2 + 1,
        })? as i32;
        let v = low + 27 * high;
        if !(i8::MIN as i32..=i8::MAX as i32).contains(&v) {
            return Err(TypeError::InvalidTryte {
                tryte: pair[1],
                position: pair_index * 2 + 1,
            });
        }
        out.push(v as i8 as u8);
    }
    Ok(out)
}

/// An 81-tryte address of the legacy ledger.
///
/// Ordering is the lexical ordering of the tryte string, which is the order
/// the integrity digest is computed in.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegacyAddress(String);

impl LegacyAddress {
    /// Validate and wrap a tryte string. A trailing 9-tryte checksum is
    /// stripped if present.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if let Some((position, tryte)) = s
            .chars()
            .enumerate()
            .find(|(_, c)| tryte_value(*c).is_none())
        {
            return Err(TypeError::InvalidTryte { tryte, position });
        }
        // all ASCII from here on
        match s.len() {
            ADDRESS_TRYTES => Ok(Self(s.to_string())),
            ADDRESS_WITH_CHECKSUM_TRYTES => Ok(Self(s[..ADDRESS_TRYTES].to_string())),
            other => Err(TypeError::InvalidLength {
                expected: ADDRESS_TRYTES,
                actual: other,
            }),
        }
    }

    /// Wrap trytes already known to be a well-formed address.
    pub(crate) fn from_trytes_unchecked(trytes: String) -> Self {
        debug_assert_eq!(trytes.len(), ADDRESS_TRYTES);
        Self(trytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the most significant trit of the last tryte is zero.
    ///
    /// Addresses generated by the legacy key derivation always have a zero
    /// last trit; any other value cannot carry a valid checksum.
    pub fn has_valid_last_trit(&self) -> bool {
        self.0
            .chars()
            .last()
            .and_then(tryte_value)
            .map(|v| (-4..=4).contains(&v))
            .unwrap_or(false)
    }
}

impl FromStr for LegacyAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for LegacyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LegacyAddress({}...)", &self.0[..12.min(self.0.len())])
    }
}

impl fmt::Display for LegacyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LegacyAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LegacyAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tryte_values_cover_alphabet() {
        for (i, c) in TRYTE_ALPHABET.iter().enumerate() {
            let v = tryte_value(*c as char).unwrap();
            assert_eq!(tryte_char(v), Some(*c as char), "tryte index {i}");
        }
        assert_eq!(tryte_value('M'), Some(13));
        assert_eq!(tryte_value('N'), Some(-13));
        assert_eq!(tryte_value('Z'), Some(-1));
        assert_eq!(tryte_value('a'), None);
    }

    #[test]
    fn b1t6_roundtrip_all_bytes() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let trytes = b1t6_encode(&bytes);
        assert_eq!(trytes.len(), 512);
        assert_eq!(b1t6_decode(&trytes).unwrap(), bytes);
    }

    #[test]
    fn b1t6_zero_is_nines() {
        assert_eq!(b1t6_encode(&[0, 0]), "9999");
    }

    #[test]
    fn b1t6_rejects_out_of_range_pair() {
        // 13 + 27 * 13 is far beyond i8
        assert!(b1t6_decode("MM").is_err());
    }

    #[test]
    fn parse_valid_address() {
        let s = "A".repeat(81);
        let addr = LegacyAddress::parse(&s).unwrap();
        assert_eq!(addr.as_str(), s);
    }

    #[test]
    fn parse_strips_checksum() {
        let s = format!("{}{}", "B".repeat(81), "9".repeat(9));
        let addr = LegacyAddress::parse(&s).unwrap();
        assert_eq!(addr.as_str().len(), 81);
    }

    #[test]
    fn parse_rejects_bad_length() {
        let err = LegacyAddress::parse("ABC").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 81, actual: 3 });
    }

    #[test]
    fn parse_rejects_bad_tryte() {
        let mut s = "A".repeat(80);
        s.push('1');
        let err = LegacyAddress::parse(&s).unwrap_err();
        assert_eq!(err, TypeError::InvalidTryte { tryte: '1', position: 80 });
    }

    #[test]
    fn last_trit_check() {
        let ok = LegacyAddress::parse(&format!("{}D", "9".repeat(80))).unwrap();
        assert!(ok.has_valid_last_trit());
        let bad = LegacyAddress::parse(&format!("{}M", "9".repeat(80))).unwrap();
        assert!(!bad.has_valid_last_trit());
    }

    #[test]
    fn ordering_is_lexical() {
        let a = LegacyAddress::parse(&"9".repeat(81)).unwrap();
        let b = LegacyAddress::parse(&"A".repeat(81)).unwrap();
        assert!(a < b);
    }
}
