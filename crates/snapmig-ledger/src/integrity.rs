use blake2::Digest;
use snapmig_crypto::Blake2b256;

use crate::entry::LedgerEntry;

/// Blake2b-256 fingerprint of a ledger state.
///
/// Entries are hashed in ascending address order as the concatenation of the
/// address trytes and the decimal balance, so the digest does not depend on
/// the order the entries are given in. Operators compare it across
/// independently fetched ledgers.
pub fn integrity_digest(entries: &[LedgerEntry]) -> [u8; 32] {
    let mut sorted: Vec<&LedgerEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.address.cmp(&b.address));

    let mut hasher = Blake2b256::new();
    for entry in sorted {
        hasher.update(entry.address.as_str().as_bytes());
        hasher.update(entry.balance.to_string().as_bytes());
    }
    hasher.finalize().into()
}

/// Hex rendering of [`integrity_digest`].
pub fn integrity_digest_hex(entries: &[LedgerEntry]) -> String {
    hex::encode(integrity_digest(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use snapmig_crypto::blake2b_256;
    use snapmig_types::LegacyAddress;

    fn entry(c: char, balance: u64) -> LedgerEntry {
        LedgerEntry {
            address: LegacyAddress::parse(&c.to_string().repeat(81)).unwrap(),
            balance,
        }
    }

    #[test]
    fn digest_matches_concatenated_lines() {
        let entries = vec![entry('B', 20), entry('A', 10)];
        let expected = blake2b_256(format!("{}10{}20", "A".repeat(81), "B".repeat(81)).as_bytes());
        assert_eq!(integrity_digest(&entries), expected);
    }

    #[test]
    fn empty_ledger_is_empty_hash() {
        assert_eq!(integrity_digest(&[]), blake2b_256(b""));
        assert_eq!(integrity_digest_hex(&[]).len(), 64);
    }

    #[test]
    fn balance_change_changes_digest() {
        assert_ne!(
            integrity_digest(&[entry('A', 1)]),
            integrity_digest(&[entry('A', 2)])
        );
    }

    proptest! {
        #[test]
        fn shuffled_input_same_digest(balances in proptest::collection::vec(any::<u64>(), 1..26), seed in any::<u64>()) {
            let letters: Vec<char> = ('A'..='Z').collect();
            let entries: Vec<LedgerEntry> = balances
                .iter()
                .enumerate()
                .map(|(i, b)| entry(letters[i], *b))
                .collect();
            let mut shuffled = entries.clone();
            shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(integrity_digest(&entries), integrity_digest(&shuffled));
        }
    }
}
