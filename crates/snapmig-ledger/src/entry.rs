use serde::{Deserialize, Serialize};
use snapmig_types::{LegacyAddress, TOTAL_SUPPLY};
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};

/// One address and its balance in the legacy ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub address: LegacyAddress,
    pub balance: u64,
}

/// A validated legacy ledger state at a milestone index.
///
/// Entries are unique per address and kept in ascending address order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    index: u32,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Validate raw `(address, balance)` pairs as returned by a legacy node.
    ///
    /// Every address must be a well-formed tryte address and every balance
    /// must fit a `u64`; the first violation fails the whole ledger with
    /// [`LedgerError::LedgerCorrupt`] naming the address.
    pub fn from_balances<I, S, B>(index: u32, balances: I) -> LedgerResult<Self>
    where
        I: IntoIterator<Item = (S, B)>,
        S: AsRef<str>,
        B: Into<i128>,
    {
        let entries = balances
            .into_iter()
            .map(|(address, balance)| {
                let raw = address.as_ref();
                let corrupt = |reason: String| LedgerError::LedgerCorrupt {
                    address: raw.to_string(),
                    reason,
                };
                let address = LegacyAddress::parse(raw).map_err(|e| corrupt(e.to_string()))?;
                let balance = balance.into();
                let balance = match u64::try_from(balance) {
                    Ok(balance) => balance,
                    Err(_) if balance < 0 => return Err(corrupt(format!("negative balance {balance}"))),
                    Err(_) => return Err(corrupt(format!("balance {balance} exceeds u64"))),
                };
                Ok(LedgerEntry { address, balance })
            })
            .collect::<LedgerResult<Vec<_>>>()?;
        Self::from_entries(index, entries)
    }

    /// Sort entries and reject duplicate addresses.
    pub fn from_entries(index: u32, mut entries: Vec<LedgerEntry>) -> LedgerResult<Self> {
        entries.sort_by(|a, b| a.address.cmp(&b.address));
        if let Some(pair) = entries.windows(2).find(|w| w[0].address == w[1].address) {
            return Err(LedgerError::LedgerCorrupt {
                address: pair[0].address.to_string(),
                reason: "address listed more than once".into(),
            });
        }
        info!(index, entries = entries.len(), "ledger state loaded");
        Ok(Self { index, entries })
    }

    /// Milestone index the ledger state corresponds to.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    /// Sum of all balances. A sum that does not fit in `u64` cannot come
    /// from a consistent ledger and is reported as corruption.
    pub fn total_balance(&self) -> LedgerResult<u64> {
        let mut total = 0u64;
        for entry in &self.entries {
            total = total
                .checked_add(entry.balance)
                .ok_or_else(|| LedgerError::LedgerCorrupt {
                    address: entry.address.to_string(),
                    reason: "ledger balance sum overflows".into(),
                })?;
        }
        Ok(total)
    }

    /// Log the ledger total against the network supply. A mismatch is
    /// reported but not fatal: the treasury absorbs the difference.
    pub fn check_total_supply(&self) -> LedgerResult<u64> {
        let total = self.total_balance()?;
        if total != TOTAL_SUPPLY {
            warn!(
                total,
                total_supply = TOTAL_SUPPLY,
                "ledger total differs from total supply"
            );
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(c: char) -> String {
        c.to_string().repeat(81)
    }

    #[test]
    fn entries_are_sorted() {
        let ledger = Ledger::from_balances(7, vec![(addr('C'), 1), (addr('A'), 2), (addr('B'), 3)]).unwrap();
        let order: Vec<u64> = ledger.entries().iter().map(|e| e.balance).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(ledger.index(), 7);
    }

    #[test]
    fn malformed_address_is_corrupt() {
        let err = Ledger::from_balances(1, vec![("NOT-TRYTES".to_string(), 1)]).unwrap_err();
        match err {
            LedgerError::LedgerCorrupt { address, .. } => assert_eq!(address, "NOT-TRYTES"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_balance_is_corrupt() {
        let err = Ledger::from_balances(1, vec![(addr('A'), 3i128), (addr('B'), -5)]).unwrap_err();
        match err {
            LedgerError::LedgerCorrupt { address, reason } => {
                assert_eq!(address, addr('B'));
                assert!(reason.contains("negative"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn balance_above_u64_is_corrupt() {
        let err = Ledger::from_balances(1, vec![(addr('C'), u64::MAX as i128 + 1)]).unwrap_err();
        match err {
            LedgerError::LedgerCorrupt { address, reason } => {
                assert_eq!(address, addr('C'));
                assert!(reason.contains("exceeds"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn checksum_variant_collides_with_plain_address() {
        let plain = addr('A');
        let with_checksum = format!("{plain}999999999");
        let err = Ledger::from_balances(1, vec![(plain, 1), (with_checksum, 2)]).unwrap_err();
        assert!(matches!(err, LedgerError::LedgerCorrupt { .. }));
    }

    #[test]
    fn total_balance_overflow_is_corrupt() {
        let ledger = Ledger::from_balances(1, vec![(addr('A'), u64::MAX), (addr('B'), 1)]).unwrap();
        assert!(matches!(ledger.total_balance(), Err(LedgerError::LedgerCorrupt { .. })));
    }

    #[test]
    fn total_balance_sums() {
        let ledger = Ledger::from_balances(1, vec![(addr('A'), 5), (addr('B'), 6)]).unwrap();
        assert_eq!(ledger.total_balance().unwrap(), 11);
        assert_eq!(ledger.check_total_supply().unwrap(), 11);
    }
}
