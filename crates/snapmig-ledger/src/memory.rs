use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use snapmig_types::LegacyAddress;

use crate::error::{LedgerError, LedgerResult};
use crate::traits::{LedgerSource, RawLedgerState, SpentAddressOracle};

/// In-memory ledger source for tests, local demos, and embedding.
///
/// Holds one balance map per milestone index.
#[derive(Default)]
pub struct InMemoryLedgerSource {
    states: RwLock<HashMap<u32, HashMap<String, i128>>>,
}

impl InMemoryLedgerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S, B>(&self, index: u32, balances: I) -> LedgerResult<()>
    where
        I: IntoIterator<Item = (S, B)>,
        S: Into<String>,
        B: Into<i128>,
    {
        let balances = balances.into_iter().map(|(a, b)| (a.into(), b.into())).collect();
        self.states
            .write()
            .map_err(|_| LedgerError::UpstreamUnavailable("ledger source lock poisoned".into()))?
            .insert(index, balances);
        Ok(())
    }
}

#[async_trait]
impl LedgerSource for InMemoryLedgerSource {
    async fn ledger_state(&self, index: u32) -> LedgerResult<RawLedgerState> {
        let states = self
            .states
            .read()
            .map_err(|_| LedgerError::UpstreamUnavailable("ledger source lock poisoned".into()))?;
        let balances = states.get(&index).cloned().ok_or_else(|| {
            LedgerError::UpstreamProtocolError(format!("no ledger state at index {index}"))
        })?;
        Ok(RawLedgerState {
            ledger_index: index,
            balances,
        })
    }
}

/// In-memory spent-address set that counts the queries it receives.
#[derive(Default)]
pub struct InMemorySpentOracle {
    spent: HashSet<LegacyAddress>,
    queries: AtomicUsize,
}

impl InMemorySpentOracle {
    pub fn new<I: IntoIterator<Item = LegacyAddress>>(spent: I) -> Self {
        Self {
            spent: spent.into_iter().collect(),
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of batch queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpentAddressOracle for InMemorySpentOracle {
    async fn were_addresses_spent_from(&self, addresses: &[LegacyAddress]) -> LedgerResult<Vec<bool>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        Ok(addresses.iter().map(|a| self.spent.contains(a)).collect())
    }
}
