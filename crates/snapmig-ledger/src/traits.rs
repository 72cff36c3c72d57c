use std::collections::HashMap;

use async_trait::async_trait;
use snapmig_types::LegacyAddress;

use crate::entry::Ledger;
use crate::error::LedgerResult;

/// Raw ledger state as reported by a legacy node, before validation.
///
/// Balances are kept signed and wide so that negative or oversized values
/// reach validation instead of failing the decode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawLedgerState {
    pub ledger_index: u32,
    pub balances: HashMap<String, i128>,
}

impl RawLedgerState {
    /// Validate into a sorted [`Ledger`].
    pub fn into_ledger(self) -> LedgerResult<Ledger> {
        Ledger::from_balances(self.ledger_index, self.balances)
    }
}

/// Provider of legacy ledger states.
///
/// Implementations make a single attempt per call; retrying is left to the
/// operator. Failures surface as `UpstreamUnavailable` or
/// `UpstreamProtocolError`.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    async fn ledger_state(&self, index: u32) -> LedgerResult<RawLedgerState>;
}

/// Answers whether legacy addresses have ever been spent from.
#[async_trait]
pub trait SpentAddressOracle: Send + Sync {
    /// One state per address, in request order.
    async fn were_addresses_spent_from(&self, addresses: &[LegacyAddress]) -> LedgerResult<Vec<bool>>;
}

/// Fetch and validate the ledger state at `index`.
pub async fn fetch_ledger<S: LedgerSource + ?Sized>(source: &S, index: u32) -> LedgerResult<Ledger> {
    let raw = source.ledger_state(index).await?;
    raw.into_ledger()
}
