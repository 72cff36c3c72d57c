use serde::{Deserialize, Serialize};
use snapmig_types::{parse_migration_address, Address, Ed25519Address, LegacyAddress};
use tracing::{debug, info};

use crate::entry::LedgerEntry;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::SpentAddressOracle;

/// Default lower bound for a balance to be migrated or counted as eligible.
pub const DEFAULT_MIN_MIGRATION_AMOUNT: u64 = 1_000_000;

/// Addresses per spent-state query.
pub const SPENT_QUERY_BATCH: usize = 500;

/// Funds to credit to an Ed25519 address in the genesis snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub target: Ed25519Address,
    pub value: u64,
}

impl MigrationRecord {
    pub fn address(&self) -> Address {
        Address::from(self.target)
    }
}

/// Counts produced by the optional spent-address check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentDiagnostics {
    /// Eligible addresses the node reports as spent from.
    pub spent: u64,
    /// Eligible addresses whose last trit is non-zero; these cannot be
    /// checksummed and were not queried.
    pub invalid_last_trit: u64,
}

/// Totals of one classification pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilitySummary {
    pub migration_count: u64,
    pub migrated_total: u64,
    /// Plain addresses that hold enough funds to migrate later.
    pub eligible_count: u64,
    pub eligible_total: u64,
    /// Entries below the minimum, left in the treasury.
    pub dust_count: u64,
    pub dust_total: u64,
    pub spent: Option<SpentDiagnostics>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bucket {
    Migration(Ed25519Address),
    Eligible,
    Dust,
}

fn bucket(entry: &LedgerEntry, min_migration_amount: u64) -> Bucket {
    if entry.balance < min_migration_amount {
        return Bucket::Dust;
    }
    match parse_migration_address(&entry.address) {
        Ok(target) => Bucket::Migration(target),
        Err(_) => Bucket::Eligible,
    }
}

fn add(total: u64, entry: &LedgerEntry) -> LedgerResult<u64> {
    total
        .checked_add(entry.balance)
        .ok_or_else(|| LedgerError::LedgerCorrupt {
            address: entry.address.to_string(),
            reason: "balance sum overflows".into(),
        })
}

/// Split ledger entries into migrations, plain eligible funds and dust.
///
/// An entry is a migration if its address decodes as a migration address and
/// its balance reaches `min_migration_amount`; a plain address reaching the
/// minimum is eligible; everything else is dust. Records keep the order of
/// `entries`.
pub fn classify(
    entries: &[LedgerEntry],
    min_migration_amount: u64,
) -> LedgerResult<(Vec<MigrationRecord>, EligibilitySummary)> {
    let mut records = Vec::new();
    let mut summary = EligibilitySummary::default();

    for entry in entries {
        match bucket(entry, min_migration_amount) {
            Bucket::Migration(target) => {
                summary.migrated_total = add(summary.migrated_total, entry)?;
                summary.migration_count += 1;
                records.push(MigrationRecord {
                    target,
                    value: entry.balance,
                });
            }
            Bucket::Eligible => {
                summary.eligible_total = add(summary.eligible_total, entry)?;
                summary.eligible_count += 1;
            }
            Bucket::Dust => {
                summary.dust_total = add(summary.dust_total, entry)?;
                summary.dust_count += 1;
            }
        }
    }

    info!(
        addresses = summary.migration_count,
        tokens = summary.migrated_total,
        "migration"
    );
    info!(
        addresses = summary.eligible_count,
        tokens = summary.eligible_total,
        "eligible for migration"
    );
    Ok((records, summary))
}

/// [`classify`], additionally counting how many eligible addresses are
/// already spent from.
///
/// The diagnostics are informational only: records and totals are the same
/// as those of [`classify`].
pub async fn classify_with_spent_check<O>(
    entries: &[LedgerEntry],
    min_migration_amount: u64,
    oracle: &O,
) -> LedgerResult<(Vec<MigrationRecord>, EligibilitySummary)>
where
    O: SpentAddressOracle + ?Sized,
{
    let (records, mut summary) = classify(entries, min_migration_amount)?;

    let mut diagnostics = SpentDiagnostics::default();
    let mut to_query: Vec<LegacyAddress> = Vec::new();
    for entry in entries {
        if bucket(entry, min_migration_amount) != Bucket::Eligible {
            continue;
        }
        if entry.address.has_valid_last_trit() {
            to_query.push(entry.address.clone());
        } else {
            diagnostics.invalid_last_trit += 1;
        }
    }

    for batch in to_query.chunks(SPENT_QUERY_BATCH) {
        let states = oracle.were_addresses_spent_from(batch).await?;
        if states.len() != batch.len() {
            return Err(LedgerError::UpstreamProtocolError(format!(
                "spent query for {} addresses returned {} states",
                batch.len(),
                states.len()
            )));
        }
        diagnostics.spent += states.iter().filter(|spent| **spent).count() as u64;
        debug!(queried = batch.len(), "spent states fetched");
    }

    info!(
        addresses = summary.eligible_count,
        spent = diagnostics.spent,
        invalid_last_trit = diagnostics.invalid_last_trit,
        "eligible address spent check"
    );
    summary.spent = Some(diagnostics);
    Ok((records, summary))
}
