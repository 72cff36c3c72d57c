use std::io::Write;
use std::path::Path;

use snapmig_snapshot::{
    synthesize_outputs, write_snapshot, write_snapshot_file, SnapshotHeader, WriteSummary,
    WriterOptions,
};
use snapmig_types::{MessageId, TOTAL_SUPPLY};
use tracing::info;

use crate::classify::MigrationRecord;
use crate::error::{LedgerError, LedgerResult};
use crate::treasury::compute_treasury;

/// Assembles the genesis snapshot of the target network.
///
/// The genesis snapshot is a full snapshot at milestone index 0 with a
/// single null solid entry point, one synthetic output per migration record
/// and the remaining supply in the treasury. Outputs are produced lazily
/// from the records.
#[derive(Clone, Debug)]
pub struct GenesisBuilder {
    network_id: u64,
    timestamp: u64,
    total_supply: u64,
}

impl GenesisBuilder {
    pub fn new(network_id: u64) -> Self {
        Self {
            network_id,
            timestamp: 0,
            total_supply: TOTAL_SUPPLY,
        }
    }

    /// Unix timestamp written into the header.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn total_supply(mut self, total_supply: u64) -> Self {
        self.total_supply = total_supply;
        self
    }

    /// Header for a genesis snapshot crediting `records`.
    pub fn header(&self, records: &[MigrationRecord]) -> LedgerResult<SnapshotHeader> {
        let migrated = migrated_total(records, self.total_supply)?;
        let treasury = compute_treasury(self.total_supply, migrated)?;
        Ok(SnapshotHeader::full(self.network_id, 0, self.timestamp, treasury))
    }

    pub fn write<W: Write>(&self, sink: W, records: &[MigrationRecord]) -> LedgerResult<WriteSummary> {
        let header = self.header(records)?;
        let summary = write_snapshot(
            sink,
            self.writer_options(),
            &header,
            [Ok(MessageId::null())],
            synthesize_outputs(records.iter().map(|r| (r.address(), r.value))),
            std::iter::empty(),
        )?;
        self.log_written(&header, &summary);
        Ok(summary)
    }

    /// Write the genesis snapshot to `path`; nothing is left at `path` on
    /// failure.
    pub fn write_file(&self, path: &Path, records: &[MigrationRecord]) -> LedgerResult<WriteSummary> {
        let header = self.header(records)?;
        let summary = write_snapshot_file(
            path,
            self.writer_options(),
            &header,
            [Ok(MessageId::null())],
            synthesize_outputs(records.iter().map(|r| (r.address(), r.value))),
            std::iter::empty(),
        )?;
        self.log_written(&header, &summary);
        Ok(summary)
    }

    fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            total_supply: self.total_supply,
        }
    }

    fn log_written(&self, header: &SnapshotHeader, summary: &WriteSummary) {
        info!(
            network_id = self.network_id,
            outputs = summary.outputs,
            treasury = header.treasury.amount,
            bytes = summary.bytes_written,
            "genesis snapshot written"
        );
    }
}

fn migrated_total(records: &[MigrationRecord], total_supply: u64) -> LedgerResult<u64> {
    records.iter().try_fold(0u64, |acc, r| {
        acc.checked_add(r.value)
            .ok_or(LedgerError::SupplyInvariantViolated {
                migrated: u64::MAX,
                total_supply,
            })
    })
}
