use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tracing::info;

use crate::error::SnapshotResult;
use crate::reader::SnapshotReader;
use crate::record::Output;
use crate::writer::{write_atomically, SnapshotWriter, WriteSummary, WriterOptions};

/// Copy a snapshot from `source` to `sink`, passing every output of the
/// outputs section through `f`.
///
/// Records are streamed one at a time. The header and solid entry points are
/// copied verbatim. Milestone diffs are not carried over.
pub fn transform_snapshot<R, W, F>(
    source: R,
    sink: W,
    options: WriterOptions,
    mut f: F,
) -> SnapshotResult<WriteSummary>
where
    R: Read,
    W: Write,
    F: FnMut(&mut Output),
{
    let mut reader = SnapshotReader::new(source);
    let mut writer = SnapshotWriter::with_options(sink, options);

    writer.write_header(reader.read_header()?)?;
    while let Some(id) = reader.next_solid_entry_point()? {
        writer.write_solid_entry_point(&id)?;
    }
    while let Some(mut output) = reader.next_output()? {
        f(&mut output);
        writer.write_output(&output)?;
    }
    let mut dropped = 0u64;
    while reader.next_milestone_diff()?.is_some() {
        dropped += 1;
    }
    if dropped > 0 {
        info!(dropped, "milestone diffs dropped during transform");
    }
    writer.finish()
}

/// [`transform_snapshot`] between files. The target only appears once the
/// rewritten snapshot is complete and balanced.
pub fn transform_snapshot_file<F>(
    source: &Path,
    target: &Path,
    options: WriterOptions,
    f: F,
) -> SnapshotResult<WriteSummary>
where
    F: FnMut(&mut Output),
{
    let source = BufReader::new(File::open(source)?);
    write_atomically(target, |sink| transform_snapshot(source, sink, options, f))
}

/// Output rewrite binding synthetic output ids to a network: the first eight
/// bytes of every output id are overwritten with `network_id` little-endian.
///
/// Applying it to a genesis snapshot keeps the same ledger from being
/// replayed across networks.
pub fn rebind_output_id(network_id: u64) -> impl FnMut(&mut Output) {
    move |output: &mut Output| {
        output.output_id.as_mut_bytes()[..8].copy_from_slice(&network_id.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{SnapshotHeader, TreasuryOutput};
    use crate::reader::{read_snapshot_to_memory, Snapshot};
    use crate::record::MilestoneDiff;
    use crate::synthetic::synthesize_outputs;
    use snapmig_types::{network_id_from_str, Address, Ed25519Address, MessageId};

    fn genesis() -> Snapshot {
        let addr = Address::from(Ed25519Address::new([3u8; 32]));
        let mut snapshot = Snapshot::new(SnapshotHeader::full(1, 0, 0, TreasuryOutput::genesis(90)));
        snapshot.solid_entry_points.push(MessageId::null());
        snapshot.outputs = synthesize_outputs(vec![(addr, 4), (addr, 6)])
            .collect::<SnapshotResult<_>>()
            .unwrap();
        snapshot
    }

    fn options() -> WriterOptions {
        WriterOptions { total_supply: 100 }
    }

    #[test]
    fn identity_transform_is_byte_identical() {
        let mut source = Vec::new();
        genesis().write_to(&mut source, options()).unwrap();
        let mut sink = Vec::new();
        transform_snapshot(source.as_slice(), &mut sink, options(), |_| {}).unwrap();
        assert_eq!(source, sink);
    }

    #[test]
    fn rebind_rewrites_prefix_only() {
        let mut source = Vec::new();
        genesis().write_to(&mut source, options()).unwrap();
        let network_id = network_id_from_str("as-network");

        let mut sink = Vec::new();
        let summary =
            transform_snapshot(source.as_slice(), &mut sink, options(), rebind_output_id(network_id))
                .unwrap();
        assert_eq!(summary.outputs, 2);

        let rebound = read_snapshot_to_memory(sink.as_slice()).unwrap();
        for (before, after) in genesis().outputs.iter().zip(&rebound.outputs) {
            assert_eq!(&after.output_id.as_bytes()[..8], &network_id.to_le_bytes());
            assert_eq!(after.output_id.as_bytes()[8..], before.output_id.as_bytes()[8..]);
            assert_eq!(after.amount, before.amount);
        }
        assert_eq!(rebound.header, genesis().header);
    }

    #[test]
    fn diffs_are_dropped() {
        let mut snapshot = genesis();
        snapshot.milestone_diffs.push(MilestoneDiff::default());
        let mut source = Vec::new();
        snapshot.write_to(&mut source, options()).unwrap();

        let mut sink = Vec::new();
        let summary = transform_snapshot(source.as_slice(), &mut sink, options(), |_| {}).unwrap();
        assert_eq!(summary.milestone_diffs, 0);
        assert_eq!(sink.len(), source.len() - (1 + 4 + 4 + 4));
    }

    #[test]
    fn file_transform_leaves_no_target_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("genesis_snapshot_alt.bin");
        let target = dir.path().join("mod_genesis_snapshot_alt.bin");
        let mut bytes = Vec::new();
        genesis().write_to(&mut bytes, options()).unwrap();
        std::fs::write(&source, &bytes).unwrap();

        // supply no longer balances once an amount is rewritten
        let err = transform_snapshot_file(&source, &target, options(), |o| o.amount += 1).unwrap_err();
        assert!(matches!(err, crate::SnapshotError::SupplyInvariantViolated { .. }));
        assert!(!target.exists());
        assert!(!crate::writer::partial_path(&target).exists());

        transform_snapshot_file(&source, &target, options(), rebind_output_id(7)).unwrap();
        let rebound = read_snapshot_to_memory(std::fs::read(&target).unwrap().as_slice()).unwrap();
        assert_eq!(&rebound.outputs[0].output_id.as_bytes()[..8], &7u64.to_le_bytes());
    }
}
