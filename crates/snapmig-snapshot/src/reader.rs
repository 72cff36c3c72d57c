use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use snapmig_types::MessageId;
use tracing::debug;

use crate::error::{SnapshotResult, StreamKind};
use crate::header::SnapshotHeader;
use crate::record::{MilestoneDiff, Output};
use crate::wire::WireReader;
use crate::writer::{write_snapshot, WriteSummary, WriterOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Header,
    SolidEntryPoints,
    Outputs,
    MilestoneDiffs,
    Done,
}

/// Pull-based snapshot reader.
///
/// Records are decoded one at a time in wire order. Asking for a later
/// section skips whatever remains of the earlier ones; asking for an earlier
/// section once it has been passed yields `None`.
pub struct SnapshotReader<R: Read> {
    inner: WireReader<R>,
    stage: Stage,
    header: Option<SnapshotHeader>,
}

impl<R: Read> SnapshotReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            inner: WireReader::new(source),
            stage: Stage::Header,
            header: None,
        }
    }

    /// Decode the header, or return the already decoded one.
    pub fn read_header(&mut self) -> SnapshotResult<&SnapshotHeader> {
        if self.header.is_none() {
            let header = SnapshotHeader::decode(&mut self.inner)?;
            debug!(
                kind = ?header.kind,
                ledger_index = header.ledger_index,
                treasury = header.treasury.amount,
                "snapshot header read"
            );
            self.header = Some(header);
            self.stage = Stage::SolidEntryPoints;
        }
        match &self.header {
            Some(header) => Ok(header),
            None => Err(self.inner.corrupt("header missing after decode")),
        }
    }

    pub fn next_solid_entry_point(&mut self) -> SnapshotResult<Option<MessageId>> {
        if !self.advance_to(Stage::SolidEntryPoints)? {
            return Ok(None);
        }
        if self.inner.record_tag(StreamKind::SolidEntryPoints)? {
            return Ok(Some(MessageId::new(self.inner.bytes(StreamKind::SolidEntryPoints)?)));
        }
        self.stage = Stage::Outputs;
        Ok(None)
    }

    pub fn next_output(&mut self) -> SnapshotResult<Option<Output>> {
        if !self.advance_to(Stage::Outputs)? {
            return Ok(None);
        }
        if self.inner.record_tag(StreamKind::Outputs)? {
            return Ok(Some(Output::decode(&mut self.inner, StreamKind::Outputs)?));
        }
        self.stage = Stage::MilestoneDiffs;
        Ok(None)
    }

    pub fn next_milestone_diff(&mut self) -> SnapshotResult<Option<MilestoneDiff>> {
        if !self.advance_to(Stage::MilestoneDiffs)? {
            return Ok(None);
        }
        if self.inner.record_tag(StreamKind::MilestoneDiffs)? {
            return Ok(Some(MilestoneDiff::decode(&mut self.inner)?));
        }
        if !self.inner.at_eof()? {
            return Err(self.inner.corrupt("trailing bytes after the last section"));
        }
        self.stage = Stage::Done;
        Ok(None)
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.inner.offset()
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    // Returns false if `target` has already been passed.
    fn advance_to(&mut self, target: Stage) -> SnapshotResult<bool> {
        if self.stage == Stage::Header {
            self.read_header()?;
        }
        while self.stage < target {
            match self.stage {
                Stage::SolidEntryPoints => {
                    while self.next_solid_entry_point()?.is_some() {}
                }
                Stage::Outputs => {
                    while self.next_output()?.is_some() {}
                }
                _ => break,
            }
        }
        Ok(self.stage == target)
    }
}

/// Callbacks for [`read_snapshot`]. Every method defaults to ignoring the
/// record.
pub trait SnapshotVisitor {
    fn header(&mut self, _header: &SnapshotHeader) -> SnapshotResult<()> {
        Ok(())
    }

    fn solid_entry_point(&mut self, _id: MessageId) -> SnapshotResult<()> {
        Ok(())
    }

    fn output(&mut self, _output: Output) -> SnapshotResult<()> {
        Ok(())
    }

    fn milestone_diff(&mut self, _diff: MilestoneDiff) -> SnapshotResult<()> {
        Ok(())
    }
}

impl SnapshotVisitor for () {}

/// Record counts of a fully read snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub header: SnapshotHeader,
    pub solid_entry_points: u64,
    pub outputs: u64,
    pub milestone_diffs: u64,
    pub output_supply: u128,
    pub bytes_read: u64,
}

/// Stream a whole snapshot through `visitor`, holding one record at a time.
pub fn read_snapshot<R: Read, V: SnapshotVisitor + ?Sized>(
    source: R,
    visitor: &mut V,
) -> SnapshotResult<SnapshotStats> {
    let mut reader = SnapshotReader::new(source);
    let header = reader.read_header()?.clone();
    visitor.header(&header)?;

    let mut stats = SnapshotStats {
        header,
        solid_entry_points: 0,
        outputs: 0,
        milestone_diffs: 0,
        output_supply: 0,
        bytes_read: 0,
    };
    while let Some(id) = reader.next_solid_entry_point()? {
        stats.solid_entry_points += 1;
        visitor.solid_entry_point(id)?;
    }
    while let Some(output) = reader.next_output()? {
        stats.outputs += 1;
        stats.output_supply += output.amount as u128;
        visitor.output(output)?;
    }
    while let Some(diff) = reader.next_milestone_diff()? {
        stats.milestone_diffs += 1;
        visitor.milestone_diff(diff)?;
    }
    stats.bytes_read = reader.offset();
    Ok(stats)
}

/// A snapshot held entirely in memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub header: SnapshotHeader,
    pub solid_entry_points: Vec<MessageId>,
    pub outputs: Vec<Output>,
    pub milestone_diffs: Vec<MilestoneDiff>,
}

impl Snapshot {
    pub fn new(header: SnapshotHeader) -> Self {
        Self {
            header,
            solid_entry_points: Vec::new(),
            outputs: Vec::new(),
            milestone_diffs: Vec::new(),
        }
    }

    /// Encode the snapshot into `sink`.
    pub fn write_to<W: Write>(&self, sink: W, options: WriterOptions) -> SnapshotResult<WriteSummary> {
        write_snapshot(
            sink,
            options,
            &self.header,
            self.solid_entry_points.iter().copied().map(Ok),
            self.outputs.iter().cloned().map(Ok),
            self.milestone_diffs.iter().cloned().map(Ok),
        )
    }
}

struct Collector(Option<Snapshot>);

impl SnapshotVisitor for Collector {
    fn header(&mut self, header: &SnapshotHeader) -> SnapshotResult<()> {
        self.0 = Some(Snapshot::new(header.clone()));
        Ok(())
    }

    fn solid_entry_point(&mut self, id: MessageId) -> SnapshotResult<()> {
        if let Some(snapshot) = &mut self.0 {
            snapshot.solid_entry_points.push(id);
        }
        Ok(())
    }

    fn output(&mut self, output: Output) -> SnapshotResult<()> {
        if let Some(snapshot) = &mut self.0 {
            snapshot.outputs.push(output);
        }
        Ok(())
    }

    fn milestone_diff(&mut self, diff: MilestoneDiff) -> SnapshotResult<()> {
        if let Some(snapshot) = &mut self.0 {
            snapshot.milestone_diffs.push(diff);
        }
        Ok(())
    }
}

/// Read a whole snapshot into memory. Only suitable for small snapshots.
pub fn read_snapshot_to_memory<R: Read>(source: R) -> SnapshotResult<Snapshot> {
    let mut collector = Collector(None);
    let stats = read_snapshot(source, &mut collector)?;
    Ok(collector.0.unwrap_or_else(|| Snapshot::new(stats.header)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapshotError;
    use crate::header::{SnapshotKind, TreasuryOutput};
    use crate::record::{Spent, OUTPUT_TYPE_SIG_LOCKED_SINGLE};
    use snapmig_types::{Address, Ed25519Address, OutputId, TransactionId};

    fn output(index: u16, amount: u64) -> Output {
        Output {
            message_id: MessageId::new([index as u8; 32]),
            output_id: OutputId::from_parts(&TransactionId::new([7u8; 32]), index),
            output_type: OUTPUT_TYPE_SIG_LOCKED_SINGLE,
            address: Address::from(Ed25519Address::new([index as u8; 32])),
            amount,
        }
    }

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::new(SnapshotHeader::full(5, 3, 1_000, TreasuryOutput::genesis(70)));
        snapshot.solid_entry_points = vec![MessageId::null(), MessageId::new([1u8; 32])];
        snapshot.outputs = vec![output(0, 20), output(1, 10)];
        snapshot.milestone_diffs = vec![MilestoneDiff {
            milestone_index: 3,
            created: vec![output(2, 5)],
            consumed: vec![Spent {
                output: output(3, 5),
                target_transaction_id: TransactionId::new([2u8; 32]),
                confirmation_index: 3,
            }],
        }];
        snapshot
    }

    fn options() -> WriterOptions {
        WriterOptions { total_supply: 100 }
    }

    fn encoded() -> Vec<u8> {
        let mut buf = Vec::new();
        sample().write_to(&mut buf, options()).unwrap();
        buf
    }

    #[test]
    fn pull_reader_yields_records_in_order() {
        let buf = encoded();
        let mut reader = SnapshotReader::new(buf.as_slice());
        assert_eq!(reader.read_header().unwrap().kind, SnapshotKind::Full);
        assert_eq!(reader.next_solid_entry_point().unwrap(), Some(MessageId::null()));
        assert!(reader.next_solid_entry_point().unwrap().is_some());
        assert_eq!(reader.next_solid_entry_point().unwrap(), None);
        assert_eq!(reader.next_output().unwrap(), Some(output(0, 20)));
        assert_eq!(reader.next_output().unwrap(), Some(output(1, 10)));
        assert_eq!(reader.next_output().unwrap(), None);
        assert_eq!(reader.next_milestone_diff().unwrap().unwrap().milestone_index, 3);
        assert_eq!(reader.next_milestone_diff().unwrap(), None);
        assert_eq!(reader.offset() as usize, buf.len());
    }

    #[test]
    fn skipping_ahead_drains_earlier_sections() {
        let buf = encoded();
        let mut reader = SnapshotReader::new(buf.as_slice());
        assert!(reader.next_milestone_diff().unwrap().is_some());
        // already passed
        assert_eq!(reader.next_output().unwrap(), None);
    }

    #[test]
    fn stats_count_records() {
        let buf = encoded();
        let stats = read_snapshot(buf.as_slice(), &mut ()).unwrap();
        assert_eq!(stats.solid_entry_points, 2);
        assert_eq!(stats.outputs, 2);
        assert_eq!(stats.milestone_diffs, 1);
        assert_eq!(stats.output_supply, 30);
        assert_eq!(stats.bytes_read as usize, buf.len());
    }

    #[test]
    fn memory_roundtrip_is_byte_identical() {
        let buf = encoded();
        let snapshot = read_snapshot_to_memory(buf.as_slice()).unwrap();
        assert_eq!(snapshot, sample());
        let mut again = Vec::new();
        snapshot.write_to(&mut again, options()).unwrap();
        assert_eq!(again, buf);
    }

    #[test]
    fn every_truncation_is_reported() {
        let buf = encoded();
        for len in 0..buf.len() {
            let err = read_snapshot(&buf[..len], &mut ()).unwrap_err();
            assert!(
                matches!(err, SnapshotError::TruncatedStream { .. }),
                "len {len}: {err}"
            );
        }
    }

    #[test]
    fn truncated_outputs_name_the_stream() {
        let buf = encoded();
        // header + 2 seps + their sentinel + half an output
        let cut = crate::header::HEADER_LENGTH + 2 * 33 + 1 + 40;
        let err = read_snapshot(&buf[..cut], &mut ()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::TruncatedStream { stream: StreamKind::Outputs, .. }
        ));
    }

    #[test]
    fn unsupported_version() {
        let mut buf = encoded();
        buf[0] = 2;
        assert!(matches!(
            read_snapshot(buf.as_slice(), &mut ()),
            Err(SnapshotError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn trailing_garbage_is_corrupt() {
        let mut buf = encoded();
        buf.push(0xAB);
        assert!(matches!(
            read_snapshot(buf.as_slice(), &mut ()),
            Err(SnapshotError::Corrupt { .. })
        ));
    }

    #[test]
    fn visitor_error_stops_reading() {
        struct FailOnOutput;
        impl SnapshotVisitor for FailOnOutput {
            fn output(&mut self, _output: Output) -> SnapshotResult<()> {
                Err(SnapshotError::Producer("stop".into()))
            }
        }
        let buf = encoded();
        assert!(read_snapshot(buf.as_slice(), &mut FailOnOutput).is_err());
    }
}
