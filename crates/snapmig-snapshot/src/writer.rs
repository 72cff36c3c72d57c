use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snapmig_types::{MessageId, TOTAL_SUPPLY};
use tracing::{debug, warn};

use crate::error::{SnapshotError, SnapshotResult};
use crate::header::{SnapshotHeader, SnapshotKind};
use crate::record::{MilestoneDiff, Output};
use crate::wire::{put_u8, END_OF_STREAM, RECORD_TAG};

/// Knobs for [`SnapshotWriter`].
#[derive(Clone, Debug)]
pub struct WriterOptions {
    /// Supply a full snapshot must account for exactly.
    pub total_supply: u64,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            total_supply: TOTAL_SUPPLY,
        }
    }
}

/// What a finished writer produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub solid_entry_points: u64,
    pub outputs: u64,
    pub milestone_diffs: u64,
    /// Sum of all output amounts in the outputs stream.
    pub output_supply: u128,
    pub bytes_written: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    AwaitingHeader,
    SolidEntryPoints,
    Outputs,
    MilestoneDiffs,
}

impl Stage {
    fn describe(self) -> &'static str {
        match self {
            Stage::AwaitingHeader => "awaiting the header",
            Stage::SolidEntryPoints => "writing solid entry points",
            Stage::Outputs => "writing outputs",
            Stage::MilestoneDiffs => "writing milestone diffs",
        }
    }

    fn next(self) -> Self {
        match self {
            Stage::AwaitingHeader => Stage::SolidEntryPoints,
            Stage::SolidEntryPoints => Stage::Outputs,
            Stage::Outputs | Stage::MilestoneDiffs => Stage::MilestoneDiffs,
        }
    }
}

/// Streaming snapshot writer.
///
/// Sections must be written in wire order: header, solid entry points,
/// outputs, milestone diffs. Writing a record of a later section closes the
/// earlier ones; going back is an [`SnapshotError::OutOfOrder`] error.
/// [`finish`](Self::finish) closes the remaining sections and checks the
/// supply invariant of full snapshots.
pub struct SnapshotWriter<W: Write> {
    sink: W,
    options: WriterOptions,
    stage: Stage,
    header: Option<SnapshotHeader>,
    summary: WriteSummary,
    buf: Vec<u8>,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, WriterOptions::default())
    }

    pub fn with_options(sink: W, options: WriterOptions) -> Self {
        Self {
            sink,
            options,
            stage: Stage::AwaitingHeader,
            header: None,
            summary: WriteSummary::default(),
            buf: Vec::with_capacity(256),
        }
    }

    pub fn write_header(&mut self, header: &SnapshotHeader) -> SnapshotResult<()> {
        if self.stage != Stage::AwaitingHeader {
            return Err(self.out_of_order("write the header"));
        }
        self.buf.clear();
        header.encode(&mut self.buf);
        self.flush_buf()?;
        self.header = Some(header.clone());
        self.stage = Stage::SolidEntryPoints;
        debug!(
            kind = ?header.kind,
            network_id = header.network_id,
            ledger_index = header.ledger_index,
            "snapshot header written"
        );
        Ok(())
    }

    pub fn write_solid_entry_point(&mut self, id: &MessageId) -> SnapshotResult<()> {
        self.enter(Stage::SolidEntryPoints, "write a solid entry point")?;
        self.buf.clear();
        put_u8(&mut self.buf, RECORD_TAG);
        self.buf.extend_from_slice(id.as_bytes());
        self.flush_buf()?;
        self.summary.solid_entry_points += 1;
        Ok(())
    }

    pub fn write_output(&mut self, output: &Output) -> SnapshotResult<()> {
        self.enter(Stage::Outputs, "write an output")?;
        self.buf.clear();
        put_u8(&mut self.buf, RECORD_TAG);
        output.encode(&mut self.buf);
        self.flush_buf()?;
        self.summary.outputs += 1;
        self.summary.output_supply += output.amount as u128;
        Ok(())
    }

    pub fn write_milestone_diff(&mut self, diff: &MilestoneDiff) -> SnapshotResult<()> {
        self.enter(Stage::MilestoneDiffs, "write a milestone diff")?;
        self.buf.clear();
        put_u8(&mut self.buf, RECORD_TAG);
        diff.encode(&mut self.buf)?;
        self.flush_buf()?;
        self.summary.milestone_diffs += 1;
        Ok(())
    }

    /// Check the supply invariant, then close all sections and flush the
    /// sink.
    ///
    /// An unbalanced full snapshot fails before any closing sentinel is
    /// written, so the sink never holds a stream that decodes cleanly.
    pub fn finish(mut self) -> SnapshotResult<WriteSummary> {
        let header = match self.header.take() {
            Some(header) => header,
            None => return Err(self.out_of_order("finish")),
        };
        if header.kind == SnapshotKind::Full {
            check_supply(header.treasury.amount, self.summary.output_supply, self.options.total_supply)?;
        }
        while self.stage < Stage::MilestoneDiffs {
            self.close_stage()?;
        }
        self.buf.clear();
        put_u8(&mut self.buf, END_OF_STREAM);
        self.flush_buf()?;
        self.sink.flush()?;

        debug!(
            outputs = self.summary.outputs,
            bytes = self.summary.bytes_written,
            "snapshot finished"
        );
        Ok(self.summary)
    }

    fn enter(&mut self, target: Stage, action: &'static str) -> SnapshotResult<()> {
        if self.stage == Stage::AwaitingHeader || self.stage > target {
            return Err(self.out_of_order(action));
        }
        while self.stage < target {
            self.close_stage()?;
        }
        Ok(())
    }

    fn close_stage(&mut self) -> SnapshotResult<()> {
        self.buf.clear();
        put_u8(&mut self.buf, END_OF_STREAM);
        self.flush_buf()?;
        self.stage = self.stage.next();
        Ok(())
    }

    fn flush_buf(&mut self) -> SnapshotResult<()> {
        self.sink.write_all(&self.buf)?;
        self.summary.bytes_written += self.buf.len() as u64;
        Ok(())
    }

    fn out_of_order(&self, action: &'static str) -> SnapshotError {
        SnapshotError::OutOfOrder {
            action,
            stage: self.stage.describe(),
        }
    }
}

fn check_supply(treasury: u64, outputs: u128, total_supply: u64) -> SnapshotResult<()> {
    if treasury as u128 + outputs != total_supply as u128 {
        return Err(SnapshotError::SupplyInvariantViolated {
            treasury,
            outputs,
            total_supply,
        });
    }
    Ok(())
}

/// Write a complete snapshot by draining one producer per section.
///
/// Producers are pulled lazily, so arbitrarily large output sets never need
/// to be held in memory. The first producer error aborts the write.
pub fn write_snapshot<W, S, O, D>(
    sink: W,
    options: WriterOptions,
    header: &SnapshotHeader,
    solid_entry_points: S,
    outputs: O,
    milestone_diffs: D,
) -> SnapshotResult<WriteSummary>
where
    W: Write,
    S: IntoIterator<Item = SnapshotResult<MessageId>>,
    O: IntoIterator<Item = SnapshotResult<Output>>,
    D: IntoIterator<Item = SnapshotResult<MilestoneDiff>>,
{
    let mut writer = SnapshotWriter::with_options(sink, options);
    writer.write_header(header)?;
    for sep in solid_entry_points {
        writer.write_solid_entry_point(&sep?)?;
    }
    for output in outputs {
        writer.write_output(&output?)?;
    }
    for diff in milestone_diffs {
        writer.write_milestone_diff(&diff?)?;
    }
    writer.finish()
}

/// Path of the temporary file a snapshot is staged in before the rename.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// [`write_snapshot`] into a file.
///
/// The snapshot is written to `<path>.partial` and renamed into place only
/// after [`SnapshotWriter::finish`] succeeded, so a failed or unbalanced
/// snapshot never appears at `path`.
pub fn write_snapshot_file<S, O, D>(
    path: &Path,
    options: WriterOptions,
    header: &SnapshotHeader,
    solid_entry_points: S,
    outputs: O,
    milestone_diffs: D,
) -> SnapshotResult<WriteSummary>
where
    S: IntoIterator<Item = SnapshotResult<MessageId>>,
    O: IntoIterator<Item = SnapshotResult<Output>>,
    D: IntoIterator<Item = SnapshotResult<MilestoneDiff>>,
{
    write_atomically(path, |sink| {
        write_snapshot(sink, options, header, solid_entry_points, outputs, milestone_diffs)
    })
}

/// Run `write` against a buffered `<path>.partial` and rename the result to
/// `path` only if it succeeded and was synced. On failure the partial file
/// is removed.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> SnapshotResult<WriteSummary>
where
    F: FnOnce(&mut BufWriter<File>) -> SnapshotResult<WriteSummary>,
{
    let partial = partial_path(path);
    let result = File::create(&partial)
        .map_err(SnapshotError::from)
        .and_then(|file| {
            let mut sink = BufWriter::new(file);
            let summary = write(&mut sink)?;
            let file = sink.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
            Ok(summary)
        });

    match result {
        Ok(summary) => {
            fs::rename(&partial, path)?;
            Ok(summary)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %cleanup, "failed to remove partial snapshot");
                }
            }
            Err(e)
        }
    }
}
