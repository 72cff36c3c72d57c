//! Snapshot stream codec for snapmig.
//!
//! A snapshot file is a fixed-size header followed by three record sections,
//! each terminated by a sentinel byte:
//!
//! - **Header**: format version, kind, network id, indexes, timestamp and the
//!   treasury output
//! - **Solid entry points**: 32-byte message ids
//! - **Outputs**: the unspent output set
//! - **Milestone diffs**: created and consumed outputs per milestone
//!
//! All integers are little-endian. [`SnapshotWriter`] and [`SnapshotReader`]
//! stream records one at a time, so neither side holds the ledger in memory.
//! Full snapshots must conserve the total supply; the writer refuses to
//! finish otherwise.

pub mod error;
pub mod header;
pub mod reader;
pub mod record;
pub mod synthetic;
pub mod transform;
mod wire;
pub mod writer;

pub use error::{SnapshotError, SnapshotResult, StreamKind};
pub use header::{SnapshotHeader, SnapshotKind, TreasuryOutput, SUPPORTED_FORMAT_VERSION};
pub use reader::{
    read_snapshot, read_snapshot_to_memory, Snapshot, SnapshotReader, SnapshotStats, SnapshotVisitor,
};
pub use record::{MilestoneDiff, Output, Spent, OUTPUT_TYPE_SIG_LOCKED_SINGLE};
pub use synthetic::{synthesize_outputs, SyntheticOutputIds, SyntheticOutputs};
pub use transform::{rebind_output_id, transform_snapshot, transform_snapshot_file};
pub use writer::{
    partial_path, write_snapshot, write_snapshot_file, SnapshotWriter, WriteSummary, WriterOptions,
};
