use std::fmt;

use thiserror::Error;

use crate::header::SUPPORTED_FORMAT_VERSION;

/// The parts of a snapshot file, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StreamKind {
    Header,
    SolidEntryPoints,
    Outputs,
    MilestoneDiffs,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::Header => "header",
            StreamKind::SolidEntryPoints => "solid entry point",
            StreamKind::Outputs => "output",
            StreamKind::MilestoneDiffs => "milestone diff",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot format version {0} (supported: {SUPPORTED_FORMAT_VERSION})")]
    UnsupportedVersion(u8),

    #[error("{stream} stream truncated at byte offset {offset}")]
    TruncatedStream { stream: StreamKind, offset: u64 },

    #[error("corrupt snapshot at byte offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error(
        "supply invariant violated: treasury {treasury} + outputs {outputs} != total supply {total_supply}"
    )]
    SupplyInvariantViolated {
        treasury: u64,
        outputs: u128,
        total_supply: u64,
    },

    #[error("out-of-order write: cannot {action} while {stage}")]
    OutOfOrder {
        action: &'static str,
        stage: &'static str,
    },

    #[error("synthetic transaction ids exhausted after {groups} groups")]
    SyntheticIdsExhausted { groups: u32 },

    #[error("record producer failed: {0}")]
    Producer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
