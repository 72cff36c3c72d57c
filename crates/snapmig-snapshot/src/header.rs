use std::io::Read;

use serde::{Deserialize, Serialize};
use snapmig_types::MilestoneId;

use crate::error::{SnapshotError, SnapshotResult, StreamKind};
use crate::wire::{put_u32, put_u64, put_u8, WireReader};

/// The only snapshot format version this codec reads and writes.
pub const SUPPORTED_FORMAT_VERSION: u8 = 1;

/// Encoded header length in bytes.
pub const HEADER_LENGTH: usize = 1 + 1 + 8 + 4 + 4 + 8 + 32 + 8 + 1;

/// Kind of snapshot. Full snapshots carry the complete unspent output set;
/// delta snapshots carry only milestone diffs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    Full,
    Delta,
}

impl SnapshotKind {
    pub fn type_byte(&self) -> u8 {
        match self {
            SnapshotKind::Full => 0,
            SnapshotKind::Delta => 1,
        }
    }

    pub fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(SnapshotKind::Full),
            1 => Some(SnapshotKind::Delta),
            _ => None,
        }
    }
}

/// Supply not yet distributed to individual outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryOutput {
    pub milestone_id: MilestoneId,
    pub amount: u64,
    pub spent: bool,
}

impl TreasuryOutput {
    /// Unspent treasury not tied to any milestone, as used by genesis snapshots.
    pub fn genesis(amount: u64) -> Self {
        Self {
            milestone_id: MilestoneId::null(),
            amount,
            spent: false,
        }
    }
}

/// Fixed-size header written once at the start of every snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub version: u8,
    pub kind: SnapshotKind,
    pub network_id: u64,
    /// Milestone index of the solid entry points.
    pub sep_index: u32,
    /// Milestone index the ledger state corresponds to.
    pub ledger_index: u32,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    pub treasury: TreasuryOutput,
}

impl SnapshotHeader {
    /// Header of a full snapshot at the supported format version.
    pub fn full(network_id: u64, index: u32, timestamp: u64, treasury: TreasuryOutput) -> Self {
        Self {
            version: SUPPORTED_FORMAT_VERSION,
            kind: SnapshotKind::Full,
            network_id,
            sep_index: index,
            ledger_index: index,
            timestamp,
            treasury,
        }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        put_u8(buf, self.version);
        put_u8(buf, self.kind.type_byte());
        put_u64(buf, self.network_id);
        put_u32(buf, self.sep_index);
        put_u32(buf, self.ledger_index);
        put_u64(buf, self.timestamp);
        buf.extend_from_slice(self.treasury.milestone_id.as_bytes());
        put_u64(buf, self.treasury.amount);
        put_u8(buf, self.treasury.spent as u8);
    }

    /// Decode a header, checking the version byte before anything else.
    pub(crate) fn decode<R: Read>(r: &mut WireReader<R>) -> SnapshotResult<Self> {
        const S: StreamKind = StreamKind::Header;
        let version = r.u8(S)?;
        if version != SUPPORTED_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }
        let kind_byte = r.u8(S)?;
        let kind = SnapshotKind::from_type_byte(kind_byte)
            .ok_or_else(|| r.corrupt(format!("unknown snapshot kind {kind_byte}")))?;
        Ok(Self {
            version,
            kind,
            network_id: r.u64(S)?,
            sep_index: r.u32(S)?,
            ledger_index: r.u32(S)?,
            timestamp: r.u64(S)?,
            treasury: TreasuryOutput {
                milestone_id: MilestoneId::new(r.bytes(S)?),
                amount: r.u64(S)?,
                spent: r.bool(S)?,
            },
        })
    }
}
