use std::io::Read;

use serde::{Deserialize, Serialize};
use snapmig_types::{Address, MessageId, OutputId, TransactionId};

use crate::error::{SnapshotError, SnapshotResult, StreamKind};
use crate::wire::{put_u32, put_u64, put_u8, WireReader};

/// Output type byte of a signature-locked single output.
pub const OUTPUT_TYPE_SIG_LOCKED_SINGLE: u8 = 0;

/// An unspent output of the target ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Message that created the output. Null for synthetic genesis outputs.
    pub message_id: MessageId,
    pub output_id: OutputId,
    pub output_type: u8,
    pub address: Address,
    pub amount: u64,
}

impl Output {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.message_id.as_bytes());
        buf.extend_from_slice(self.output_id.as_bytes());
        put_u8(buf, self.output_type);
        put_u8(buf, self.address.type_byte());
        buf.extend_from_slice(self.address.as_bytes());
        put_u64(buf, self.amount);
    }

    pub(crate) fn decode<R: Read>(r: &mut WireReader<R>, stream: StreamKind) -> SnapshotResult<Self> {
        let message_id = MessageId::new(r.bytes(stream)?);
        let output_id = OutputId::new(r.bytes(stream)?);
        let output_type = r.u8(stream)?;
        let address_type = r.u8(stream)?;
        let address_bytes = r.bytes::<32>(stream)?;
        let address = Address::from_parts(address_type, address_bytes)
            .map_err(|e| r.corrupt(e.to_string()))?;
        Ok(Self {
            message_id,
            output_id,
            output_type,
            address,
            amount: r.u64(stream)?,
        })
    }
}

/// An output consumed by a milestone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spent {
    pub output: Output,
    pub target_transaction_id: TransactionId,
    pub confirmation_index: u32,
}

impl Spent {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        self.output.encode(buf);
        buf.extend_from_slice(self.target_transaction_id.as_bytes());
        put_u32(buf, self.confirmation_index);
    }

    pub(crate) fn decode<R: Read>(r: &mut WireReader<R>) -> SnapshotResult<Self> {
        const S: StreamKind = StreamKind::MilestoneDiffs;
        Ok(Self {
            output: Output::decode(r, S)?,
            target_transaction_id: TransactionId::new(r.bytes(S)?),
            confirmation_index: r.u32(S)?,
        })
    }
}

/// Ledger mutations applied by a single milestone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneDiff {
    pub milestone_index: u32,
    pub created: Vec<Output>,
    pub consumed: Vec<Spent>,
}

impl MilestoneDiff {
    /// Sum of created output amounts.
    pub fn created_total(&self) -> u128 {
        self.created.iter().map(|o| o.amount as u128).sum()
    }

    /// Sum of consumed output amounts.
    pub fn consumed_total(&self) -> u128 {
        self.consumed.iter().map(|s| s.output.amount as u128).sum()
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) -> SnapshotResult<()> {
        put_u32(buf, self.milestone_index);
        put_u32(buf, count(self.created.len(), "created outputs")?);
        for output in &self.created {
            output.encode(buf);
        }
        put_u32(buf, count(self.consumed.len(), "consumed outputs")?);
        for spent in &self.consumed {
            spent.encode(buf);
        }
        Ok(())
    }

    pub(crate) fn decode<R: Read>(r: &mut WireReader<R>) -> SnapshotResult<Self> {
        const S: StreamKind = StreamKind::MilestoneDiffs;
        let milestone_index = r.u32(S)?;
        // counts are untrusted; no preallocation
        let created_count = r.u32(S)?;
        let mut created = Vec::new();
        for _ in 0..created_count {
            created.push(Output::decode(r, S)?);
        }
        let consumed_count = r.u32(S)?;
        let mut consumed = Vec::new();
        for _ in 0..consumed_count {
            consumed.push(Spent::decode(r)?);
        }
        Ok(Self {
            milestone_index,
            created,
            consumed,
        })
    }
}

fn count(len: usize, what: &str) -> SnapshotResult<u32> {
    u32::try_from(len)
        .map_err(|_| SnapshotError::Producer(format!("too many {what} in one milestone diff: {len}")))
}
