use snapmig_snapshot::SnapshotError;

/// Errors produced while fetching, checking or converting the legacy ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("upstream node unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream protocol error: {0}")]
    UpstreamProtocolError(String),

    #[error("corrupt ledger entry {address}: {reason}")]
    LedgerCorrupt { address: String, reason: String },

    #[error("supply invariant violated: migrated {migrated} exceeds total supply {total_supply}")]
    SupplyInvariantViolated { migrated: u64, total_supply: u64 },

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
