//! Legacy ledger snapshotting for snapmig.
//!
//! This crate turns a legacy ledger state into the genesis of the target
//! network. It provides:
//! - `LedgerSource` / `SpentAddressOracle` trait boundaries to legacy nodes
//! - `Ledger` validation and ordering of raw balances
//! - The ledger integrity digest and the flat global dump
//! - Migration classification and the genesis treasury
//! - `GenesisBuilder`, writing the genesis snapshot
//! - In-memory source and oracle for tests and embedding

pub mod classify;
pub mod dump;
pub mod entry;
pub mod error;
pub mod genesis;
pub mod integrity;
pub mod memory;
pub mod traits;
pub mod treasury;

pub use classify::{
    classify, classify_with_spent_check, EligibilitySummary, MigrationRecord, SpentDiagnostics,
    DEFAULT_MIN_MIGRATION_AMOUNT,
};
pub use dump::{read_global_dump, write_global_dump, write_global_dump_file};
pub use entry::{Ledger, LedgerEntry};
pub use error::{LedgerError, LedgerResult};
pub use genesis::GenesisBuilder;
pub use integrity::{integrity_digest, integrity_digest_hex};
pub use memory::{InMemoryLedgerSource, InMemorySpentOracle};
pub use traits::{fetch_ledger, LedgerSource, RawLedgerState, SpentAddressOracle};
pub use treasury::compute_treasury;
