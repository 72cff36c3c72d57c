//! Foundation types for the snapmig ledger-snapshot migration engine.
//!
//! Every other snapmig crate depends on `snapmig-types`.
//!
//! # Key Types
//!
//! - [`MessageId`], [`TransactionId`], [`MilestoneId`]: 32-byte identifiers
//! - [`OutputId`]: transaction identifier plus a 2-byte output index
//! - [`Ed25519Address`] / [`Address`]: target-network addresses
//! - [`LegacyAddress`]: 81-tryte address of the legacy (trinary) ledger
//! - [`parse_migration_address`]: recovers the Ed25519 target embedded in a
//!   legacy migration address
//! - [`network_id_from_str`]: network discriminator derivation

pub mod address;
pub mod error;
pub mod ids;
pub mod migration;
pub mod network;
pub mod protocol;
pub mod trinary;

pub use address::Address;
pub use error::TypeError;
pub use ids::{Ed25519Address, MessageId, MilestoneId, OutputId, TransactionId};
pub use migration::{migration_address, parse_migration_address};
pub use network::network_id_from_str;
pub use protocol::{MAX_OUTPUTS_PER_GROUP, TOTAL_SUPPLY};
pub use trinary::LegacyAddress;
