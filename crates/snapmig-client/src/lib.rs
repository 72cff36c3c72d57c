//! HTTP clients for snapmig.
//!
//! - [`LegacyClient`] speaks the JSON command API of a legacy node and
//!   implements the ledger crate's `LedgerSource` and `SpentAddressOracle`
//! - [`NodeClient`] queries the REST API of a target network node
//! - [`gather_outputs`] fetches large output sets with bounded concurrency

pub mod error;
pub mod gather;
mod http;
pub mod legacy;
pub mod node;

pub use error::{ClientError, ClientResult};
pub use gather::{gather_outputs, DEFAULT_PARALLEL_QUERIES};
pub use http::DEFAULT_REQUEST_TIMEOUT;
pub use legacy::{LedgerDiffExt, LedgerStateResponse, LegacyClient, LegacyNodeInfo};
pub use node::{
    NodeClient, NodeInfo, NodeOutput, OutputFetcher, TreasuryResponse, DEFAULT_UNSPENT_OUTPUTS_ROUTE,
};
