//! Hashing primitives for snapmig.
//!
//! Provides Blake2b-256 helpers and an RFC-12 style binary Merkle hasher with
//! leaf/node domain separation and inclusion proofs.
//!
//! All crypto operations wrap the RustCrypto `blake2` implementation.

pub mod error;
pub mod hasher;
pub mod merkle;

pub use error::{CryptoError, CryptoResult};
pub use hasher::{blake2b_256, Blake2b256};
pub use merkle::{InclusionProof, MerkleHasher, MerkleLeaf, Side};
