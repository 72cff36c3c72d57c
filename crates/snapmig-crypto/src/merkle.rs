use std::borrow::Cow;
use std::marker::PhantomData;

use blake2::Digest;
use serde::{Deserialize, Serialize};
use snapmig_types::{Ed25519Address, MessageId, MilestoneId, OutputId, TransactionId};

use crate::error::{CryptoError, CryptoResult};
use crate::hasher::Blake2b256;

/// Domain separation prefix of leaf hashes.
pub const LEAF_HASH_PREFIX: u8 = 0x00;
/// Domain separation prefix of inner node hashes.
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// An item that can be hashed into a Merkle leaf.
pub trait MerkleLeaf {
    /// Binary serialization of the item.
    fn leaf_bytes(&self) -> CryptoResult<Cow<'_, [u8]>>;
}

macro_rules! leaf_as_bytes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MerkleLeaf for $ty {
                fn leaf_bytes(&self) -> CryptoResult<Cow<'_, [u8]>> {
                    Ok(Cow::Borrowed(self.as_ref()))
                }
            }
        )*
    };
}

leaf_as_bytes!(
    MessageId,
    MilestoneId,
    TransactionId,
    OutputId,
    Ed25519Address,
    [u8; 32],
    Vec<u8>,
);

impl<T: MerkleLeaf + ?Sized> MerkleLeaf for &T {
    fn leaf_bytes(&self) -> CryptoResult<Cow<'_, [u8]>> {
        (**self).leaf_bytes()
    }
}

/// Side of a sibling in an inclusion proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Binary Merkle tree hasher in the style of RFC 6962 audit trees.
///
/// - empty sequence: `H()`
/// - one item: `H(0x00 ‖ item)`
/// - otherwise: split at the largest power of two strictly below the length
///   and combine the two subtree roots as `H(0x01 ‖ left ‖ right)`
///
/// The left subtree is always perfect, so the tree shape depends only on the
/// number of items. The hasher holds no state and can be shared freely.
pub struct MerkleHasher<D = Blake2b256> {
    _digest: PhantomData<fn() -> D>,
}

impl<D> Default for MerkleHasher<D> {
    fn default() -> Self {
        Self {
            _digest: PhantomData,
        }
    }
}

impl<D> Clone for MerkleHasher<D> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<D> std::fmt::Debug for MerkleHasher<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerkleHasher").finish()
    }
}

impl MerkleHasher<Blake2b256> {
    /// Hasher over Blake2b-256.
    pub fn blake2b() -> Self {
        Self::default()
    }
}

impl<D: Digest> MerkleHasher<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest length in bytes.
    pub fn size(&self) -> usize {
        <D as Digest>::output_size()
    }

    /// Root of the empty tree, equal to `hash(&[])`.
    pub fn empty_root(&self) -> Vec<u8> {
        D::new().finalize().to_vec()
    }

    /// Compute the Merkle root of `items`, in the given order.
    pub fn hash<T: MerkleLeaf>(&self, items: &[T]) -> CryptoResult<Vec<u8>> {
        match items.len() {
            0 => Ok(self.empty_root()),
            1 => self.leaf_hash(&items[0]),
            n => {
                let k = largest_power_of_two(n);
                let left = self.hash(&items[..k])?;
                let right = self.hash(&items[k..])?;
                Ok(self.node_hash(&left, &right))
            }
        }
    }

    /// `H(0x00 ‖ item)`.
    pub fn leaf_hash<T: MerkleLeaf + ?Sized>(&self, item: &T) -> CryptoResult<Vec<u8>> {
        let bytes = item.leaf_bytes()?;
        let mut h = D::new();
        h.update([LEAF_HASH_PREFIX]);
        h.update(bytes.as_ref());
        Ok(h.finalize().to_vec())
    }

    /// `H(0x01 ‖ left ‖ right)`.
    pub fn node_hash(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut h = D::new();
        h.update([NODE_HASH_PREFIX]);
        h.update(left);
        h.update(right);
        h.finalize().to_vec()
    }

    /// Build an inclusion proof for the item at `index`.
    pub fn proof<T: MerkleLeaf>(&self, items: &[T], index: usize) -> CryptoResult<InclusionProof> {
        if index >= items.len() {
            return Err(CryptoError::IndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        let mut path = Vec::new();
        self.audit_path(items, index, &mut path)?;
        Ok(InclusionProof {
            index,
            leaf: self.leaf_hash(&items[index])?,
            path,
        })
    }

    /// Recompute the root from a proof and compare it to `root`.
    pub fn verify(&self, proof: &InclusionProof, root: &[u8]) -> bool {
        let mut current = proof.leaf.clone();
        for (sibling, side) in &proof.path {
            current = match side {
                Side::Left => self.node_hash(sibling, &current),
                Side::Right => self.node_hash(&current, sibling),
            };
        }
        current == root
    }

    // Returns the subtree root; siblings are pushed leaf-first.
    fn audit_path<T: MerkleLeaf>(
        &self,
        items: &[T],
        index: usize,
        path: &mut Vec<(Vec<u8>, Side)>,
    ) -> CryptoResult<Vec<u8>> {
        if items.len() == 1 {
            return self.leaf_hash(&items[0]);
        }
        let k = largest_power_of_two(items.len());
        let (left, right) = if index < k {
            let left = self.audit_path(&items[..k], index, path)?;
            let right = self.hash(&items[k..])?;
            path.push((right.clone(), Side::Right));
            (left, right)
        } else {
            let left = self.hash(&items[..k])?;
            let right = self.audit_path(&items[k..], index - k, path)?;
            path.push((left.clone(), Side::Left));
            (left, right)
        };
        Ok(self.node_hash(&left, &right))
    }
}

/// Merkle inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Position of the proven item.
    pub index: usize,
    /// Leaf hash of the proven item.
    pub leaf: Vec<u8>,
    /// (sibling hash, sibling side) pairs from leaf to root.
    pub path: Vec<(Vec<u8>, Side)>,
}

/// Largest power of two strictly less than `n`. `n` must be at least 2.
fn largest_power_of_two(n: usize) -> usize {
    debug_assert!(n >= 2);
    1 << (usize::BITS - (n - 1).leading_zeros() - 1)
}
