use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

/// Blake2b with a 256-bit output, the single hash function used across
/// snapmig for integrity digests and Merkle trees.
pub type Blake2b256 = Blake2b<U32>;

/// One-shot Blake2b-256 of `data`.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(blake2b_256(b"hello world"), blake2b_256(b"hello world"));
    }

    #[test]
    fn different_data_different_hash() {
        assert_ne!(blake2b_256(b"a"), blake2b_256(b"b"));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut h = Blake2b256::new();
        h.update(b"hello ");
        h.update(b"world");
        let streamed: [u8; 32] = h.finalize().into();
        assert_eq!(streamed, blake2b_256(b"hello world"));
    }

    #[test]
    fn empty_input_known_vector() {
        assert_eq!(
            hex::encode(blake2b_256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }
}
