use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

/// Derive the numeric network discriminator from a network name.
///
/// The first eight bytes of `Blake2b-256(name)`, read little-endian.
pub fn network_id_from_str(name: &str) -> u64 {
    let digest = Blake2b::<U32>::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
