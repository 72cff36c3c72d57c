//! Migration addresses: legacy addresses that embed a target-network
//! Ed25519 address.
//!
//! Layout (81 trytes): `"TRANSFER"` ‖ b1t6(ed25519 ‖ blake2b-256(ed25519)[..4]) ‖ `"9"`.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::error::TypeError;
use crate::ids::Ed25519Address;
use crate::trinary::{b1t6_decode, b1t6_encode, LegacyAddress};

const PREFIX: &str = "TRANSFER";
const CHECKSUM_LENGTH: usize = 4;
const PAYLOAD_TRYTES: usize = (32 + CHECKSUM_LENGTH) * 2;

fn checksum(addr: &[u8; 32]) -> [u8; CHECKSUM_LENGTH] {
    let digest = Blake2b::<U32>::digest(addr);
    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&digest[..CHECKSUM_LENGTH]);
    out
}

/// Build the migration address for an Ed25519 target address.
pub fn migration_address(target: &Ed25519Address) -> LegacyAddress {
    let mut payload = Vec::with_capacity(32 + CHECKSUM_LENGTH);
    payload.extend_from_slice(target.as_bytes());
    payload.extend_from_slice(&checksum(target.as_bytes()));
    LegacyAddress::from_trytes_unchecked(format!("{PREFIX}{}9", b1t6_encode(&payload)))
}

/// Recover the Ed25519 target from a migration address.
///
/// Returns [`TypeError::NotMigrationAddress`] when the address lacks the
/// prefix, padding or checksum. Callers treat that as "plain legacy address",
/// not as a failure.
pub fn parse_migration_address(addr: &LegacyAddress) -> Result<Ed25519Address, TypeError> {
    let s = addr.as_str();
    let not_migration = |reason: &str| TypeError::NotMigrationAddress(reason.to_string());

    let rest = s
        .strip_prefix(PREFIX)
        .ok_or_else(|| not_migration("missing prefix"))?;
    let payload = rest
        .strip_suffix('9')
        .filter(|p| p.len() == PAYLOAD_TRYTES)
        .ok_or_else(|| not_migration("bad padding"))?;

    let bytes = b1t6_decode(payload).map_err(|_| not_migration("payload is not b1t6"))?;
    let mut target = [0u8; 32];
    target.copy_from_slice(&bytes[..32]);
    if bytes[32..] != checksum(&target) {
        return Err(not_migration("checksum mismatch"));
    }
    Ok(Ed25519Address::new(target))
}
