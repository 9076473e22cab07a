//! Content and peer identifiers.
//!
//! A content identifier wraps a self-describing digest (multihash). That
//! digest, not the identifier text, is what the node logs when it advertises,
//! so it is the tracking key. Its SHA-256 is the DHT placement key ("KadID").
//!
//! The submodules are standalone utilities exposed as CLI subcommands:
//! - [`kad`]: identifier → KadID conversion and per-prefix selection
//! - [`vanity`]: search for an Ed25519 peer identity with a chosen KadID prefix
//! - [`generate`]: content files covering every 8-bit or 10-bit KadID prefix

pub mod generate;
pub mod kad;
pub mod vanity;

use cid::Cid;
use sha2::{Digest, Sha256};

/// Multicodec for raw binary content.
pub const RAW_CODEC: u64 = 0x55;

/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// Decodes `id` and returns its multihash bytes.
pub fn digest_of(id: &str) -> Result<Vec<u8>, cid::Error> {
    let cid = Cid::try_from(id)?;
    Ok(cid.hash().to_bytes())
}

/// DHT placement key of a digest.
pub fn kad_id(digest: &[u8]) -> [u8; 32] {
    Sha256::digest(digest).into()
}

/// Identifier (CIDv1, raw codec, SHA2-256) of `content`, with its digest.
///
/// This is what the node assigns to a file added with raw leaves.
pub fn raw_content_id(content: &[u8]) -> Result<(Cid, Vec<u8>), cid::Error> {
    let sum = Sha256::digest(content);
    let mh = cid::multihash::Multihash::<64>::wrap(SHA2_256, &sum)
        .map_err(|_| cid::Error::ParsingError)?;
    let digest = mh.to_bytes();
    Ok((Cid::new_v1(RAW_CODEC, mh), digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EMPTY_DIR_CID;

    #[test]
    fn v0_identifier_decodes_to_sha256_multihash() {
        let digest = digest_of(EMPTY_DIR_CID).unwrap();
        assert_eq!(digest.len(), 34);
        assert_eq!(&digest[..2], &[0x12, 0x20]);
    }

    #[test]
    fn v1_identifier_round_trips_through_its_digest() {
        let (cid, digest) = raw_content_id(b"ipfs-test-0\n").unwrap();
        let text = cid.to_string();
        assert!(text.starts_with('b'));
        assert_eq!(digest_of(&text).unwrap(), digest);
    }

    #[test]
    fn raw_digest_is_prefixed_sha256_of_content() {
        let (_, digest) = raw_content_id(b"hello").unwrap();
        assert_eq!(&digest[..2], &[0x12, 0x20]);
        assert_eq!(&digest[2..], Sha256::digest(b"hello").as_slice());
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(digest_of("definitely not an identifier").is_err());
        assert!(digest_of("").is_err());
    }

    #[test]
    fn kad_id_is_sha256_of_digest() {
        let digest = digest_of(EMPTY_DIR_CID).unwrap();
        let expected: [u8; 32] = Sha256::digest(&digest).into();
        assert_eq!(kad_id(&digest), expected);
    }
}
