//! Vanity peer identity search.
//!
//! A libp2p Ed25519 peer ID is the identity multihash of the protobuf-encoded
//! public key, and its KadID is the SHA-256 of those bytes. Keys are drawn at
//! random until the KadID starts with the wanted byte. The result can be fed
//! into the node's identity (see [`NodeSettings`](crate::config::NodeSettings)).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};

/// Protobuf header of an Ed25519 public key (type = 1, 32 data bytes).
const PUBLIC_KEY_HEADER: [u8; 4] = [0x08, 0x01, 0x12, 0x20];
/// Protobuf header of an Ed25519 private key (type = 1, 64 data bytes).
const PRIVATE_KEY_HEADER: [u8; 4] = [0x08, 0x01, 0x12, 0x40];
/// Identity multihash header for a 36-byte payload.
const IDENTITY_HEADER: [u8; 2] = [0x00, 0x24];

/// A peer identity and its placement key.
#[derive(Clone)]
pub struct PeerIdentity {
    peer_id: Vec<u8>,
    priv_key: Vec<u8>,
    kad_id: [u8; 32],
}

impl PeerIdentity {
    /// Derives the identity from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        let public = signing.verifying_key().to_bytes();

        let mut peer_id = Vec::with_capacity(38);
        peer_id.extend_from_slice(&IDENTITY_HEADER);
        peer_id.extend_from_slice(&PUBLIC_KEY_HEADER);
        peer_id.extend_from_slice(&public);

        let mut priv_key = Vec::with_capacity(68);
        priv_key.extend_from_slice(&PRIVATE_KEY_HEADER);
        priv_key.extend_from_slice(&seed);
        priv_key.extend_from_slice(&public);

        let kad_id = Sha256::digest(&peer_id).into();
        Self {
            peer_id,
            priv_key,
            kad_id,
        }
    }

    /// Base58 peer ID, as the node prints it.
    pub fn peer_id(&self) -> String {
        bs58::encode(&self.peer_id).into_string()
    }

    /// Base64 protobuf private key, as the node's config stores it.
    pub fn priv_key(&self) -> String {
        STANDARD.encode(&self.priv_key)
    }

    /// SHA-256 of the peer ID bytes.
    pub fn kad_id(&self) -> &[u8; 32] {
        &self.kad_id
    }

    /// [`kad_id`](Self::kad_id) as lowercase hex.
    pub fn kad_hex(&self) -> String {
        hex::encode(self.kad_id)
    }
}

impl std::fmt::Debug for PeerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerIdentity")
            .field("peer_id", &self.peer_id())
            .field("kad_id", &self.kad_hex())
            .finish_non_exhaustive()
    }
}

/// Draws random identities until one's KadID starts with `prefix`.
///
/// Returns the identity and the number of attempts, or `None` if
/// `max_attempts` is reached first. `None` for the limit searches forever.
pub fn mine(prefix: u8, max_attempts: Option<u64>) -> Option<(PeerIdentity, u64)> {
    let mut attempts = 0u64;
    loop {
        if max_attempts.is_some_and(|max| attempts >= max) {
            return None;
        }
        attempts += 1;
        let identity = PeerIdentity::from_seed(rand::random::<[u8; 32]>());
        if identity.kad_id[0] == prefix {
            return Some((identity, attempts));
        }
    }
}
