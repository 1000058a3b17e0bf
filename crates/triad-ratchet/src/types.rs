use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use triad_crypto::{calculate_key_pair, x25519_keygen, xeddsa_sign};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

/// Long-term X25519 identity keypair. The corresponding Ed25519 public key
/// is derived deterministically via XEdDSA's `calculate_key_pair`, so only
/// one secret is ever generated or stored per identity — there is no
/// separate signing secret.
pub struct IdentityKey {
    secret: [u8; 32],
    pub x25519_public: [u8; 32],
    pub ed25519_public: [u8; 32],
}

impl IdentityKey {
    pub fn generate() -> Self {
        let (sk, pk) = x25519_keygen();
        Self::from_secret(sk.to_bytes(), pk.to_bytes())
    }

    pub fn from_secret(secret: [u8; 32], x25519_public: [u8; 32]) -> Self {
        let ed25519_public = calculate_key_pair(&secret).public;
        Self {
            secret,
            x25519_public,
            ed25519_public,
        }
    }

    pub fn static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.secret)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(self.x25519_public)
    }

    /// Sign `msg` via XEdDSA using this identity's X25519 secret.
    pub fn xeddsa_sign(&self, msg: &[u8], z: &[u8; 64]) -> [u8; 64] {
        let kp = calculate_key_pair(&self.secret);
        xeddsa_sign(&kp, msg, z)
    }
}

impl Drop for IdentityKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// X25519 keypair plus an XEdDSA signature over its public key, made with
/// the owning identity's key.
pub struct SignedPreKey {
    secret: [u8; 32],
    pub public: [u8; 32],
    pub signature: [u8; 64],
}

impl SignedPreKey {
    pub fn generate(identity: &IdentityKey, z: &[u8; 64]) -> Self {
        let (sk, pk) = x25519_keygen();
        let secret = sk.to_bytes();
        let public = pk.to_bytes();
        let signature = identity.xeddsa_sign(&public, z);
        Self {
            secret,
            public,
            signature,
        }
    }

    pub fn static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.secret)
    }
}

impl Drop for SignedPreKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Ephemeral X25519 keypair, published in bulk and consumed one per session.
pub struct OneTimePreKey {
    secret: [u8; 32],
    pub public: [u8; 32],
}

impl OneTimePreKey {
    pub fn generate() -> Self {
        let (sk, pk) = x25519_keygen();
        Self {
            secret: sk.to_bytes(),
            public: pk.to_bytes(),
        }
    }

    pub fn static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.secret)
    }
}

impl Drop for OneTimePreKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Published X3DH key material for an identity, as a client of the key
/// registry would fetch it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyBundle {
    pub identity_x25519_pub: [u8; 32],
    pub identity_ed25519_pub: [u8; 32],
    pub signed_prekey_pub: [u8; 32],
    pub signature: [u8; 64],
    pub one_time_prekey_pub: Option<[u8; 32]>,
}

/// Double Ratchet session state. `skipped_message_keys` is bounded at
/// `MAX_SKIP`; exceeding it is a fatal error for the session (the session
/// must be dropped, not pruned — see the design note on cache growth).
#[derive(Clone, Serialize, Deserialize)]
pub struct RatchetState {
    pub root_key: [u8; 32],
    pub send_chain_key: Option<[u8; 32]>,
    pub recv_chain_key: Option<[u8; 32]>,
    pub(crate) dh_secret: [u8; 32],
    pub dh_public: [u8; 32],
    pub remote_dh_pub: Option<[u8; 32]>,
    pub prev_sent_count: u32,
    pub sent_count: u32,
    pub recv_count: u32,
    pub skipped_message_keys: HashMap<([u8; 32], u32), [u8; 32]>,
}

/// Per-sender state for the Sender-Key group ratchet: a symmetric chain
/// plus the Ed25519 key used to sign each ciphertext.
#[derive(Clone, Serialize, Deserialize)]
pub struct SenderKey {
    pub chain_key: [u8; 32],
    pub(crate) signing_secret: [u8; 32],
    pub verifying_key: [u8; 32],
    pub generation: u32,
    pub message_number: u32,
}
