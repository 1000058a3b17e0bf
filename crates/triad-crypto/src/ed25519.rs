use ed25519_dalek::{Signer, Verifier};
use rand_core::OsRng;

/// Stock Ed25519 keypair, used by the Sender-Key group ratchet's
/// per-sender signature key (not derived from an X25519 identity key —
/// see `xeddsa` for that construction).
pub fn ed25519_keygen() -> ed25519_dalek::SigningKey {
    ed25519_dalek::SigningKey::generate(&mut OsRng)
}

pub fn ed25519_sign(sk: &ed25519_dalek::SigningKey, msg: &[u8]) -> [u8; 64] {
    sk.sign(msg).to_bytes()
}

pub fn ed25519_verify(pk: &ed25519_dalek::VerifyingKey, msg: &[u8], sig: &[u8; 64]) -> bool {
    let sig = ed25519_dalek::Signature::from_bytes(sig);
    pk.verify(msg, &sig).is_ok()
}
