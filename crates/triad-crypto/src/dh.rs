use rand_core::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

/// X25519 keypair: `(secret, public)`.
pub fn x25519_keygen() -> (StaticSecret, PublicKey) {
    let sk = StaticSecret::random_from_rng(OsRng);
    let pk = PublicKey::from(&sk);
    (sk, pk)
}

/// X25519 Diffie-Hellman: `DH(sk, pk) -> shared[32]`.
pub fn x25519_dh(sk: &StaticSecret, pk: &PublicKey) -> [u8; 32] {
    sk.diffie_hellman(pk).to_bytes()
}
