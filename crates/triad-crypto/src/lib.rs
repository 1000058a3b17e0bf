pub mod aead;
pub mod dh;
pub mod ed25519;
pub mod hash;
pub mod kdf;
pub mod xeddsa;

pub use aead::{chacha20_poly1305_open, chacha20_poly1305_seal, ratchet_nonce};
pub use dh::{x25519_dh, x25519_keygen};
pub use ed25519::{ed25519_keygen, ed25519_sign, ed25519_verify};
pub use hash::{keccak256, keccak256_concat, sha256, sha512};
pub use kdf::{hkdf_sha256, hmac_sha256};
pub use xeddsa::{calculate_key_pair, xeddsa_sign, xeddsa_verify, XEdDSAKeyPair};
