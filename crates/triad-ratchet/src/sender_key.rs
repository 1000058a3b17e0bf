//! Sender-Key group ratchet. A symmetric fan-out primitive:
//! one sender key per publisher, distributed to group members over a 1:1
//! Double Ratchet session as a 68-byte payload.

use crate::types::SenderKey;
use ed25519_dalek::{SigningKey, VerifyingKey};
use std::collections::HashMap;
use triad_core::TriadError;
use triad_crypto::{
    chacha20_poly1305_open, chacha20_poly1305_seal, ed25519_sign, ed25519_verify, hmac_sha256,
    keccak256_concat, ratchet_nonce,
};

/// Wire payload used to hand a `SenderKey` to a new group member over a
/// Double Ratchet session: `u32 generation ‖ chain_key(32) ‖ signature_pub(32)`.
pub const DISTRIBUTION_LEN: usize = 68;

impl SenderKey {
    pub fn generate() -> Self {
        let chain_key = rand_chain_key();
        let signing_key = SigningKey::generate(&mut rand_core::OsRng);
        Self {
            chain_key,
            signing_secret: signing_key.to_bytes(),
            verifying_key: signing_key.verifying_key().to_bytes(),
            generation: 0,
            message_number: 0,
        }
    }

    pub fn encode_distribution(&self) -> [u8; DISTRIBUTION_LEN] {
        let mut out = [0u8; DISTRIBUTION_LEN];
        out[0..4].copy_from_slice(&self.generation.to_be_bytes());
        out[4..36].copy_from_slice(&self.chain_key);
        out[36..68].copy_from_slice(&self.verifying_key);
        out
    }

    pub fn decode_distribution(bytes: &[u8]) -> Result<Self, TriadError> {
        if bytes.len() != DISTRIBUTION_LEN {
            return Err(TriadError::InvalidHeaderLength { got: bytes.len() });
        }
        let generation = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let mut chain_key = [0u8; 32];
        chain_key.copy_from_slice(&bytes[4..36]);
        let mut verifying_key = [0u8; 32];
        verifying_key.copy_from_slice(&bytes[36..68]);
        Ok(Self {
            chain_key,
            signing_secret: [0u8; 32],
            verifying_key,
            generation,
            message_number: 0,
        })
    }
}

fn rand_chain_key() -> [u8; 32] {
    use rand_core::RngCore;
    let mut buf = [0u8; 32];
    rand_core::OsRng.fill_bytes(&mut buf);
    buf
}

fn advance_chain(chain_key: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let mk = hmac_sha256(chain_key, b"SK_MK");
    let next = hmac_sha256(chain_key, b"SK_CK");
    (mk, next)
}

fn group_ad(group_id: &[u8], generation: u32, n: u32) -> [u8; 32] {
    keccak256_concat(&[group_id, &generation.to_be_bytes(), &n.to_be_bytes()])
}

pub struct GroupCiphertext {
    pub generation: u32,
    pub n: u32,
    pub ciphertext: Vec<u8>,
    pub signature: [u8; 64],
}

/// Encrypt `plaintext` under the sender's own key, advancing its chain by
/// one step. `user_id` identifies the signer but is not mixed into the AD;
/// it exists for caller-side bookkeeping/auditing.
pub fn encrypt_group(
    sender_key: &mut SenderKey,
    plaintext: &[u8],
    group_id: &[u8],
    _user_id: &[u8],
) -> GroupCiphertext {
    let (mk, next_ck) = advance_chain(&sender_key.chain_key);
    let n = sender_key.message_number;
    sender_key.chain_key = next_ck;
    sender_key.message_number += 1;

    let ad = group_ad(group_id, sender_key.generation, n);
    let nonce = ratchet_nonce(n);
    let ciphertext = chacha20_poly1305_seal(&mk, &nonce, &ad, plaintext);

    let signing_key = SigningKey::from_bytes(&sender_key.signing_secret);
    let signature = ed25519_sign(&signing_key, &ciphertext);

    GroupCiphertext {
        generation: sender_key.generation,
        n,
        ciphertext,
        signature,
    }
}

/// Verify and decrypt a message from a previously distributed `SenderKey`,
/// tolerating out-of-order delivery via a per-key skipped-message cache.
pub fn decrypt_group(
    stored: &mut SenderKey,
    skipped: &mut HashMap<(u32, u32), [u8; 32]>,
    msg: &GroupCiphertext,
    group_id: &[u8],
) -> Result<Vec<u8>, TriadError> {
    let verifying_key = VerifyingKey::from_bytes(&stored.verifying_key)
        .map_err(|_| TriadError::InvalidSignature)?;
    if !ed25519_verify(&verifying_key, &msg.ciphertext, &msg.signature) {
        return Err(TriadError::InvalidSignature);
    }

    if msg.generation != stored.generation {
        return Err(TriadError::NonMonotonicMsgIndex {
            last: stored.generation as u64,
            got: msg.generation as u64,
        });
    }

    let ad = group_ad(group_id, msg.generation, msg.n);
    let nonce = ratchet_nonce(msg.n);

    if let Some(mk) = skipped.remove(&(msg.generation, msg.n)) {
        return chacha20_poly1305_open(&mk, &nonce, &ad, &msg.ciphertext);
    }

    while stored.message_number < msg.n {
        let (mk, next_ck) = advance_chain(&stored.chain_key);
        skipped.insert((stored.generation, stored.message_number), mk);
        stored.chain_key = next_ck;
        stored.message_number += 1;
    }

    let (mk, next_ck) = advance_chain(&stored.chain_key);
    stored.chain_key = next_ck;
    stored.message_number += 1;

    chacha20_poly1305_open(&mk, &nonce, &ad, &msg.ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let mut sender = SenderKey::generate();
        let dist = sender.encode_distribution();
        let mut receiver = SenderKey::decode_distribution(&dist).unwrap();
        let mut skipped = HashMap::new();

        let group_id = b"group-1";
        let msg = encrypt_group(&mut sender, b"hello group", group_id, b"alice");
        let plaintext = decrypt_group(&mut receiver, &mut skipped, &msg, group_id).unwrap();
        assert_eq!(plaintext, b"hello group");
    }

    #[test]
    fn out_of_order_group_messages() {
        let mut sender = SenderKey::generate();
        let dist = sender.encode_distribution();
        let mut receiver = SenderKey::decode_distribution(&dist).unwrap();
        let mut skipped = HashMap::new();
        let group_id = b"group-2";

        let m1 = encrypt_group(&mut sender, b"one", group_id, b"alice");
        let m2 = encrypt_group(&mut sender, b"two", group_id, b"alice");
        let m3 = encrypt_group(&mut sender, b"three", group_id, b"alice");

        assert_eq!(decrypt_group(&mut receiver, &mut skipped, &m3, group_id).unwrap(), b"three");
        assert_eq!(decrypt_group(&mut receiver, &mut skipped, &m1, group_id).unwrap(), b"one");
        assert_eq!(decrypt_group(&mut receiver, &mut skipped, &m2, group_id).unwrap(), b"two");
        assert!(skipped.is_empty());
    }

    #[test]
    fn tampered_signature_rejected() {
        let mut sender = SenderKey::generate();
        let dist = sender.encode_distribution();
        let mut receiver = SenderKey::decode_distribution(&dist).unwrap();
        let mut skipped = HashMap::new();
        let group_id = b"group-3";

        let mut msg = encrypt_group(&mut sender, b"hi", group_id, b"alice");
        msg.signature[0] ^= 0xff;
        assert!(matches!(
            decrypt_group(&mut receiver, &mut skipped, &msg, group_id),
            Err(TriadError::InvalidSignature)
        ));
    }
}
