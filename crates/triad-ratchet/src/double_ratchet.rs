//! Double Ratchet session. Per-message key derivation with
//! forward/backward secrecy and tolerance for out-of-order delivery, up to
//! `MAX_SKIP` unseen messages.

use crate::types::RatchetState;
use std::collections::HashMap;
use triad_core::{TriadError, ENVELOPE_HEADER_LEN, ENVELOPE_VERSION, MAX_SKIP};
use triad_crypto::{
    chacha20_poly1305_open, chacha20_poly1305_seal, hkdf_sha256, hmac_sha256, ratchet_nonce,
    x25519_dh, x25519_keygen,
};
use x25519_dalek::{PublicKey, StaticSecret};

/// Parsed form of the 73-byte wire header:
/// `version(1) ‖ dh_pub(32) ‖ pn(4 BE) ‖ n(4 BE) ‖ ad(32)`.
pub struct Header {
    pub version: u8,
    pub dh_pub: [u8; 32],
    pub pn: u32,
    pub n: u32,
    pub ad: [u8; 32],
}

impl Header {
    pub fn encode(&self) -> [u8; ENVELOPE_HEADER_LEN] {
        let mut out = [0u8; ENVELOPE_HEADER_LEN];
        out[0] = self.version;
        out[1..33].copy_from_slice(&self.dh_pub);
        out[33..37].copy_from_slice(&self.pn.to_be_bytes());
        out[37..41].copy_from_slice(&self.n.to_be_bytes());
        out[41..73].copy_from_slice(&self.ad);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TriadError> {
        if bytes.len() != ENVELOPE_HEADER_LEN {
            return Err(TriadError::InvalidHeaderLength { got: bytes.len() });
        }
        let version = bytes[0];
        if version != ENVELOPE_VERSION {
            return Err(TriadError::UnsupportedEnvelopeVersion(version));
        }
        let mut dh_pub = [0u8; 32];
        dh_pub.copy_from_slice(&bytes[1..33]);
        let pn = u32::from_be_bytes(bytes[33..37].try_into().unwrap());
        let n = u32::from_be_bytes(bytes[37..41].try_into().unwrap());
        let mut ad = [0u8; 32];
        ad.copy_from_slice(&bytes[41..73]);
        Ok(Self {
            version,
            dh_pub,
            pn,
            n,
            ad,
        })
    }
}

fn kdf_rk(rk: &[u8; 32], dh_out: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let okm = hkdf_sha256(dh_out, rk, b"DR_RK", 64);
    let mut new_rk = [0u8; 32];
    new_rk.copy_from_slice(&okm[..32]);
    let mut ck = [0u8; 32];
    ck.copy_from_slice(&okm[32..]);
    (new_rk, ck)
}

fn kdf_ck(ck: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let mk = hmac_sha256(ck, b"DR_CK");
    let next = hmac_sha256(ck, &[0x01]);
    (mk, next)
}

impl RatchetState {
    /// Initialize as the X3DH initiator: generate a fresh ratchet keypair
    /// and perform the first DH ratchet step immediately, so `send_chain_key`
    /// is populated and `recv_chain_key` starts empty.
    pub fn initialize_as_initiator(sk: [u8; 32], remote_dh_pub: [u8; 32]) -> Self {
        let (dh_sk, dh_pk) = x25519_keygen();
        let dh_out = x25519_dh(&dh_sk, &PublicKey::from(remote_dh_pub));
        let (root_key, send_chain_key) = kdf_rk(&sk, &dh_out);
        Self {
            root_key,
            send_chain_key: Some(send_chain_key),
            recv_chain_key: None,
            dh_secret: dh_sk.to_bytes(),
            dh_public: dh_pk.to_bytes(),
            remote_dh_pub: Some(remote_dh_pub),
            prev_sent_count: 0,
            sent_count: 0,
            recv_count: 0,
            skipped_message_keys: HashMap::new(),
        }
    }

    /// Initialize as the X3DH responder: mirror of the initiator's first
    /// ratchet step, using the responder's own (already-published) ratchet
    /// keypair and the initiator's known ratchet public key.
    pub fn initialize_as_responder(
        sk: [u8; 32],
        local_dh_secret: [u8; 32],
        local_dh_public: [u8; 32],
        remote_dh_pub: [u8; 32],
    ) -> Self {
        let dh_sk = StaticSecret::from(local_dh_secret);
        let dh_out = x25519_dh(&dh_sk, &PublicKey::from(remote_dh_pub));
        let (root_key, recv_chain_key) = kdf_rk(&sk, &dh_out);
        Self {
            root_key,
            send_chain_key: None,
            recv_chain_key: Some(recv_chain_key),
            dh_secret: local_dh_secret,
            dh_public: local_dh_public,
            remote_dh_pub: Some(remote_dh_pub),
            prev_sent_count: 0,
            sent_count: 0,
            recv_count: 0,
            skipped_message_keys: HashMap::new(),
        }
    }

    fn ratchet_step(&mut self, dh_pub: [u8; 32]) {
        let dh_sk = StaticSecret::from(self.dh_secret);
        let dh_out_recv = x25519_dh(&dh_sk, &PublicKey::from(dh_pub));
        let (rk1, recv_ck) = kdf_rk(&self.root_key, &dh_out_recv);
        self.root_key = rk1;
        self.recv_chain_key = Some(recv_ck);

        let (new_sk, new_pk) = x25519_keygen();
        let dh_out_send = x25519_dh(&new_sk, &PublicKey::from(dh_pub));
        let (rk2, send_ck) = kdf_rk(&self.root_key, &dh_out_send);
        self.root_key = rk2;
        self.send_chain_key = Some(send_ck);
        self.dh_secret = new_sk.to_bytes();
        self.dh_public = new_pk.to_bytes();
        self.remote_dh_pub = Some(dh_pub);
        self.prev_sent_count = self.sent_count;
        self.sent_count = 0;
        self.recv_count = 0;
    }

    /// Advance the current recv chain up to (but not including) message
    /// index `target`, caching each skipped key under `(remote_dh_pub, i)`.
    fn skip_recv_chain(&mut self, target: u32) -> Result<(), TriadError> {
        let mut ck = match self.recv_chain_key.take() {
            Some(ck) => ck,
            None => return Ok(()),
        };
        let remote = self.remote_dh_pub.unwrap_or([0u8; 32]);
        while self.recv_count < target {
            if self.skipped_message_keys.len() >= MAX_SKIP {
                return Err(TriadError::TooManySkipped { max: MAX_SKIP });
            }
            let (mk, next_ck) = kdf_ck(&ck);
            self.skipped_message_keys.insert((remote, self.recv_count), mk);
            ck = next_ck;
            self.recv_count += 1;
        }
        self.recv_chain_key = Some(ck);
        Ok(())
    }

    /// Encrypt `plaintext`, returning the 73-byte header and ciphertext+tag.
    pub fn encrypt(&mut self, plaintext: &[u8], ad: [u8; 32]) -> ([u8; ENVELOPE_HEADER_LEN], Vec<u8>) {
        if self.send_chain_key.is_none() {
            let remote = self
                .remote_dh_pub
                .expect("a session always has a remote dh public key once initialized");
            self.ratchet_step(remote);
        }
        let ck = self.send_chain_key.take().expect("checked above");
        let (mk, next_ck) = kdf_ck(&ck);
        self.send_chain_key = Some(next_ck);
        let n = self.sent_count;
        self.sent_count += 1;

        let header = Header {
            version: ENVELOPE_VERSION,
            dh_pub: self.dh_public,
            pn: self.prev_sent_count,
            n,
            ad,
        };
        let nonce = ratchet_nonce(n);
        let ciphertext = chacha20_poly1305_seal(&mk, &nonce, &ad, plaintext);
        (header.encode(), ciphertext)
    }

    /// Decrypt a header+ciphertext pair produced by `encrypt`.
    pub fn decrypt(&mut self, header_bytes: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, TriadError> {
        let header = Header::decode(header_bytes)?;

        if let Some(mk) = self.skipped_message_keys.remove(&(header.dh_pub, header.n)) {
            let nonce = ratchet_nonce(header.n);
            return chacha20_poly1305_open(&mk, &nonce, &header.ad, ciphertext);
        }

        if self.remote_dh_pub != Some(header.dh_pub) {
            self.skip_recv_chain(header.pn)?;
            self.ratchet_step(header.dh_pub);
        }

        self.skip_recv_chain(header.n)?;

        let ck = self
            .recv_chain_key
            .take()
            .expect("ratchet_step/initialize always populate recv_chain_key before this point");
        let (mk, next_ck) = kdf_ck(&ck);
        self.recv_chain_key = Some(next_ck);
        self.recv_count += 1;

        let nonce = ratchet_nonce(header.n);
        chacha20_poly1305_open(&mk, &nonce, &header.ad, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_pair() -> (RatchetState, RatchetState) {
        let sk = [4u8; 32];
        let bob_secret = [8u8; 32];
        let bob_public = PublicKey::from(&StaticSecret::from(bob_secret)).to_bytes();

        let alice = RatchetState::initialize_as_initiator(sk, bob_public);
        let bob = RatchetState::initialize_as_responder(sk, bob_secret, bob_public, alice.dh_public);
        (alice, bob)
    }

    #[test]
    fn in_order_round_trip() {
        let (mut alice, mut bob) = session_pair();
        let ad = [1u8; 32];
        let (h1, c1) = alice.encrypt(b"hello", ad);
        let p1 = bob.decrypt(&h1, &c1).unwrap();
        assert_eq!(p1, b"hello");

        let (h2, c2) = bob.encrypt(b"hi back", ad);
        let p2 = alice.decrypt(&h2, &c2).unwrap();
        assert_eq!(p2, b"hi back");
    }

    #[test]
    fn out_of_order_round_trip_s5() {
        let (mut alice, mut bob) = session_pair();
        let ad = [2u8; 32];
        let (h1, c1) = alice.encrypt(b"m1", ad);
        let (h2, c2) = alice.encrypt(b"m2", ad);
        let (h3, c3) = alice.encrypt(b"m3", ad);

        let p3 = bob.decrypt(&h3, &c3).unwrap();
        assert_eq!(p3, b"m3");
        let p2 = bob.decrypt(&h2, &c2).unwrap();
        assert_eq!(p2, b"m2");
        let p1 = bob.decrypt(&h1, &c1).unwrap();
        assert_eq!(p1, b"m1");
        assert!(bob.skipped_message_keys.is_empty());
    }

    #[test]
    fn too_many_skipped_is_fatal() {
        let (mut alice, mut bob) = session_pair();
        let ad = [3u8; 32];
        for _ in 0..=MAX_SKIP {
            alice.encrypt(b"x", ad);
        }
        let (h_last, c_last) = alice.encrypt(b"final", ad);
        assert!(matches!(
            bob.decrypt(&h_last, &c_last),
            Err(TriadError::TooManySkipped { .. })
        ));
    }

    #[test]
    fn tampered_ciphertext_is_undecryptable() {
        let (mut alice, mut bob) = session_pair();
        let ad = [5u8; 32];
        let (h1, mut c1) = alice.encrypt(b"hello", ad);
        c1[0] ^= 0xff;
        assert!(matches!(bob.decrypt(&h1, &c1), Err(TriadError::Undecryptable)));
    }
}
