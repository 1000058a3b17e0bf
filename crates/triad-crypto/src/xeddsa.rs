//! XEdDSA: EdDSA-style signatures over an X25519 (Montgomery) private key,
//! letting a single identity key serve both Diffie-Hellman and signing.

use crate::hash::sha512;
use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::edwards::CompressedEdwardsY;
use curve25519_dalek::scalar::Scalar;

/// An XEdDSA signing key: the X25519 private scalar, clamped and
/// sign-bit-normalized per `calculate_key_pair`.
pub struct XEdDSAKeyPair {
    scalar: Scalar,
    /// Edwards-form public key with bit 255 (the sign bit) forced to 0.
    pub public: [u8; 32],
}

impl Drop for XEdDSAKeyPair {
    fn drop(&mut self) {
        self.scalar = Scalar::ZERO;
    }
}

fn clamp(mut k: [u8; 32]) -> [u8; 32] {
    k[0] &= 248;
    k[31] &= 127;
    k[31] |= 64;
    k
}

/// Derive the Edwards-form signing keypair from a raw X25519 private scalar.
pub fn calculate_key_pair(x25519_sk: &[u8; 32]) -> XEdDSAKeyPair {
    let clamped = clamp(*x25519_sk);
    let mut scalar = Scalar::from_bytes_mod_order(clamped);
    let mut a_bytes = (&ED25519_BASEPOINT_TABLE * &scalar).compress().to_bytes();

    if a_bytes[31] & 0x80 != 0 {
        scalar = -scalar;
        a_bytes = (&ED25519_BASEPOINT_TABLE * &scalar).compress().to_bytes();
    }
    a_bytes[31] &= 0x7f;

    XEdDSAKeyPair {
        scalar,
        public: a_bytes,
    }
}

/// XEdDSA sign: `R ‖ s`, 64 bytes. `z` is 64 bytes of fresh randomness
/// mixed into the nonce derivation.
pub fn xeddsa_sign(kp: &XEdDSAKeyPair, msg: &[u8], z: &[u8; 64]) -> [u8; 64] {
    let k_bytes = kp.scalar.to_bytes();
    let mut nonce_input = Vec::with_capacity(32 + msg.len() + 64);
    nonce_input.extend_from_slice(&k_bytes);
    nonce_input.extend_from_slice(msg);
    nonce_input.extend_from_slice(z);
    let r = Scalar::from_bytes_mod_order_wide(&sha512(&nonce_input));

    let r_bytes = (&ED25519_BASEPOINT_TABLE * &r).compress().to_bytes();

    let mut h_input = Vec::with_capacity(32 + 32 + msg.len());
    h_input.extend_from_slice(&r_bytes);
    h_input.extend_from_slice(&kp.public);
    h_input.extend_from_slice(msg);
    let h = Scalar::from_bytes_mod_order_wide(&sha512(&h_input));

    let s = r + h * kp.scalar;

    let mut sig = [0u8; 64];
    sig[..32].copy_from_slice(&r_bytes);
    sig[32..].copy_from_slice(&s.to_bytes());
    sig
}

/// XEdDSA verify against an Edwards-form public key (sign bit must be 0).
pub fn xeddsa_verify(public: &[u8; 32], msg: &[u8], sig: &[u8; 64]) -> bool {
    if public[31] & 0x80 != 0 || sig.len() != 64 {
        return false;
    }
    let a_point = match CompressedEdwardsY(*public).decompress() {
        Some(p) => p,
        None => return false,
    };
    let r_bytes: [u8; 32] = match sig[..32].try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let s_bytes: [u8; 32] = match sig[32..].try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let s = match Scalar::from_canonical_bytes(s_bytes).into_option() {
        Some(s) => s,
        None => return false,
    };
    let r_point = match CompressedEdwardsY(r_bytes).decompress() {
        Some(p) => p,
        None => return false,
    };

    let mut h_input = Vec::with_capacity(32 + 32 + msg.len());
    h_input.extend_from_slice(&r_bytes);
    h_input.extend_from_slice(public);
    h_input.extend_from_slice(msg);
    let h = Scalar::from_bytes_mod_order_wide(&sha512(&h_input));

    let lhs = &ED25519_BASEPOINT_TABLE * &s;
    let rhs = r_point + a_point * h;
    lhs == rhs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let sk = [7u8; 32];
        let kp = calculate_key_pair(&sk);
        let msg = b"hello xeddsa";
        let z = [9u8; 64];
        let sig = xeddsa_sign(&kp, msg, &z);
        assert!(xeddsa_verify(&kp.public, msg, &sig));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let sk = [3u8; 32];
        let kp = calculate_key_pair(&sk);
        let sig = xeddsa_sign(&kp, b"original", &[1u8; 64]);
        assert!(!xeddsa_verify(&kp.public, b"tampered", &sig));
    }

    #[test]
    fn public_key_sign_bit_always_clear() {
        for seed in 0u8..32 {
            let sk = [seed; 32];
            let kp = calculate_key_pair(&sk);
            assert_eq!(kp.public[31] & 0x80, 0);
        }
    }
}
