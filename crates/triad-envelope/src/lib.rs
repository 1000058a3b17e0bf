//! Stateless envelope validation, invoked as a precompile by on-chain
//! message-posting paths. Never errors on a malformed envelope; callers
//! branch on `valid` instead.

use triad_core::{ENVELOPE_HEADER_LEN, ENVELOPE_VERSION};
use triad_crypto::keccak256_concat;

/// Result of validating a message envelope header+ciphertext pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeOutcome {
    pub valid: bool,
    pub envelope_hash: [u8; 32],
    pub version: u8,
    pub dh_pub: [u8; 32],
    pub pn: u32,
    pub n: u32,
    pub ad_hash: [u8; 32],
}

impl EnvelopeOutcome {
    fn invalid() -> Self {
        Self {
            valid: false,
            envelope_hash: [0u8; 32],
            version: 0,
            dh_pub: [0u8; 32],
            pn: 0,
            n: 0,
            ad_hash: [0u8; 32],
        }
    }
}

/// Validate `header`/`ciphertext` against the 73-byte wire format and the
/// given size bounds. Returns `valid = false` on any rule violation rather
/// than an error, so the caller can branch without unwinding a transaction.
pub fn validate_envelope(
    header: &[u8],
    ciphertext: &[u8],
    max_header_bytes: u32,
    max_ciphertext_bytes: u32,
) -> EnvelopeOutcome {
    if header.len() != ENVELOPE_HEADER_LEN {
        return EnvelopeOutcome::invalid();
    }
    if header.len() as u32 > max_header_bytes {
        return EnvelopeOutcome::invalid();
    }
    if ciphertext.len() as u32 > max_ciphertext_bytes {
        return EnvelopeOutcome::invalid();
    }
    if header[0] != ENVELOPE_VERSION {
        return EnvelopeOutcome::invalid();
    }

    let mut dh_pub = [0u8; 32];
    dh_pub.copy_from_slice(&header[1..33]);
    let pn = u32::from_be_bytes(header[33..37].try_into().unwrap());
    let n = u32::from_be_bytes(header[37..41].try_into().unwrap());
    let mut ad_hash = [0u8; 32];
    ad_hash.copy_from_slice(&header[41..73]);

    let envelope_hash = keccak256_concat(&[header, ciphertext]);

    EnvelopeOutcome {
        valid: true,
        envelope_hash,
        version: header[0],
        dh_pub,
        pn,
        n,
        ad_hash,
    }
}

/// Hash used as the `ad` field in a session's envelope headers:
/// `keccak256("session_id|rider_hex|driver_hex|chain_id")`.
pub fn session_ad_hash(session_id: u64, rider_hex: &str, driver_hex: &str, chain_id: u64) -> [u8; 32] {
    let material = format!("{session_id}|{rider_hex}|{driver_hex}|{chain_id}");
    triad_crypto::keccak256(material.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(version: u8, pn: u32, n: u32, ad: [u8; 32]) -> Vec<u8> {
        let mut h = vec![0u8; ENVELOPE_HEADER_LEN];
        h[0] = version;
        h[1..33].copy_from_slice(&[7u8; 32]);
        h[33..37].copy_from_slice(&pn.to_be_bytes());
        h[37..41].copy_from_slice(&n.to_be_bytes());
        h[41..73].copy_from_slice(&ad);
        h
    }

    #[test]
    fn valid_envelope_round_trips_fields() {
        let ad = [9u8; 32];
        let header = sample_header(1, 3, 5, ad);
        let ciphertext = b"ciphertext-and-tag".to_vec();
        let outcome = validate_envelope(&header, &ciphertext, 256, 512);
        assert!(outcome.valid);
        assert_eq!(outcome.pn, 3);
        assert_eq!(outcome.n, 5);
        assert_eq!(outcome.ad_hash, ad);
        assert_eq!(outcome.dh_pub, [7u8; 32]);
    }

    #[test]
    fn wrong_version_is_invalid_not_an_error() {
        let header = sample_header(2, 0, 0, [0u8; 32]);
        let outcome = validate_envelope(&header, b"x", 256, 512);
        assert!(!outcome.valid);
    }

    #[test]
    fn oversized_ciphertext_is_invalid() {
        let header = sample_header(1, 0, 0, [0u8; 32]);
        let ciphertext = vec![0u8; 600];
        let outcome = validate_envelope(&header, &ciphertext, 256, 512);
        assert!(!outcome.valid);
    }

    #[test]
    fn idempotent_validation() {
        let header = sample_header(1, 1, 2, [3u8; 32]);
        let ciphertext = b"payload".to_vec();
        let first = validate_envelope(&header, &ciphertext, 256, 512);
        let second = validate_envelope(&header, &ciphertext, 256, 512);
        assert_eq!(first, second);
    }
}
