//! X3DH initial key agreement.

use crate::types::{IdentityKey, KeyBundle, OneTimePreKey, SignedPreKey};
use triad_core::TriadError;
use triad_crypto::{hkdf_sha256, x25519_dh, xeddsa_verify};
use x25519_dalek::{PublicKey, StaticSecret};

/// The 32-byte shared secret produced by X3DH, ready to seed a Double
/// Ratchet session via `RatchetState::initialize_as_initiator/responder`.
pub struct X3dhResult {
    pub shared_secret: [u8; 32],
}

fn derive_sk(dh_parts: &[[u8; 32]]) -> [u8; 32] {
    let mut ikm = Vec::with_capacity(32 * dh_parts.len());
    for part in dh_parts {
        ikm.extend_from_slice(part);
    }
    let okm = hkdf_sha256(&ikm, &[], b"X3DH", 32);
    let mut sk = [0u8; 32];
    sk.copy_from_slice(&okm);
    sk
}

/// Initiator side: holds identity `IK_A` and a fresh ephemeral `EK_A`;
/// consumes the responder's published bundle.
pub fn x3dh_initiate(
    identity: &IdentityKey,
    ephemeral_secret: &[u8; 32],
    bundle: &KeyBundle,
) -> Result<X3dhResult, TriadError> {
    if !xeddsa_verify(
        &bundle.identity_ed25519_pub,
        &bundle.signed_prekey_pub,
        &bundle.signature,
    ) {
        return Err(TriadError::BadBundle);
    }

    let ik_a = identity.static_secret();
    let ek_a = StaticSecret::from(*ephemeral_secret);
    let ik_b = PublicKey::from(bundle.identity_x25519_pub);
    let spk_b = PublicKey::from(bundle.signed_prekey_pub);

    let dh1 = x25519_dh(&ik_a, &spk_b);
    let dh2 = x25519_dh(&ek_a, &ik_b);
    let dh3 = x25519_dh(&ek_a, &spk_b);

    let shared_secret = if let Some(opk_pub) = bundle.one_time_prekey_pub {
        let opk_b = PublicKey::from(opk_pub);
        let dh4 = x25519_dh(&ek_a, &opk_b);
        derive_sk(&[dh1, dh2, dh3, dh4])
    } else {
        derive_sk(&[dh1, dh2, dh3])
    };

    Ok(X3dhResult { shared_secret })
}

/// Responder side: mirrors the initiator's DH computations using the
/// responder's own identity/signed-prekey/one-time-prekey secrets and the
/// initiator's published identity + ephemeral public keys.
pub fn x3dh_respond(
    identity: &IdentityKey,
    signed_prekey: &SignedPreKey,
    one_time_prekey: Option<&OneTimePreKey>,
    remote_identity_pub: [u8; 32],
    remote_ephemeral_pub: [u8; 32],
) -> X3dhResult {
    let ik_b = identity.static_secret();
    let spk_b = signed_prekey.static_secret();
    let ik_a = PublicKey::from(remote_identity_pub);
    let ek_a = PublicKey::from(remote_ephemeral_pub);

    let dh1 = x25519_dh(&spk_b, &ik_a);
    let dh2 = x25519_dh(&ik_b, &ek_a);
    let dh3 = x25519_dh(&spk_b, &ek_a);

    let shared_secret = if let Some(otk) = one_time_prekey {
        let dh4 = x25519_dh(&otk.static_secret(), &ek_a);
        derive_sk(&[dh1, dh2, dh3, dh4])
    } else {
        derive_sk(&[dh1, dh2, dh3])
    };

    X3dhResult { shared_secret }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x3dh_round_trip_with_one_time_prekey() {
        let alice = IdentityKey::generate();
        let bob = IdentityKey::generate();
        let bob_spk = SignedPreKey::generate(&bob, &[5u8; 64]);
        let bob_otk = OneTimePreKey::generate();

        let bundle = KeyBundle {
            identity_x25519_pub: bob.x25519_public,
            identity_ed25519_pub: bob.ed25519_public,
            signed_prekey_pub: bob_spk.public,
            signature: bob_spk.signature,
            one_time_prekey_pub: Some(bob_otk.public),
        };

        let ek_a_secret = [11u8; 32];
        let ek_a_public = x25519_dalek::PublicKey::from(&x25519_dalek::StaticSecret::from(ek_a_secret));

        let initiator = x3dh_initiate(&alice, &ek_a_secret, &bundle).unwrap();
        let responder = x3dh_respond(
            &bob,
            &bob_spk,
            Some(&bob_otk),
            alice.x25519_public,
            ek_a_public.to_bytes(),
        );

        assert_eq!(initiator.shared_secret, responder.shared_secret);
    }

    #[test]
    fn x3dh_round_trip_without_one_time_prekey() {
        let alice = IdentityKey::generate();
        let bob = IdentityKey::generate();
        let bob_spk = SignedPreKey::generate(&bob, &[6u8; 64]);

        let bundle = KeyBundle {
            identity_x25519_pub: bob.x25519_public,
            identity_ed25519_pub: bob.ed25519_public,
            signed_prekey_pub: bob_spk.public,
            signature: bob_spk.signature,
            one_time_prekey_pub: None,
        };

        let ek_a_secret = [22u8; 32];
        let ek_a_public = x25519_dalek::PublicKey::from(&x25519_dalek::StaticSecret::from(ek_a_secret));

        let initiator = x3dh_initiate(&alice, &ek_a_secret, &bundle).unwrap();
        let responder = x3dh_respond(&bob, &bob_spk, None, alice.x25519_public, ek_a_public.to_bytes());

        assert_eq!(initiator.shared_secret, responder.shared_secret);
    }

    #[test]
    fn x3dh_rejects_bad_bundle_signature() {
        let alice = IdentityKey::generate();
        let bob = IdentityKey::generate();
        let mut bundle = KeyBundle {
            identity_x25519_pub: bob.x25519_public,
            identity_ed25519_pub: bob.ed25519_public,
            signed_prekey_pub: [1u8; 32],
            signature: [0u8; 64],
            one_time_prekey_pub: None,
        };
        bundle.signature[0] ^= 0xff;
        let ek_a_secret = [33u8; 32];
        assert!(x3dh_initiate(&alice, &ek_a_secret, &bundle).is_err());
    }
}
