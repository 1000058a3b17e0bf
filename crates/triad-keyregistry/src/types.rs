use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use triad_core::Timestamp;

/// A published X3DH key bundle, as stored on-chain. `expires_at == 0` means
/// the bundle never expires.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredBundle {
    pub owner: Address,
    pub identity_x25519_pub: [u8; 32],
    pub identity_ed25519_pub: [u8; 32],
    pub signed_prekey_pub: [u8; 32],
    pub signature: [u8; 64],
    pub expires_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OneTimePreKeyEntry {
    pub public: [u8; 32],
}

#[derive(Clone, Debug)]
pub enum KeyRegistryEvent {
    BundlePublished { owner: Address },
    OneTimePreKeysPublished { owner: Address, count: usize },
    Revoked { owner: Address },
}
