//! On-chain X3DH key bundle / one-time prekey registry. A thin service
//! layer over `StateDb`; no bincode/sled details leak past this crate's
//! boundary.

pub mod types;

use alloy_primitives::Address;
use triad_core::{Timestamp, TriadError};
use triad_state::StateDb;

pub use types::{KeyRegistryEvent, OneTimePreKeyEntry, StoredBundle};

fn addr20(addr: Address) -> [u8; 20] {
    addr.into_array()
}

pub struct KeyRegistry<'a> {
    db: &'a StateDb,
}

impl<'a> KeyRegistry<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn publish_bundle(
        &self,
        owner: Address,
        identity_x25519_pub: [u8; 32],
        identity_ed25519_pub: [u8; 32],
        signed_prekey_pub: [u8; 32],
        signature: [u8; 64],
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<KeyRegistryEvent, TriadError> {
        if identity_x25519_pub == [0u8; 32]
            || identity_ed25519_pub == [0u8; 32]
            || signed_prekey_pub == [0u8; 32]
        {
            return Err(TriadError::ZeroAddress);
        }
        if expires_at != 0 && expires_at <= now {
            return Err(TriadError::ExpirationNotInFuture);
        }

        let bundle = StoredBundle {
            owner,
            identity_x25519_pub,
            identity_ed25519_pub,
            signed_prekey_pub,
            signature,
            expires_at,
        };
        self.db.put_key_bundle(&addr20(owner), &bundle)?;
        tracing::info!(%owner, "key bundle published");
        Ok(KeyRegistryEvent::BundlePublished { owner })
    }

    pub fn publish_one_time_prekeys(
        &self,
        owner: Address,
        keys: &[[u8; 32]],
    ) -> Result<KeyRegistryEvent, TriadError> {
        let key = addr20(owner);
        for public in keys {
            self.db.push_one_time_prekey(&key, &OneTimePreKeyEntry { public: *public })?;
        }
        Ok(KeyRegistryEvent::OneTimePreKeysPublished { owner, count: keys.len() })
    }

    /// Pop one one-time prekey for `owner`. Returns an all-zero key rather
    /// than an error when the queue is empty.
    pub fn consume_one_time_prekey(&self, owner: Address) -> Result<[u8; 32], TriadError> {
        let key = addr20(owner);
        let entry: Option<OneTimePreKeyEntry> = self.db.pop_one_time_prekey(&key)?;
        Ok(entry.map(|e| e.public).unwrap_or([0u8; 32]))
    }

    pub fn get_bundle(&self, owner: Address) -> Result<Option<StoredBundle>, TriadError> {
        self.db.get_key_bundle(&addr20(owner))
    }

    pub fn revoke(&self, owner: Address) -> Result<KeyRegistryEvent, TriadError> {
        let key = addr20(owner);
        self.db.delete_key_bundle(&key)?;
        self.db.clear_one_time_prekeys(&key)?;
        Ok(KeyRegistryEvent::Revoked { owner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("triad_keyregistry_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn publish_rejects_zero_keys() {
        let db = temp_db("zero_keys");
        let registry = KeyRegistry::new(&db);
        let err = registry
            .publish_bundle(Address::repeat_byte(1), [0u8; 32], [1u8; 32], [1u8; 32], [0u8; 64], 0, 100)
            .unwrap_err();
        assert!(matches!(err, TriadError::ZeroAddress));
    }

    #[test]
    fn publish_rejects_past_expiry() {
        let db = temp_db("past_expiry");
        let registry = KeyRegistry::new(&db);
        let err = registry
            .publish_bundle(Address::repeat_byte(1), [1u8; 32], [1u8; 32], [1u8; 32], [0u8; 64], 50, 100)
            .unwrap_err();
        assert!(matches!(err, TriadError::ExpirationNotInFuture));
    }

    #[test]
    fn zero_expiry_never_expires() {
        let db = temp_db("zero_expiry");
        let registry = KeyRegistry::new(&db);
        registry
            .publish_bundle(Address::repeat_byte(1), [1u8; 32], [1u8; 32], [1u8; 32], [0u8; 64], 0, 100)
            .unwrap();
        let bundle = registry.get_bundle(Address::repeat_byte(1)).unwrap().unwrap();
        assert_eq!(bundle.expires_at, 0);
    }

    #[test]
    fn one_time_prekeys_consumed_fifo_then_zero() {
        let db = temp_db("otk_consume");
        let registry = KeyRegistry::new(&db);
        let owner = Address::repeat_byte(2);
        registry.publish_one_time_prekeys(owner, &[[1u8; 32], [2u8; 32]]).unwrap();

        assert_eq!(registry.consume_one_time_prekey(owner).unwrap(), [1u8; 32]);
        assert_eq!(registry.consume_one_time_prekey(owner).unwrap(), [2u8; 32]);
        assert_eq!(registry.consume_one_time_prekey(owner).unwrap(), [0u8; 32]);
    }

    #[test]
    fn revoke_clears_bundle_and_prekeys() {
        let db = temp_db("revoke");
        let registry = KeyRegistry::new(&db);
        let owner = Address::repeat_byte(3);
        registry
            .publish_bundle(owner, [1u8; 32], [1u8; 32], [1u8; 32], [0u8; 64], 0, 100)
            .unwrap();
        registry.publish_one_time_prekeys(owner, &[[9u8; 32]]).unwrap();

        registry.revoke(owner).unwrap();
        assert!(registry.get_bundle(owner).unwrap().is_none());
        assert_eq!(registry.consume_one_time_prekey(owner).unwrap(), [0u8; 32]);
    }
}
