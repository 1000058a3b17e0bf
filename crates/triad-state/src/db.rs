use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use triad_core::TriadError;

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees, one per on-chain data-layout prefix:
///   sponsorship        — id(32)                      → bincode(T)
///   sponsorship_index  — beneficiary(20)              → bincode(T)  [list of ids]
///   sponsorship_usage  — id(32) ‖ day_epoch(8 BE)     → bincode(T)
///   request            — request_id(8 BE)             → bincode(T)
///   session            — session_id(8 BE)              → bincode(T)
///   pending_request    — request_id(8 BE)              → bincode(T)  [membership index]
///   driver_commit      — request_id(8 BE) ‖ driver(20) → bincode(T)
///   message            — session_id(8 BE) ‖ sender(20) ‖ msg_index(8 BE) → bincode(T)
///   message_index      — session_id(8 BE) ‖ sender(20) → last msg_index (8 BE)
///   key_bundle         — owner(20)                     → bincode(T)
///   one_time_prekey    — owner(20) ‖ seq(8 BE)         → bincode(T)  [FIFO queue]
///   rate_limit         — subject key                    → bincode(T)
///   meta               — utf8 key                       → raw bytes (counters, etc.)
pub struct StateDb {
    _db: sled::Db,
    sponsorship: sled::Tree,
    sponsorship_index: sled::Tree,
    sponsorship_usage: sled::Tree,
    request: sled::Tree,
    session: sled::Tree,
    pending_request: sled::Tree,
    driver_commit: sled::Tree,
    message: sled::Tree,
    message_index: sled::Tree,
    key_bundle: sled::Tree,
    one_time_prekey: sled::Tree,
    rate_limit: sled::Tree,
    meta: sled::Tree,
}

fn storage_err(e: impl std::fmt::Display) -> TriadError {
    TriadError::Storage(e.to_string())
}

fn ser_err(e: impl std::fmt::Display) -> TriadError {
    TriadError::Serialization(e.to_string())
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TriadError> {
        let db = sled::open(path).map_err(storage_err)?;
        Ok(Self {
            sponsorship: db.open_tree("sponsorship").map_err(storage_err)?,
            sponsorship_index: db.open_tree("sponsorship_index").map_err(storage_err)?,
            sponsorship_usage: db.open_tree("sponsorship_usage").map_err(storage_err)?,
            request: db.open_tree("request").map_err(storage_err)?,
            session: db.open_tree("session").map_err(storage_err)?,
            pending_request: db.open_tree("pending_request").map_err(storage_err)?,
            driver_commit: db.open_tree("driver_commit").map_err(storage_err)?,
            message: db.open_tree("message").map_err(storage_err)?,
            message_index: db.open_tree("message_index").map_err(storage_err)?,
            key_bundle: db.open_tree("key_bundle").map_err(storage_err)?,
            one_time_prekey: db.open_tree("one_time_prekey").map_err(storage_err)?,
            rate_limit: db.open_tree("rate_limit").map_err(storage_err)?,
            meta: db.open_tree("meta").map_err(storage_err)?,
            _db: db,
        })
    }

    // ── Generic typed accessors ─────────────────────────────────────────────

    fn get<T: DeserializeOwned>(tree: &sled::Tree, key: &[u8]) -> Result<Option<T>, TriadError> {
        match tree.get(key).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(tree: &sled::Tree, key: &[u8], value: &T) -> Result<(), TriadError> {
        let bytes = bincode::serialize(value).map_err(ser_err)?;
        tree.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }

    fn iter_prefix<T: DeserializeOwned>(tree: &sled::Tree, prefix: &[u8]) -> Result<Vec<T>, TriadError> {
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(ser_err)?);
        }
        Ok(out)
    }

    // ── Sponsorships ─────────────────────────────────────────────────────────

    pub fn get_sponsorship<T: DeserializeOwned>(&self, id: &[u8; 32]) -> Result<Option<T>, TriadError> {
        Self::get(&self.sponsorship, id)
    }

    pub fn put_sponsorship<T: Serialize>(&self, id: &[u8; 32], value: &T) -> Result<(), TriadError> {
        Self::put(&self.sponsorship, id, value)
    }

    pub fn get_sponsorship_index<T: DeserializeOwned>(&self, beneficiary: &[u8; 20]) -> Result<Option<T>, TriadError> {
        Self::get(&self.sponsorship_index, beneficiary)
    }

    pub fn put_sponsorship_index<T: Serialize>(&self, beneficiary: &[u8; 20], value: &T) -> Result<(), TriadError> {
        Self::put(&self.sponsorship_index, beneficiary, value)
    }

    pub fn get_daily_usage<T: DeserializeOwned>(&self, id: &[u8; 32], day_epoch: i64) -> Result<Option<T>, TriadError> {
        Self::get(&self.sponsorship_usage, &daily_usage_key(id, day_epoch))
    }

    pub fn put_daily_usage<T: Serialize>(&self, id: &[u8; 32], day_epoch: i64, value: &T) -> Result<(), TriadError> {
        Self::put(&self.sponsorship_usage, &daily_usage_key(id, day_epoch), value)
    }

    // ── RideHail: requests/sessions/commits ─────────────────────────────────

    pub fn get_request<T: DeserializeOwned>(&self, id: u64) -> Result<Option<T>, TriadError> {
        Self::get(&self.request, &id.to_be_bytes())
    }

    pub fn put_request<T: Serialize>(&self, id: u64, value: &T) -> Result<(), TriadError> {
        Self::put(&self.request, &id.to_be_bytes(), value)
    }

    pub fn get_session<T: DeserializeOwned>(&self, id: u64) -> Result<Option<T>, TriadError> {
        Self::get(&self.session, &id.to_be_bytes())
    }

    pub fn put_session<T: Serialize>(&self, id: u64, value: &T) -> Result<(), TriadError> {
        Self::put(&self.session, &id.to_be_bytes(), value)
    }

    /// Mark `id` pending (added to the matching loop's working set).
    pub fn put_pending_request<T: Serialize>(&self, id: u64, value: &T) -> Result<(), TriadError> {
        Self::put(&self.pending_request, &id.to_be_bytes(), value)
    }

    pub fn remove_pending_request(&self, id: u64) -> Result<(), TriadError> {
        self.pending_request.remove(id.to_be_bytes()).map_err(storage_err)?;
        Ok(())
    }

    /// Iterate pending requests in ascending big-endian id order, the order
    /// the matching loop must process them in for deterministic outcomes.
    pub fn iter_pending_requests<T: DeserializeOwned>(&self) -> Result<Vec<(u64, T)>, TriadError> {
        let mut out = Vec::new();
        for item in self.pending_request.iter() {
            let (key, bytes) = item.map_err(storage_err)?;
            let mut id_bytes = [0u8; 8];
            id_bytes.copy_from_slice(&key);
            let id = u64::from_be_bytes(id_bytes);
            let value = bincode::deserialize(&bytes).map_err(ser_err)?;
            out.push((id, value));
        }
        Ok(out)
    }

    pub fn put_driver_commit<T: Serialize>(&self, request_id: u64, driver: &[u8; 20], value: &T) -> Result<(), TriadError> {
        Self::put(&self.driver_commit, &driver_commit_key(request_id, driver), value)
    }

    pub fn get_driver_commit<T: DeserializeOwned>(&self, request_id: u64, driver: &[u8; 20]) -> Result<Option<T>, TriadError> {
        Self::get(&self.driver_commit, &driver_commit_key(request_id, driver))
    }

    /// All commits submitted for `request_id`, in driver-address order.
    pub fn iter_commits_for_request<T: DeserializeOwned>(&self, request_id: u64) -> Result<Vec<T>, TriadError> {
        Self::iter_prefix(&self.driver_commit, &request_id.to_be_bytes())
    }

    pub fn remove_driver_commit(&self, request_id: u64, driver: &[u8; 20]) -> Result<(), TriadError> {
        self.driver_commit
            .remove(driver_commit_key(request_id, driver))
            .map_err(storage_err)?;
        Ok(())
    }

    /// Remove every commit filed under `request_id`, e.g. on request expiry.
    pub fn remove_commits_for_request(&self, request_id: u64) -> Result<(), TriadError> {
        let keys: Vec<_> = self
            .driver_commit
            .scan_prefix(request_id.to_be_bytes())
            .keys()
            .collect::<Result<_, _>>()
            .map_err(storage_err)?;
        for key in keys {
            self.driver_commit.remove(key).map_err(storage_err)?;
        }
        Ok(())
    }

    pub fn put_message<T: Serialize>(
        &self,
        session_id: u64,
        sender: &[u8; 20],
        msg_index: u64,
        value: &T,
    ) -> Result<(), TriadError> {
        Self::put(&self.message, &message_key(session_id, sender, msg_index), value)
    }

    pub fn get_last_message_index(
        &self,
        session_id: u64,
        sender: &[u8; 20],
    ) -> Result<Option<u64>, TriadError> {
        let key = message_index_key(session_id, sender);
        match self.message_index.get(key).map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_last_message_index(
        &self,
        session_id: u64,
        sender: &[u8; 20],
        msg_index: u64,
    ) -> Result<(), TriadError> {
        let key = message_index_key(session_id, sender);
        self.message_index
            .insert(key, &msg_index.to_be_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Key registry ─────────────────────────────────────────────────────────

    pub fn get_key_bundle<T: DeserializeOwned>(&self, owner: &[u8; 20]) -> Result<Option<T>, TriadError> {
        Self::get(&self.key_bundle, owner)
    }

    pub fn put_key_bundle<T: Serialize>(&self, owner: &[u8; 20], value: &T) -> Result<(), TriadError> {
        Self::put(&self.key_bundle, owner, value)
    }

    pub fn delete_key_bundle(&self, owner: &[u8; 20]) -> Result<(), TriadError> {
        self.key_bundle.remove(owner).map_err(storage_err)?;
        Ok(())
    }

    /// Append a one-time prekey to `owner`'s queue.
    pub fn push_one_time_prekey<T: Serialize>(&self, owner: &[u8; 20], value: &T) -> Result<(), TriadError> {
        let seq = self.next_counter(&format!("otk_seq/{}", hex::encode(owner)))?;
        Self::put(&self.one_time_prekey, &one_time_prekey_key(owner, seq), value)
    }

    /// Pop the oldest one-time prekey for `owner`, if any.
    pub fn pop_one_time_prekey<T: DeserializeOwned>(&self, owner: &[u8; 20]) -> Result<Option<T>, TriadError> {
        let mut iter = self.one_time_prekey.scan_prefix(owner);
        match iter.next() {
            Some(item) => {
                let (key, bytes) = item.map_err(storage_err)?;
                self.one_time_prekey.remove(key).map_err(storage_err)?;
                Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?))
            }
            None => Ok(None),
        }
    }

    pub fn clear_one_time_prekeys(&self, owner: &[u8; 20]) -> Result<(), TriadError> {
        let keys: Vec<_> = self
            .one_time_prekey
            .scan_prefix(owner)
            .keys()
            .collect::<Result<_, _>>()
            .map_err(storage_err)?;
        for key in keys {
            self.one_time_prekey.remove(key).map_err(storage_err)?;
        }
        Ok(())
    }

    // ── Rate limiting ────────────────────────────────────────────────────────

    pub fn get_rate_limit<T: DeserializeOwned>(&self, subject: &[u8]) -> Result<Option<T>, TriadError> {
        Self::get(&self.rate_limit, subject)
    }

    pub fn put_rate_limit<T: Serialize>(&self, subject: &[u8], value: &T) -> Result<(), TriadError> {
        Self::put(&self.rate_limit, subject, value)
    }

    // ── Meta / counters ──────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), TriadError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, TriadError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage_err)
    }

    /// Allocate the next value of a named counter, starting at 0.
    pub fn next_counter(&self, name: &str) -> Result<u64, TriadError> {
        let current = self.peek_counter(name)?;
        self.put_meta(name, &(current + 1).to_be_bytes())?;
        Ok(current)
    }

    /// Read a named counter's next value without allocating it.
    pub fn peek_counter(&self, name: &str) -> Result<u64, TriadError> {
        Ok(self
            .get_meta(name)?
            .map(|b| {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b[..8]);
                u64::from_be_bytes(arr)
            })
            .unwrap_or(0))
    }

}

fn daily_usage_key(id: &[u8; 32], day_epoch: i64) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..32].copy_from_slice(id);
    key[32..].copy_from_slice(&day_epoch.to_be_bytes());
    key
}

fn driver_commit_key(request_id: u64, driver: &[u8; 20]) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..8].copy_from_slice(&request_id.to_be_bytes());
    key[8..].copy_from_slice(driver);
    key
}

fn one_time_prekey_key(owner: &[u8; 20], seq: u64) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..20].copy_from_slice(owner);
    key[20..].copy_from_slice(&seq.to_be_bytes());
    key
}

fn message_key(session_id: u64, sender: &[u8; 20], msg_index: u64) -> [u8; 36] {
    let mut key = [0u8; 36];
    key[..8].copy_from_slice(&session_id.to_be_bytes());
    key[8..28].copy_from_slice(sender);
    key[28..].copy_from_slice(&msg_index.to_be_bytes());
    key
}

fn message_index_key(session_id: u64, sender: &[u8; 20]) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..8].copy_from_slice(&session_id.to_be_bytes());
    key[8..].copy_from_slice(sender);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Dummy {
        n: u32,
    }

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("triad_state_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn pending_requests_iterate_in_ascending_id_order() {
        let db = temp_db("pending_order");
        db.put_pending_request(3, &Dummy { n: 3 }).unwrap();
        db.put_pending_request(1, &Dummy { n: 1 }).unwrap();
        db.put_pending_request(2, &Dummy { n: 2 }).unwrap();

        let ids: Vec<u64> = db
            .iter_pending_requests::<Dummy>()
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn one_time_prekeys_pop_fifo() {
        let db = temp_db("otk_fifo");
        let owner = [1u8; 20];
        db.push_one_time_prekey(&owner, &Dummy { n: 1 }).unwrap();
        db.push_one_time_prekey(&owner, &Dummy { n: 2 }).unwrap();
        assert_eq!(db.pop_one_time_prekey::<Dummy>(&owner).unwrap(), Some(Dummy { n: 1 }));
        assert_eq!(db.pop_one_time_prekey::<Dummy>(&owner).unwrap(), Some(Dummy { n: 2 }));
        assert_eq!(db.pop_one_time_prekey::<Dummy>(&owner).unwrap(), None);
    }

    #[test]
    fn sponsorship_round_trip() {
        let db = temp_db("sponsorship_rt");
        let id = [7u8; 32];
        db.put_sponsorship(&id, &Dummy { n: 42 }).unwrap();
        assert_eq!(db.get_sponsorship::<Dummy>(&id).unwrap(), Some(Dummy { n: 42 }));
    }
}
