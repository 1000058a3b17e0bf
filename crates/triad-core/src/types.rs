use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Block height, as seen by the host EVM chain.
pub type Height = u64;

/// A 32-byte sponsorship identifier: keccak256(sponsor ‖ beneficiary ‖ creation_height).
pub type SponsorshipId = B256;

/// Participant role inside a `Session`, used to key per-sender message
/// indices and rate-limit buckets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Role {
    Rider,
    Driver,
}

/// Returns the role `addr` plays in a session, if any.
pub fn role_of(addr: Address, rider: Address, driver: Address) -> Option<Role> {
    if addr == rider {
        Some(Role::Rider)
    } else if addr == driver {
        Some(Role::Driver)
    } else {
        None
    }
}
