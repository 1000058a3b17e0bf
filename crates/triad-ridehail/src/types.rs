use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use triad_core::Timestamp;

/// A ride request sitting in the matching pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingRequest {
    pub request_id: u64,
    pub rider: Address,
    pub cell_topic: [u8; 32],
    pub region_topic: [u8; 32],
    pub params_hash: [u8; 32],
    pub pickup_commit: [u8; 32],
    pub dropoff_commit: [u8; 32],
    pub max_driver_eta: u64,
    pub created_at: Timestamp,
    pub commit_end: Timestamp,
    pub reveal_end: Timestamp,
    pub expires_at: Timestamp,
    pub rider_deposit: u128,
    pub matched: bool,
}

/// A driver's bid under a request, submitted commit-first then revealed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverCommit {
    pub request_id: u64,
    pub driver: Address,
    pub commit_hash: [u8; 32],
    pub eta: u64,
    pub bond: u128,
    pub submitted_at: Timestamp,
    pub revealed: bool,
    pub driver_cell: Option<[u8; 32]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Matched,
    RiderCheckedIn,
    DriverCheckedIn,
    BothCheckedIn,
    RideStarted,
    RideEnded,
    Canceled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub session_id: u64,
    pub rider: Address,
    pub driver: Address,
    pub request_id: u64,
    pub rider_deposit: u128,
    pub driver_bond: u128,
    pub state: SessionState,
    pub last_coarse_cell: Option<[u8; 32]>,
    pub rider_checked_in: bool,
    pub driver_checked_in: bool,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub session_id: u64,
    pub sender: Address,
    pub msg_index: u64,
    pub header: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub bond: u128,
}

#[derive(Clone, Debug)]
pub enum RideHailEvent {
    RequestCreated {
        request_id: u64,
        rider: Address,
    },
    CommitAccepted {
        request_id: u64,
        driver: Address,
    },
    RevealAccepted {
        request_id: u64,
        driver: Address,
    },
    Matched {
        session_id: u64,
        request_id: u64,
        rider: Address,
        driver: Address,
        eta: u64,
    },
    RequestExpired {
        request_id: u64,
    },
    BondForfeited {
        request_id: u64,
        driver: Address,
        amount: u128,
    },
    RefundIssued {
        recipient: Address,
        amount: u128,
    },
    SessionStateChanged {
        session_id: u64,
        state: SessionState,
        timestamp: i64,
    },
    SessionEnded {
        session_id: u64,
        driver_payout: u128,
    },
    SessionCanceled {
        session_id: u64,
        rider_refund: u128,
        fee_or_slash: u128,
    },
    MessagePosted {
        session_id: u64,
        sender: Address,
        msg_index: u64,
        header: Vec<u8>,
        ciphertext: Vec<u8>,
    },
    CoarseLocationUpdated {
        session_id: u64,
        sender: Address,
        cell: [u8; 32],
    },
}
