//! RideHail Matching Engine. Two independent matching paths —
//! the Solidity-layered commit/reveal flow (`accept_reveal`) and the
//! off-chain, block-driven flow (`run_matching_block`) — share the request
//! pool and are mutually exclusive per request via the `matched` flag.

use alloy_primitives::Address;
use triad_core::{
    role_of, TriadError, COMMIT_DURATION_SECS, MAX_MESSAGE_CIPHERTEXT_BYTES,
    MAX_MESSAGE_HEADER_BYTES, MESSAGE_BOND_WEI, MESSAGE_RATE_LIMIT_MAX,
    MESSAGE_RATE_LIMIT_WINDOW_SECS, MIN_DRIVER_BOND_WEI, MIN_RIDER_DEPOSIT_WEI,
    REVEAL_DURATION_SECS, RIDER_RATE_LIMIT_MAX, RIDER_RATE_LIMIT_WINDOW_SECS,
};
use triad_crypto::keccak256_concat;
use triad_envelope::validate_envelope;
use triad_state::StateDb;

use crate::hooks::SlashingHook;
use crate::ratelimit::check_and_increment;
use crate::types::{DriverCommit, Message, PendingRequest, RideHailEvent, Session, SessionState};

fn addr20(addr: Address) -> [u8; 20] {
    addr.into_array()
}

fn commit_hash(request_id: u64, driver: Address, eta: u64, driver_cell: [u8; 32], salt: [u8; 32]) -> [u8; 32] {
    keccak256_concat(&[
        &request_id.to_be_bytes(),
        driver.as_slice(),
        &eta.to_be_bytes(),
        &driver_cell,
        &salt,
    ])
}

#[allow(clippy::too_many_arguments)]
pub fn create_request(
    db: &StateDb,
    rider: Address,
    cell_topic: [u8; 32],
    region_topic: [u8; 32],
    params_hash: [u8; 32],
    pickup_commit: [u8; 32],
    dropoff_commit: [u8; 32],
    max_driver_eta: u64,
    ttl: u64,
    rider_deposit: u128,
    now: i64,
) -> Result<(u64, RideHailEvent), TriadError> {
    if rider_deposit < MIN_RIDER_DEPOSIT_WEI {
        return Err(TriadError::DepositTooLow {
            need: MIN_RIDER_DEPOSIT_WEI,
            got: rider_deposit,
        });
    }
    check_and_increment(
        db,
        &addr20(rider),
        now,
        RIDER_RATE_LIMIT_WINDOW_SECS,
        RIDER_RATE_LIMIT_MAX,
    )?;

    let request_id = db.next_counter("request_seq")?;
    let commit_end = now + COMMIT_DURATION_SECS as i64;
    let reveal_end = commit_end + REVEAL_DURATION_SECS as i64;
    let expires_at = now + ttl as i64;

    let request = PendingRequest {
        request_id,
        rider,
        cell_topic,
        region_topic,
        params_hash,
        pickup_commit,
        dropoff_commit,
        max_driver_eta,
        created_at: now,
        commit_end,
        reveal_end,
        expires_at,
        rider_deposit,
        matched: false,
    };
    db.put_request(request_id, &request)?;
    db.put_pending_request(request_id, &request)?;

    tracing::info!(request_id, %rider, "ride request created");
    Ok((request_id, RideHailEvent::RequestCreated { request_id, rider }))
}

pub fn accept_commit(
    db: &StateDb,
    driver: Address,
    request_id: u64,
    commit_hash: [u8; 32],
    eta: u64,
    bond: u128,
    now: i64,
) -> Result<RideHailEvent, TriadError> {
    let request: PendingRequest = db
        .get_request(request_id)?
        .ok_or(TriadError::UnknownRequest(request_id))?;

    if request.matched || now >= request.expires_at {
        return Err(TriadError::RequestNotPending);
    }
    if now >= request.commit_end {
        return Err(TriadError::CommitWindowClosed);
    }
    if bond < MIN_DRIVER_BOND_WEI {
        return Err(TriadError::BondTooLow {
            need: MIN_DRIVER_BOND_WEI,
            got: bond,
        });
    }
    if db
        .get_driver_commit::<DriverCommit>(request_id, &addr20(driver))?
        .is_some()
    {
        return Err(TriadError::DuplicateCommit(driver.to_string(), request_id));
    }

    let commit = DriverCommit {
        request_id,
        driver,
        commit_hash,
        eta,
        bond,
        submitted_at: now,
        revealed: false,
        driver_cell: None,
    };
    db.put_driver_commit(request_id, &addr20(driver), &commit)?;

    Ok(RideHailEvent::CommitAccepted { request_id, driver })
}

#[allow(clippy::too_many_arguments)]
pub fn accept_reveal(
    db: &StateDb,
    driver: Address,
    request_id: u64,
    eta: u64,
    driver_cell: [u8; 32],
    salt: [u8; 32],
    now: i64,
) -> Result<Vec<RideHailEvent>, TriadError> {
    let mut request: PendingRequest = db
        .get_request(request_id)?
        .ok_or(TriadError::UnknownRequest(request_id))?;
    let mut commit: DriverCommit = db
        .get_driver_commit(request_id, &addr20(driver))?
        .ok_or_else(|| TriadError::UnknownCommit(driver.to_string(), request_id))?;

    if now <= request.commit_end || now > request.reveal_end {
        return Err(TriadError::RevealWindowNotOpen);
    }
    if commit.revealed {
        return Err(TriadError::DuplicateReveal);
    }

    let expected = self::commit_hash(request_id, driver, eta, driver_cell, salt);
    if expected != commit.commit_hash {
        return Err(TriadError::CommitHashMismatch);
    }
    if eta > request.max_driver_eta {
        return Err(TriadError::EtaTooHigh);
    }
    if driver_cell != request.cell_topic && driver_cell != request.region_topic {
        return Err(TriadError::Other(
            "driver_cell does not match request cell or region topic".into(),
        ));
    }

    commit.revealed = true;
    commit.driver_cell = Some(driver_cell);
    db.put_driver_commit(request_id, &addr20(driver), &commit)?;

    let mut events = vec![RideHailEvent::RevealAccepted { request_id, driver }];

    if !request.matched {
        let (_session_id, matched_event) = finalize_match(db, &mut request, driver, commit.bond, eta, now)?;
        events.push(matched_event);
    } else {
        // Commit-phase loser: this driver revealed after another commit won.
        events.push(RideHailEvent::RefundIssued {
            recipient: driver,
            amount: commit.bond,
        });
    }
    Ok(events)
}

/// Create the winning `Session` for a request and mark it matched. Shared by
/// `accept_reveal`'s winning path and `run_matching_block` so the
/// no-double-match invariant lives in one place.
fn finalize_match(
    db: &StateDb,
    request: &mut PendingRequest,
    driver: Address,
    driver_bond: u128,
    eta: u64,
    now: i64,
) -> Result<(u64, RideHailEvent), TriadError> {
    let session_id = db.next_counter("session_seq")?;
    let session = Session {
        session_id,
        rider: request.rider,
        driver,
        request_id: request.request_id,
        rider_deposit: request.rider_deposit,
        driver_bond,
        state: SessionState::Matched,
        last_coarse_cell: None,
        rider_checked_in: false,
        driver_checked_in: false,
        updated_at: now,
    };
    db.put_session(session_id, &session)?;

    request.matched = true;
    db.put_request(request.request_id, request)?;
    db.remove_pending_request(request.request_id)?;

    let event = RideHailEvent::Matched {
        session_id,
        request_id: request.request_id,
        rider: request.rider,
        driver,
        eta,
    };
    Ok((session_id, event))
}

/// Block-driven matching pass over the entire pending pool, in ascending
/// request-id order for deterministic outcomes across validating nodes.
pub fn run_matching_block(db: &StateDb, now: i64) -> Result<Vec<RideHailEvent>, TriadError> {
    let mut events = Vec::new();

    for (request_id, mut request) in db.iter_pending_requests::<PendingRequest>()? {
        if request.matched {
            continue;
        }
        if now > request.expires_at {
            db.remove_pending_request(request_id)?;
            db.remove_commits_for_request(request_id)?;
            events.push(RideHailEvent::RequestExpired { request_id });
            continue;
        }

        let commits: Vec<DriverCommit> = db.iter_commits_for_request(request_id)?;
        let best = commits
            .into_iter()
            .filter(|c| c.revealed && c.eta <= request.max_driver_eta)
            .min_by_key(|c| c.eta);

        if let Some(winner) = best {
            let (_session_id, event) = finalize_match(db, &mut request, winner.driver, winner.bond, winner.eta, now)?;
            events.push(event);
        }
    }

    Ok(events)
}

pub fn claim_unrevealed_bond(
    db: &StateDb,
    request_id: u64,
    driver: Address,
    now: i64,
    hook: &dyn SlashingHook,
) -> Result<RideHailEvent, TriadError> {
    let request: PendingRequest = db
        .get_request(request_id)?
        .ok_or(TriadError::UnknownRequest(request_id))?;
    let commit: DriverCommit = db
        .get_driver_commit(request_id, &addr20(driver))?
        .ok_or_else(|| TriadError::UnknownCommit(driver.to_string(), request_id))?;

    if now <= request.reveal_end {
        return Err(TriadError::RevealWindowNotElapsed);
    }
    if commit.revealed {
        return Err(TriadError::Other("commit was revealed, nothing to claim".into()));
    }

    db.remove_driver_commit(request_id, &addr20(driver))?;
    hook.on_bond_forfeited(driver, request_id, commit.bond);

    Ok(RideHailEvent::BondForfeited {
        request_id,
        driver,
        amount: commit.bond,
    })
}

fn next_state(state: SessionState, input: &str) -> Result<SessionState, TriadError> {
    use SessionState::*;
    let next = match (state, input) {
        (Matched, "riderCheckIn") => RiderCheckedIn,
        (Matched, "driverCheckIn") => DriverCheckedIn,
        (Matched, "cancelSession") => Canceled,
        (RiderCheckedIn, "riderCheckIn") => RiderCheckedIn,
        (RiderCheckedIn, "driverCheckIn") => BothCheckedIn,
        (RiderCheckedIn, "cancelSession") => Canceled,
        (DriverCheckedIn, "driverCheckIn") => DriverCheckedIn,
        (DriverCheckedIn, "riderCheckIn") => BothCheckedIn,
        (DriverCheckedIn, "cancelSession") => Canceled,
        (BothCheckedIn, "startRide") => RideStarted,
        (BothCheckedIn, "cancelSession") => Canceled,
        (RideStarted, "endRide") => RideEnded,
        _ => return Err(TriadError::InvalidSessionTransition),
    };
    Ok(next)
}

fn load_session(db: &StateDb, session_id: u64) -> Result<Session, TriadError> {
    db.get_session(session_id)?.ok_or(TriadError::UnknownSession(session_id))
}

pub fn rider_check_in(db: &StateDb, session_id: u64, caller: Address, now: i64) -> Result<RideHailEvent, TriadError> {
    let mut session = load_session(db, session_id)?;
    if caller != session.rider {
        return Err(TriadError::NotRider);
    }
    session.state = next_state(session.state, "riderCheckIn")?;
    session.rider_checked_in = true;
    session.updated_at = now;
    db.put_session(session_id, &session)?;
    Ok(RideHailEvent::SessionStateChanged { session_id, state: session.state, timestamp: now })
}

pub fn driver_check_in(db: &StateDb, session_id: u64, caller: Address, now: i64) -> Result<RideHailEvent, TriadError> {
    let mut session = load_session(db, session_id)?;
    if caller != session.driver {
        return Err(TriadError::NotParticipant);
    }
    session.state = next_state(session.state, "driverCheckIn")?;
    session.driver_checked_in = true;
    session.updated_at = now;
    db.put_session(session_id, &session)?;
    Ok(RideHailEvent::SessionStateChanged { session_id, state: session.state, timestamp: now })
}

pub fn start_ride(db: &StateDb, session_id: u64, caller: Address, now: i64) -> Result<RideHailEvent, TriadError> {
    let mut session = load_session(db, session_id)?;
    if role_of(caller, session.rider, session.driver).is_none() {
        return Err(TriadError::NotParticipant);
    }
    session.state = next_state(session.state, "startRide")?;
    session.updated_at = now;
    db.put_session(session_id, &session)?;
    Ok(RideHailEvent::SessionStateChanged { session_id, state: session.state, timestamp: now })
}

pub fn update_coarse_location(
    db: &StateDb,
    session_id: u64,
    caller: Address,
    cell: [u8; 32],
    now: i64,
) -> Result<RideHailEvent, TriadError> {
    let mut session = load_session(db, session_id)?;
    if role_of(caller, session.rider, session.driver).is_none() {
        return Err(TriadError::NotParticipant);
    }
    if matches!(session.state, SessionState::RideEnded | SessionState::Canceled) {
        return Err(TriadError::InvalidSessionTransition);
    }
    session.last_coarse_cell = Some(cell);
    session.updated_at = now;
    db.put_session(session_id, &session)?;
    Ok(RideHailEvent::CoarseLocationUpdated { session_id, sender: caller, cell })
}

pub fn end_ride(db: &StateDb, session_id: u64, caller: Address, now: i64) -> Result<RideHailEvent, TriadError> {
    let mut session = load_session(db, session_id)?;
    if role_of(caller, session.rider, session.driver).is_none() {
        return Err(TriadError::NotParticipant);
    }
    session.state = next_state(session.state, "endRide")?;
    session.updated_at = now;
    let payout = session.rider_deposit + session.driver_bond;
    db.put_session(session_id, &session)?;
    Ok(RideHailEvent::SessionEnded { session_id, driver_payout: payout })
}

pub fn cancel_session(
    db: &StateDb,
    session_id: u64,
    caller: Address,
    now: i64,
    cancel_fee_bps: u32,
    hook: &dyn SlashingHook,
) -> Result<RideHailEvent, TriadError> {
    let mut session = load_session(db, session_id)?;
    let role = role_of(caller, session.rider, session.driver).ok_or(TriadError::NotParticipant)?;
    session.state = next_state(session.state, "cancelSession")?;
    session.updated_at = now;

    let (rider_refund, fee_or_slash) = match role {
        triad_core::Role::Rider => {
            let fee = session.rider_deposit * cancel_fee_bps as u128 / 10_000;
            (session.rider_deposit - fee, fee)
        }
        triad_core::Role::Driver => {
            hook.on_bond_forfeited(session.driver, session.request_id, session.driver_bond);
            (session.rider_deposit, session.driver_bond)
        }
    };

    db.put_session(session_id, &session)?;
    Ok(RideHailEvent::SessionCanceled { session_id, rider_refund, fee_or_slash })
}

#[allow(clippy::too_many_arguments)]
pub fn post_encrypted_message(
    db: &StateDb,
    session_id: u64,
    sender: Address,
    msg_index: u64,
    header: Vec<u8>,
    ciphertext: Vec<u8>,
    bond: u128,
    now: i64,
) -> Result<RideHailEvent, TriadError> {
    let session = load_session(db, session_id)?;
    if role_of(sender, session.rider, session.driver).is_none() {
        return Err(TriadError::NotParticipant);
    }
    if matches!(session.state, SessionState::RideEnded | SessionState::Canceled) {
        return Err(TriadError::InvalidSessionTransition);
    }

    let sender_key = addr20(sender);
    let last = db.get_last_message_index(session_id, &sender_key)?.unwrap_or(0);
    if msg_index <= last {
        return Err(TriadError::NonMonotonicMsgIndex { last, got: msg_index });
    }
    if bond != MESSAGE_BOND_WEI {
        return Err(TriadError::BondTooLow { need: MESSAGE_BOND_WEI, got: bond });
    }

    let outcome = validate_envelope(
        &header,
        &ciphertext,
        MAX_MESSAGE_HEADER_BYTES as u32,
        MAX_MESSAGE_CIPHERTEXT_BYTES as u32,
    );
    if !outcome.valid {
        return Err(TriadError::Other("encrypted message envelope failed validation".into()));
    }

    check_and_increment(
        db,
        &[&session_id.to_be_bytes()[..], &sender_key[..]].concat(),
        now,
        MESSAGE_RATE_LIMIT_WINDOW_SECS,
        MESSAGE_RATE_LIMIT_MAX,
    )?;

    let message = Message { session_id, sender, msg_index, header: header.clone(), ciphertext: ciphertext.clone(), bond };
    db.put_message(session_id, &sender_key, msg_index, &message)?;
    db.put_last_message_index(session_id, &sender_key, msg_index)?;

    Ok(RideHailEvent::MessagePosted { session_id, sender, msg_index, header, ciphertext })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoopSlashingHook;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("triad_ridehail_engine_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn make_request(db: &StateDb, rider: Address, now: i64) -> u64 {
        create_request(
            db,
            rider,
            [1u8; 32],
            [2u8; 32],
            [3u8; 32],
            [4u8; 32],
            [5u8; 32],
            300,
            120,
            MIN_RIDER_DEPOSIT_WEI,
            now,
        )
        .unwrap()
        .0
    }

    #[test]
    fn commit_reveal_matches_and_loser_is_refunded() {
        let db = temp_db("commit_reveal");
        let rider = Address::repeat_byte(1);
        let driver_a = Address::repeat_byte(2);
        let driver_b = Address::repeat_byte(3);
        let now = 1_000;
        let request_id = make_request(&db, rider, now);

        let salt_a = [9u8; 32];
        let cell = [1u8; 32];
        let hash_a = commit_hash(request_id, driver_a, 100, cell, salt_a);
        accept_commit(&db, driver_a, request_id, hash_a, 100, MIN_DRIVER_BOND_WEI, now).unwrap();

        let salt_b = [8u8; 32];
        let hash_b = commit_hash(request_id, driver_b, 150, cell, salt_b);
        accept_commit(&db, driver_b, request_id, hash_b, 150, MIN_DRIVER_BOND_WEI, now).unwrap();

        let reveal_now = now + COMMIT_DURATION_SECS as i64 + 1;
        let first = accept_reveal(&db, driver_a, request_id, 100, cell, salt_a, reveal_now).unwrap();
        assert!(matches!(first[0], RideHailEvent::RevealAccepted { driver, .. } if driver == driver_a));
        assert!(matches!(first[1], RideHailEvent::Matched { driver, .. } if driver == driver_a));

        let second = accept_reveal(&db, driver_b, request_id, 150, cell, salt_b, reveal_now).unwrap();
        assert!(matches!(second[0], RideHailEvent::RevealAccepted { driver, .. } if driver == driver_b));
        assert!(matches!(second[1], RideHailEvent::RefundIssued { recipient, .. } if recipient == driver_b));
    }

    #[test]
    fn commit_hash_mismatch_is_rejected() {
        let db = temp_db("hash_mismatch");
        let rider = Address::repeat_byte(1);
        let driver = Address::repeat_byte(2);
        let now = 1_000;
        let request_id = make_request(&db, rider, now);
        let hash = commit_hash(request_id, driver, 100, [1u8; 32], [9u8; 32]);
        accept_commit(&db, driver, request_id, hash, 100, MIN_DRIVER_BOND_WEI, now).unwrap();

        let reveal_now = now + COMMIT_DURATION_SECS as i64 + 1;
        let err = accept_reveal(&db, driver, request_id, 100, [1u8; 32], [0u8; 32], reveal_now).unwrap_err();
        assert!(matches!(err, TriadError::CommitHashMismatch));
    }

    #[test]
    fn block_matching_picks_lowest_eta_and_expires_stale_requests() {
        let db = temp_db("block_matching");
        let rider = Address::repeat_byte(1);
        let driver_a = Address::repeat_byte(2);
        let driver_b = Address::repeat_byte(3);
        let now = 1_000;
        let request_id = make_request(&db, rider, now);

        let cell = [1u8; 32];
        let hash_a = commit_hash(request_id, driver_a, 200, cell, [1u8; 32]);
        let hash_b = commit_hash(request_id, driver_b, 50, cell, [2u8; 32]);
        accept_commit(&db, driver_a, request_id, hash_a, 200, MIN_DRIVER_BOND_WEI, now).unwrap();
        accept_commit(&db, driver_b, request_id, hash_b, 50, MIN_DRIVER_BOND_WEI, now).unwrap();

        let reveal_now = now + COMMIT_DURATION_SECS as i64 + 1;
        accept_reveal(&db, driver_a, request_id, 200, cell, [1u8; 32], reveal_now).ok();
        // accept_reveal on driver_a would already match; instead simulate the
        // block-driven path directly by marking both revealed without going
        // through the reveal-path winner selection.
        let _ = accept_reveal(&db, driver_b, request_id, 50, cell, [2u8; 32], reveal_now);

        // The reveal-path above already resolved this request, so a second
        // request exercises the pure block-matching path in isolation.
        let request_id_2 = make_request(&db, rider, now + 1);
        let hash_a2 = commit_hash(request_id_2, driver_a, 200, cell, [3u8; 32]);
        let hash_b2 = commit_hash(request_id_2, driver_b, 50, cell, [4u8; 32]);
        accept_commit(&db, driver_a, request_id_2, hash_a2, 200, MIN_DRIVER_BOND_WEI, now + 1).unwrap();
        accept_commit(&db, driver_b, request_id_2, hash_b2, 50, MIN_DRIVER_BOND_WEI, now + 1).unwrap();
        // Mark both revealed via direct commit mutation to simulate an
        // off-chain reveal channel feeding the block-driven matcher.
        let mut commit_a: DriverCommit = db.get_driver_commit(request_id_2, &addr20(driver_a)).unwrap().unwrap();
        commit_a.revealed = true;
        db.put_driver_commit(request_id_2, &addr20(driver_a), &commit_a).unwrap();
        let mut commit_b: DriverCommit = db.get_driver_commit(request_id_2, &addr20(driver_b)).unwrap().unwrap();
        commit_b.revealed = true;
        db.put_driver_commit(request_id_2, &addr20(driver_b), &commit_b).unwrap();

        let events = run_matching_block(&db, now + 1 + COMMIT_DURATION_SECS as i64 + 1).unwrap();
        assert!(events.iter().any(|e| matches!(e, RideHailEvent::Matched { driver, .. } if *driver == driver_b)));

        let expired_request = make_request(&db, rider, now + 2);
        let far_future = now + 2 + 10_000;
        let expiry_events = run_matching_block(&db, far_future).unwrap();
        assert!(expiry_events.iter().any(|e| matches!(e, RideHailEvent::RequestExpired { request_id } if *request_id == expired_request)));
    }

    #[test]
    fn session_lifecycle_rejects_out_of_order_transitions() {
        let db = temp_db("lifecycle");
        let rider = Address::repeat_byte(1);
        let driver = Address::repeat_byte(2);
        let session = Session {
            session_id: 1,
            rider,
            driver,
            request_id: 1,
            rider_deposit: MIN_RIDER_DEPOSIT_WEI,
            driver_bond: MIN_DRIVER_BOND_WEI,
            state: SessionState::Matched,
            last_coarse_cell: None,
            rider_checked_in: false,
            driver_checked_in: false,
            updated_at: 0,
        };
        db.put_session(1, &session).unwrap();

        let err = start_ride(&db, 1, rider, 10).unwrap_err();
        assert!(matches!(err, TriadError::InvalidSessionTransition));

        rider_check_in(&db, 1, rider, 10).unwrap();
        driver_check_in(&db, 1, driver, 11).unwrap();
        let started = start_ride(&db, 1, rider, 12).unwrap();
        assert!(matches!(started, RideHailEvent::SessionStateChanged { state: SessionState::RideStarted, .. }));

        let ended = end_ride(&db, 1, driver, 13).unwrap();
        assert!(matches!(ended, RideHailEvent::SessionEnded { .. }));

        let err2 = end_ride(&db, 1, driver, 14).unwrap_err();
        assert!(matches!(err2, TriadError::InvalidSessionTransition));
    }

    #[test]
    fn message_index_must_strictly_increase() {
        let db = temp_db("message_order");
        let rider = Address::repeat_byte(1);
        let driver = Address::repeat_byte(2);
        let session = Session {
            session_id: 5,
            rider,
            driver,
            request_id: 1,
            rider_deposit: MIN_RIDER_DEPOSIT_WEI,
            driver_bond: MIN_DRIVER_BOND_WEI,
            state: SessionState::RideStarted,
            last_coarse_cell: None,
            rider_checked_in: true,
            driver_checked_in: true,
            updated_at: 0,
        };
        db.put_session(5, &session).unwrap();

        let header = {
            let mut h = vec![1u8];
            h.extend_from_slice(&[0u8; 32]);
            h.extend_from_slice(&0u32.to_be_bytes());
            h.extend_from_slice(&1u32.to_be_bytes());
            h.extend_from_slice(&[0u8; 32]);
            h
        };
        post_encrypted_message(&db, 5, rider, 1, header.clone(), vec![1, 2, 3], MESSAGE_BOND_WEI, 100).unwrap();
        let err = post_encrypted_message(&db, 5, rider, 1, header, vec![1, 2, 3], MESSAGE_BOND_WEI, 101).unwrap_err();
        assert!(matches!(err, TriadError::NonMonotonicMsgIndex { .. }));
    }

    #[test]
    fn claim_unrevealed_bond_requires_elapsed_window() {
        let db = temp_db("claim_bond");
        let rider = Address::repeat_byte(1);
        let driver = Address::repeat_byte(2);
        let now = 1_000;
        let request_id = make_request(&db, rider, now);
        let hash = commit_hash(request_id, driver, 100, [1u8; 32], [9u8; 32]);
        accept_commit(&db, driver, request_id, hash, 100, MIN_DRIVER_BOND_WEI, now).unwrap();

        let too_soon = now + COMMIT_DURATION_SECS as i64 + 1;
        let err = claim_unrevealed_bond(&db, request_id, driver, too_soon, &NoopSlashingHook).unwrap_err();
        assert!(matches!(err, TriadError::RevealWindowNotElapsed));

        let elapsed = now + COMMIT_DURATION_SECS as i64 + REVEAL_DURATION_SECS as i64 + 1;
        let event = claim_unrevealed_bond(&db, request_id, driver, elapsed, &NoopSlashingHook).unwrap();
        assert!(matches!(event, RideHailEvent::BondForfeited { .. }));
    }
}
