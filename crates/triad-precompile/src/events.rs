//! Turns the engines' plain Rust event enums into ABI log topics/data,
//! keeping `triad-feesponsor`/`triad-ridehail`/`triad-keyregistry` free of
//! any ABI-encoding concern.

use alloy_primitives::{LogData, B256};
use alloy_sol_types::SolEvent;

use triad_feesponsor::SponsorshipEvent;
use triad_keyregistry::KeyRegistryEvent;
use triad_ridehail::RideHailEvent;

use crate::abi::RideHail;

/// Encode a `SponsorshipEvent` as an ABI log. `Cancelled` is the only
/// variant without a natural beneficiary/sponsor topic pair, matching the
/// spec's three-event shape for the sponsorship lifecycle.
pub fn sponsorship_log(event: &SponsorshipEvent) -> LogData {
    match event {
        SponsorshipEvent::Created { id, sponsor, beneficiary, budget } => RideHail::SponsorshipCreated {
            id: B256::from(*id),
            sponsor: *sponsor,
            beneficiary: *beneficiary,
            budget: *budget,
        }
        .encode_log_data(),
        SponsorshipEvent::Used { id, beneficiary, gas_used } => RideHail::SponsorshipUsed {
            id: B256::from(*id),
            beneficiary: *beneficiary,
            gasUsed: *gas_used,
        }
        .encode_log_data(),
        SponsorshipEvent::Cancelled { id, refund } => {
            RideHail::SponsorshipCancelled { id: B256::from(*id), refund: *refund }.encode_log_data()
        }
    }
}

/// Encode a `RideHailEvent` as an ABI log, for variants with a corresponding
/// on-chain event. Variants with no on-chain event counterpart (e.g.
/// `RefundIssued`) are surfaced only via `tracing`, not a log.
pub fn ridehail_log(event: &RideHailEvent) -> Option<LogData> {
    use RideHailEvent::*;
    let log = match event {
        RequestCreated { request_id, rider } => {
            RideHail::RideRequested { requestId: (*request_id).try_into().unwrap(), rider: *rider }.encode_log_data()
        }
        CommitAccepted { request_id, driver } => RideHail::DriverAcceptCommitted {
            requestId: (*request_id).try_into().unwrap(),
            driver: *driver,
        }
        .encode_log_data(),
        RevealAccepted { request_id, driver } => RideHail::DriverAcceptRevealed {
            requestId: (*request_id).try_into().unwrap(),
            driver: *driver,
        }
        .encode_log_data(),
        Matched { session_id, request_id, rider, driver, eta } => RideHail::Matched {
            sessionId: (*session_id).try_into().unwrap(),
            requestId: (*request_id).try_into().unwrap(),
            rider: *rider,
            driver: *driver,
            eta: *eta,
        }
        .encode_log_data(),
        MessagePosted { session_id, sender, msg_index, header, ciphertext } => RideHail::EncryptedMessage {
            sessionId: (*session_id).try_into().unwrap(),
            sender: *sender,
            msgIndex: *msg_index,
            header: header.clone().into(),
            ciphertext: ciphertext.clone().into(),
        }
        .encode_log_data(),
        SessionStateChanged { session_id, state, timestamp } => RideHail::StateChanged {
            sessionId: (*session_id).try_into().unwrap(),
            newState: *state as u8,
            timestamp: *timestamp as u64,
        }
        .encode_log_data(),
        CoarseLocationUpdated { session_id, sender, cell } => RideHail::CoarseLocationUpdated {
            sessionId: (*session_id).try_into().unwrap(),
            sender: *sender,
            cell: B256::from(*cell),
        }
        .encode_log_data(),
        RequestExpired { .. } | BondForfeited { .. } | RefundIssued { .. } | SessionEnded { .. }
        | SessionCanceled { .. } => return None,
    };
    Some(log)
}

/// `KeyRegistryEvent` has no dedicated on-chain event; callers log it via
/// `tracing` only (already done inside `triad-keyregistry` itself).
pub fn keyregistry_log(_event: &KeyRegistryEvent) -> Option<LogData> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn reveal_accepted_maps_to_driver_accept_revealed() {
        let event = RideHailEvent::RevealAccepted { request_id: 7, driver: Address::repeat_byte(1) };
        let log = ridehail_log(&event).expect("RevealAccepted has an on-chain event");
        assert_eq!(log.topics()[0], RideHail::DriverAcceptRevealed::SIGNATURE_HASH);
    }

    #[test]
    fn coarse_location_updated_maps_to_coarse_location_event() {
        let event = RideHailEvent::CoarseLocationUpdated {
            session_id: 3,
            sender: Address::repeat_byte(2),
            cell: [9u8; 32],
        };
        let log = ridehail_log(&event).expect("CoarseLocationUpdated has an on-chain event");
        assert_eq!(log.topics()[0], RideHail::CoarseLocationUpdated::SIGNATURE_HASH);
    }

    #[test]
    fn matched_carries_eta_through_to_the_log() {
        let event = RideHailEvent::Matched {
            session_id: 1,
            request_id: 2,
            rider: Address::repeat_byte(3),
            driver: Address::repeat_byte(4),
            eta: 123,
        };
        let log = ridehail_log(&event).unwrap();
        let decoded = RideHail::Matched::decode_log_data(&log, true).unwrap();
        assert_eq!(decoded.eta, 123);
    }

    #[test]
    fn events_with_no_on_chain_counterpart_produce_no_log() {
        assert!(ridehail_log(&RideHailEvent::RefundIssued { recipient: Address::ZERO, amount: 1 }).is_none());
        assert!(ridehail_log(&RideHailEvent::SessionEnded { session_id: 1, driver_payout: 1 }).is_none());
    }

    #[test]
    fn sponsorship_created_round_trips_the_budget() {
        let event = SponsorshipEvent::Created {
            id: [1u8; 32],
            sponsor: Address::repeat_byte(1),
            beneficiary: Address::repeat_byte(2),
            budget: 5_000,
        };
        let log = sponsorship_log(&event);
        let decoded = RideHail::SponsorshipCreated::decode_log_data(&log, true).unwrap();
        assert_eq!(decoded.budget, 5_000);
    }
}
