pub mod engine;
pub mod hooks;
pub mod ratelimit;
pub mod types;

pub use engine::{
    accept_commit, accept_reveal, cancel_session, claim_unrevealed_bond, create_request,
    driver_check_in, end_ride, post_encrypted_message, rider_check_in, run_matching_block,
    start_ride, update_coarse_location,
};
pub use hooks::{NoopSlashingHook, SlashingHook};
pub use types::{DriverCommit, Message, PendingRequest, RideHailEvent, Session, SessionState};
