pub mod engine;
pub mod transient;
pub mod types;

pub use engine::{
    cancel_sponsorship, create_sponsorship, get_active_sponsorship_for, get_sponsorship,
    get_sponsorships_for, has_active_sponsorship_for, use_sponsorship,
};
pub use transient::TransientSponsorSlot;
pub use types::{BeneficiaryIndex, Conditions, DailyUsage, Sponsorship, SponsorshipEvent};
