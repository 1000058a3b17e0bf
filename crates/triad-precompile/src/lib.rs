//! triad-precompile
//!
//! ABI-encoded precompile dispatch for the four contracts —
//! RideHail, KeyRegistry, FeeSponsor, EnvelopeValidator — plus a read-only
//! JSON-RPC introspection surface for off-chain tooling.
//!
//! Namespace: "triad"
//! Methods:
//!   triad_getSponsorship       — sponsorship by hex id
//!   triad_getSponsorshipsFor   — sponsorships for a beneficiary
//!   triad_getRequest           — ride request by id
//!   triad_getSession           — ride session by id
//!   triad_getVersion           — node/protocol version

pub mod abi;
pub mod dispatch;
pub mod events;
pub mod rpc;

pub use rpc::{RpcServer, RpcServerState};
