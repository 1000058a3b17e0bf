//! ─── Triad Protocol Constants ───────────────────────────────────────────────
//!
//! Fee Sponsorship, RideHail, and the end-to-end crypto envelope all read
//! their tunables from this module; genesis may override a subset via
//! `triad-genesis::GenesisParams`.

// ── Double Ratchet ────────────────────────────────────────────────────────────

/// Cap on the skipped-message-key cache. Exceeding this drops the session.
pub const MAX_SKIP: usize = 1000;

/// Wire-format header length: version(1) + dh_pub(32) + pn(4) + n(4) + ad_hash(32).
pub const ENVELOPE_HEADER_LEN: usize = 73;

/// Current envelope wire-format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Default header size bound accepted by the on-chain validator.
pub const DEFAULT_MAX_HEADER_BYTES: u32 = 256;

/// Default ciphertext size bound accepted by the on-chain validator.
pub const DEFAULT_MAX_CIPHERTEXT_BYTES: u32 = 512;

// ── RideHail ──────────────────────────────────────────────────────────────────

/// Minimum wei a rider must lock when creating a request.
pub const MIN_RIDER_DEPOSIT_WEI: u128 = 100_000_000_000_000_000; // 0.1 ETH

/// Minimum wei a driver must bond when accepting a commit.
pub const MIN_DRIVER_BOND_WEI: u128 = 20_000_000_000_000_000; // 0.02 ETH

/// Escrow bond required per posted encrypted message.
pub const MESSAGE_BOND_WEI: u128 = 0;

/// Seconds from request creation during which drivers may commit.
pub const COMMIT_DURATION_SECS: u64 = 30;

/// Seconds after `commit_end` during which committed drivers may reveal.
pub const REVEAL_DURATION_SECS: u64 = 30;

/// Rider request-rate-limit window (seconds).
pub const RIDER_RATE_LIMIT_WINDOW_SECS: u64 = 3_600;

/// Max ride requests a single rider may create per window.
pub const RIDER_RATE_LIMIT_MAX: u32 = 10;

/// Per-session per-sender message rate-limit window (seconds).
pub const MESSAGE_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Max encrypted messages a single session participant may post per window.
pub const MESSAGE_RATE_LIMIT_MAX: u32 = 30;

/// Basis-points fee applied to the rider's deposit on `cancel_session`.
pub const DEFAULT_CANCEL_FEE_BPS: u32 = 500; // 5%

// ── Envelope size bounds consumed by postEncryptedMessage ───────────────────

pub const MAX_MESSAGE_HEADER_BYTES: usize = 256;
pub const MAX_MESSAGE_CIPHERTEXT_BYTES: usize = 512;

// ── Day-epoch bucketing ──────────────────────────────────────────────────────

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Calendar-day index for a Unix timestamp, used as the `DailyUsage` key
/// component (the lexicographic-ordering requirement for big-endian keys
/// forbids re-stringifying the raw timestamp).
pub fn day_epoch(timestamp: i64) -> i64 {
    timestamp.div_euclid(SECONDS_PER_DAY)
}
